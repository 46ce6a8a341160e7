//! End-to-end: a session stream in, a transcript file out.

use termwatch_cli::config::{ClassifierSection, Config, RecorderSection};
use termwatch_cli::watch::{watch_stream, WatchOptions};
use termwatch_core::{parse_transcript, Dispatcher};
use termwatch_types::EntryKind;
use tempfile::TempDir;

fn fast_config() -> Config {
    Config {
        classifier: ClassifierSection {
            debounce_ms: 10,
            ..Default::default()
        },
        recorder: RecorderSection {
            flush_threshold_bytes: 16,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_watch_writes_transcript_and_tees_output() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("session.jsonl");
    let opts = WatchOptions {
        name: "test".into(),
        transcript: Some(transcript.clone()),
        input: None,
        tee: true,
    };

    let stream: &[u8] = b"\x1b[1mCompiling\x1b[0m termwatch v0.1.0\r\n\xe2\xa0\x8b";
    let mut teed: Vec<u8> = Vec::new();
    watch_stream(&fast_config(), opts, Dispatcher::new(16), stream, Some(&mut teed))
        .await
        .unwrap();

    assert_eq!(teed, stream);

    let data = std::fs::read(&transcript).unwrap();
    let entries = parse_transcript(&data);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Output);
    assert_eq!(entries[0].text, "Compiling termwatch v0.1.0\n⠋");
}

#[tokio::test]
async fn test_watch_records_input_file() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("session.jsonl");
    let input = dir.path().join("keys");
    std::fs::write(&input, b"cargo test\n").unwrap();

    let opts = WatchOptions {
        name: "test".into(),
        transcript: Some(transcript.clone()),
        input: Some(input),
        tee: false,
    };

    // Keep the output side open long enough for the input pump to run.
    let (mut writer, reader) = tokio::io::duplex(64);
    let feeder = tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        writer.write_all(b"$ ").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        writer.write_all(b"running 3 tests\n").await.unwrap();
    });

    watch_stream(
        &fast_config(),
        opts,
        Dispatcher::new(16),
        reader,
        None::<&mut Vec<u8>>,
    )
    .await
    .unwrap();
    feeder.await.unwrap();

    let entries = parse_transcript(&std::fs::read(&transcript).unwrap());
    let inputs: Vec<&str> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Input)
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(inputs, vec!["cargo test\n"]);
    assert!(entries.iter().any(|e| e.text == "running 3 tests"));
}
