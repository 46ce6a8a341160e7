//! Shared types for the termwatch session observer.

mod session;
mod transcript;

pub use session::*;
pub use transcript::*;
