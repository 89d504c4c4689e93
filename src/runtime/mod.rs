//! Host-facing composer runtime.

pub mod session;

pub use session::{ComposerSession, SendOutcome, Suggestions};
