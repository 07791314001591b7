//! Domain models for NightCheck.
//!
//! Canonical definitions for the core entities:
//! - `Family`: Interpreter family of a script
//! - `Verdict`: Syntax or runtime outcome for one check
//! - `ScriptRecord`: Everything learned about one script in a run
//! - `RunReport`: Records plus coverage gaps for a whole run

pub mod error;
pub mod family;
pub mod record;
pub mod verdict;

// Re-export main types and errors
pub use error::{CheckError, Result};
pub use family::Family;
pub use record::{RunReport, ScriptRecord, SkipReason, UncheckedScript};
pub use verdict::{combine_runtime, Verdict, NONE_SENTINEL};
