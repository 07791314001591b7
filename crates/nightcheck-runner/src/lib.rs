//! NightCheck runner
//!
//! Everything that touches the outside world during a run:
//! - Runs external commands with a timeout (`CommandRunner`)
//! - Syntax-checks scripts with their family's compile-only command
//! - Reads the scheduler table (`crontab -l -u <user>`)
//! - Discovers scripts in the configured directories
//! - Orchestrates a full run and persists its results

pub mod discovery;
pub mod pipeline;
pub mod runner;
pub mod scheduler;
pub mod syntax;

// Re-export key types
pub use discovery::{discover_scripts, is_candidate_name};
pub use pipeline::NightCheckPipeline;
pub use runner::{CommandOutput, CommandRunner, FakeCommandRunner, RunnerError, TokioCommandRunner};
pub use scheduler::{CrontabSource, ScheduleSource, StaticSchedule};
pub use syntax::{verdict_from_diagnostics, SyntaxChecker, SUCCESS_MARKER};
