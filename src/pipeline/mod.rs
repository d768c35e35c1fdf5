//! Run orchestration, diagnostics and output

pub mod diagnostics;
pub mod orchestrator;
pub mod output;

pub use diagnostics::{Diagnostic, RunReport, Severity};
pub use orchestrator::Pipeline;
pub use output::{OutputRow, ResampleOutput, RunStats};
