#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss)]

//! Operations orchestration for ratewatch
//!
//! This crate sits between the CLI and the lower crates. It owns the
//! download tasks, spawns the workers and the reporter, and hands results
//! back as serializable summaries.

mod context;
mod probe;
mod reporter;
mod session;
mod task;
mod types;
mod worker;

pub use context::{OpsContextBuilder, OpsCtx};
pub use probe::probe;
pub use reporter::Reporter;
pub use session::watch;
pub use task::DownloadTask;
pub use types::{OperationResult, ProbeFailure, ProbeReport, SessionSummary, TaskSummary};
pub use worker::{run_worker, WorkerExit};
