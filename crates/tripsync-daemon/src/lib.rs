//! Daemon: reconciliation passes, scheduler, signal handling.
//!
//! This crate wires the pure reconciliation core to the providers:
//! - [`SyncPass`] runs one fetch → normalize → diff → apply cycle
//! - [`Scheduler`] drives passes on an interval with graceful shutdown
//! - [`PassReport`] is the per-pass outcome surfaced to logs and the CLI

mod config;
mod error;
mod pass;
mod report;
mod scheduler;
mod signals;

pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult};
pub use pass::SyncPass;
pub use report::{ApplyFailure, ApplyOperation, PassReport};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState, new_scheduler_state,
};
pub use signals::{ShutdownSignal, SignalHandler};
