//! Queueing and execution of validated installs.
//!
//! Submitted items flow through a shared [`queue::WorkQueue`] to a fixed pool
//! of workers ([`dispatcher::Dispatcher`]). Each worker runs the install
//! command as a plain argv process, discovers the installed version, writes
//! an audit entry and updates the [`progress::ProgressTable`].
//! [`manager::InstallationManager`] ties these together.

pub mod dispatcher;
pub mod manager;
pub mod progress;
pub mod queue;
pub mod runner;
pub mod types;
pub mod version;

pub use dispatcher::DispatchConfig;
pub use manager::{InstallationManager, ManagerOptions};
pub use progress::ProgressSnapshot;
pub use runner::{CommandOutput, ProcessRunner, TokioProcessRunner};
pub use types::{ExecutionRecord, ExecutionStatus, InstallEvent, QueueOutcome};
