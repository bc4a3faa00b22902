//! # Transfer Workflow & Application State
//!
//! The orchestration layer: owned observable state, the transfer state
//! machine, and the composition root that assembles a working client.
//!
//! - [`state`] — the owned dashboard state object
//! - [`transfer`] — the submit/refresh controller and its phase machine
//! - [`dashboard`] — wiring it all together behind one surface

pub mod dashboard;
pub mod state;
pub mod transfer;

pub use dashboard::Dashboard;
pub use state::{BalanceSnapshot, DashboardState, TransferForm};
pub use transfer::{TransferController, TransferPhase, WorkflowError};
