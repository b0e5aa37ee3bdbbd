pub mod guard;
pub mod service;
pub mod source;

pub use guard::{RequestGuard, RequestTicket};
pub use service::{DashboardService, RefreshOutcome};
pub use source::{BatchSource, FileBatchSource};
