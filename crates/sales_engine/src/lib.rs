pub mod dashboards;
pub mod shared;
pub mod usecases;

pub use dashboards::d410_sales_overview::SalesEngine;
pub use shared::error::{EngineError, EngineResult};
pub use usecases::u602_refresh_batch::{
    BatchSource, DashboardService, FileBatchSource, RefreshOutcome,
};
