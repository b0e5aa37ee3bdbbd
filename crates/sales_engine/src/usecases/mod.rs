pub mod u601_normalize_batch;
pub mod u602_refresh_batch;
