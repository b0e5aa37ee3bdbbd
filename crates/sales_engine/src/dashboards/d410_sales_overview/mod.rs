pub mod service;

pub use service::{build_overview, Dataset, SalesEngine};
