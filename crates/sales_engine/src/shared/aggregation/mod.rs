pub mod comparator;
pub mod ranking;
pub mod rollup;

pub use rollup::{aggregate, aggregate_by, aggregate_parallel, Dimension, Rollup};
