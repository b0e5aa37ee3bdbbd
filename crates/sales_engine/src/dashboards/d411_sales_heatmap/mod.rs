pub mod service;

pub use service::{bucket_for, build_heatmap, heatmap_for_records};
