pub mod normalizer;

pub use normalizer::{normalize, normalize_json, NormalizedBatch};
