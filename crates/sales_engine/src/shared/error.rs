use thiserror::Error;

/// Dataset-level failures of the engine.
///
/// Per-record problems are never errors; the normalizer recovers from them
/// and reports them in `NormalizeReport`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("payload is not a list of models (found {0})")]
    NotAModelList(&'static str),

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("invalid range {from}..{to}: reversed or too wide")]
    InvalidRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
