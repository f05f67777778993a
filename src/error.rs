use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the grade engine and its ledger.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid score: {0}")]
    InvalidScore(String),

    #[error("unknown grade point {0}: not in the grade band table")]
    UnknownGrade(f64),

    #[error("no credits to weight: total credits must be greater than zero")]
    NoCredits,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ledger at {path:?} is corrupt: {source}; reset the ledger to recover")]
    LedgerCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ledger I/O error: {0}")]
    LedgerIo(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
