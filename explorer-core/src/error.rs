use std::path::PathBuf;

/// The crate-wide error type for `explorer-core`.
///
/// Mirrors the error kinds enumerated for this system: inbound-request
/// validation failures are [`CoreError::BadRequest`], and anything fatal
/// enough to abort startup is [`CoreError::Fatal`]. [`CoreError::CacheCorruption`]
/// is built by the durability layer's readers purely to log a consistent
/// message — it is never propagated as an `Err`, since a malformed cache
/// file degrades to an empty default rather than failing the caller.
/// Upstream I/O failures are likewise never represented as an `Err` here:
/// they are recovered at the call site (the fetch planner) and leave the
/// affected gap uncovered instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no data in requested export range")]
    ExportRange,

    #[error("failed to bind listen address: {0}")]
    Fatal(String),

    #[error("malformed cache file {path:?}: {source}")]
    CacheCorruption {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
