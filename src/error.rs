use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttendanceError {
    /// Stable error code reported in the IPC envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::Validation(_) => "bad_params",
            AttendanceError::NotFound(_) => "not_found",
            AttendanceError::Conflict(_) => "conflict",
            AttendanceError::Persistence(_) => "db_query_failed",
            AttendanceError::Io(_) => "io_failed",
        }
    }
}

/// Failures of the statistics cache backend. Never surfaced to callers.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed cache payload: {0}")]
    Payload(#[from] serde_json::Error),
}
