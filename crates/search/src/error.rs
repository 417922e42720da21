use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// Rejected before any process is spawned.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Search in {root} (*.{extension}) failed: {reason}")]
    InvocationFailure {
        root: String,
        extension: String,
        reason: String,
    },

    #[error("Search tool '{0}' is not available on this system")]
    ToolMissing(String),

    #[error("Search cancelled")]
    Cancelled,

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}
