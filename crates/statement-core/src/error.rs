use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatementError {
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Invalid sort key: '{0}' is not a field of the statement record")]
    InvalidSortKey(String),

    #[error("Invalid parameter: {name}={value:?} is not a valid number")]
    InvalidParameter { name: String, value: String },
}

impl StatementError {
    /// Stable machine-readable code, used in error response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            StatementError::Upstream(_) => "UPSTREAM_ERROR",
            StatementError::MalformedRecord { .. } => "MALFORMED_RECORD",
            StatementError::InvalidSortKey(_) => "INVALID_SORT_KEY",
            StatementError::InvalidParameter { .. } => "INVALID_PARAMETER",
        }
    }

    /// True for errors caused by the caller's request rather than the provider.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StatementError::InvalidSortKey(_) | StatementError::InvalidParameter { .. }
        )
    }
}
