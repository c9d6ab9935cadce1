use std::fmt;

/// Error type for counter store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached (process down, connection lost).
    Unavailable(String),
    /// The store answered, but its state for the key is unusable.
    Corrupted(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "counter store unavailable: {}", msg),
            StoreError::Corrupted(msg) => write!(f, "counter store corrupted: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
