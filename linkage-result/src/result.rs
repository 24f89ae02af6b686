use crate::error::Error;

/// Result type alias used throughout linkage.
pub type Result<T> = std::result::Result<T, Error>;
