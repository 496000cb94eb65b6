//! Error types for the loader.
//!
//! Fetch failures are not errors at this level; they are classified into the
//! tracker (critical or non-critical) and surfaced through the render gate.
//! [`LoaderError`] covers driver lifecycle misuse and teardown conditions.

use thiserror::Error;

/// Errors surfaced by the lifecycle driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// Operation requires a mounted driver.
    #[error("loader is not mounted")]
    NotMounted,

    /// The driver was unmounted; no further loading is possible.
    #[error("loader was unmounted")]
    Unmounted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", LoaderError::NotMounted), "loader is not mounted");
        assert_eq!(format!("{}", LoaderError::Unmounted), "loader was unmounted");
    }
}
