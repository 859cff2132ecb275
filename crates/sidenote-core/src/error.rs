//! Error types for host operations.

use thiserror::Error;

/// Errors reported by a host while reading or editing its render tree.
///
/// None of these escape a layout pass; the pass logs them and skips the
/// affected annotation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SidenoteError {
    /// A host or DOM call failed.
    #[error("host operation failed: {0}")]
    Host(String),

    /// The handle no longer refers to a node in the tree.
    #[error("node is detached from the render tree")]
    Detached,

    /// The element cannot carry the requested property.
    #[error("unsupported element: {0}")]
    Unsupported(String),
}

impl From<&str> for SidenoteError {
    fn from(s: &str) -> Self {
        SidenoteError::Host(s.to_string())
    }
}

impl From<String> for SidenoteError {
    fn from(s: String) -> Self {
        SidenoteError::Host(s)
    }
}
