//! Error types for the selection tree engine.

use thiserror::Error;

pub type SelectionResult<T> = Result<T, SelectionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The flat path list is structurally inconsistent (file/folder clash,
    /// empty segment, leading or trailing slash).
    #[error("malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// An operation referenced a path that is not in the full tree.
    #[error("unknown path '{path}'")]
    UnknownPath { path: String },

    /// The background build failed or vanished before delivering a tree.
    #[error("tree build interrupted after {processed} entries: {source}")]
    BuildInterrupted {
        processed: usize,
        #[source]
        source: Box<SelectionError>,
    },

    /// Terminal failure of a worker that never reported a reason.
    #[error("{0}")]
    WorkerLost(String),
}

impl SelectionError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        SelectionError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(path: &str) -> Self {
        SelectionError::UnknownPath {
            path: path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn build_interrupted_exposes_its_cause() {
        let err = SelectionError::BuildInterrupted {
            processed: 3,
            source: Box::new(SelectionError::malformed("a/b", "segment 'a' is a file")),
        };
        assert_eq!(
            err.to_string(),
            "tree build interrupted after 3 entries: malformed path 'a/b': segment 'a' is a file"
        );
        assert!(err.source().is_some());
    }
}
