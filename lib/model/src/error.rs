use crate::{BoardId, ColumnId};
use std::error::Error;
use std::sync::Arc;

/// A formula failed to parse.
///
/// Unrecoverable for that formula; the resolver degrades the column to an
/// empty scalar and logs the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Everything that can go wrong while resolving a column value.
///
/// Only [ResolveError::Remote] and [ResolveError::Cancelled] escape the public
/// API; the other kinds degrade to empty scalars inside the resolver. The type
/// is cheaply clonable because the in-flight deduplication layer hands one
/// outcome to every observer.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The board is unknown to the platform.
    #[error("board {0} has no schema")]
    MissingSchema(BoardId),
    /// The column id does not exist on the board.
    #[error("column {column} does not exist on board {board}")]
    MissingColumn { board: BoardId, column: ColumnId },
    /// The query client surfaced a transport or platform error.
    #[error("remote query failed: {0}")]
    Remote(#[source] Arc<dyn Error + Send + Sync + 'static>),
    /// Cooperative shutdown.
    #[error("resolution was cancelled")]
    Cancelled,
}

impl From<Box<dyn Error + Send + Sync + 'static>> for ResolveError {
    fn from(error: Box<dyn Error + Send + Sync + 'static>) -> Self {
        ResolveError::Remote(Arc::from(error))
    }
}

impl ResolveError {
    /// Wraps a client error, preserving the original cause chain.
    pub fn remote(error: impl Error + Send + Sync + 'static) -> Self {
        ResolveError::Remote(Arc::new(error))
    }

    /// Whether this error escapes the core instead of degrading to an empty
    /// scalar.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResolveError::Remote(_) | ResolveError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_remote_and_cancelled_are_fatal() {
        assert!(ResolveError::remote(std::io::Error::other("boom")).is_fatal());
        assert!(ResolveError::Cancelled.is_fatal());
        assert!(!ResolveError::MissingSchema(BoardId::new(1)).is_fatal());
        assert!(!ResolveError::Parse(ParseError::new(0, "unexpected token")).is_fatal());
    }
}
