//! Error types for airroute-vector

use thiserror::Error;

use crate::route::RouteId;

/// Errors that can occur in the similarity engine
#[derive(Debug, Error)]
pub enum VectorError {
    /// Route has no stored embedding
    #[error("Route not found or has no embedding: {0}")]
    NotFound(RouteId),

    /// Vector length differs from the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Model loading error
    #[error("Model error: {0}")]
    Model(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// RocksDB error
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    /// Serialization error (bincode)
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Malformed stored metadata
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl VectorError {
    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create a dimension mismatch error
    pub fn dimension(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Query-path failures the caller caused (as opposed to a broken backend)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DimensionMismatch { .. })
    }

    /// The embedding model failed to load or to run
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Embedding(_))
    }

    /// Persistence read/write failure
    pub fn is_store_io(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::Bincode(_)
                | Self::Io(_)
                | Self::InvalidPath(_)
                | Self::Parse(_)
        )
    }
}

/// Result type for similarity engine operations
pub type Result<T> = std::result::Result<T, VectorError>;
