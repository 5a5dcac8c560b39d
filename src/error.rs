use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Failures scoped to a single document. The batch skips these and moves on.
    pub fn is_document_local(&self) -> bool {
        matches!(self, Self::MissingInput(_) | Self::MalformedDocument { .. })
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
