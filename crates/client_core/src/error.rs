use shared::error::FilterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("record container is not initialized")]
    NotInitialized,
    #[error("failed to load filter definition: {source:#}")]
    Definition { source: anyhow::Error },
    #[error("column index {index} is outside the {len} order-by fields")]
    UnknownColumn { index: usize, len: usize },
    #[error("record limit must be greater than zero")]
    InvalidRecordLimit,
    #[error(transparent)]
    Filter(#[from] FilterError),
}
