use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FilterName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

/// Error body returned by the record service on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("{delta} delta cannot be merged into the {target} slot")]
    KindMismatch { target: FilterName, delta: FilterName },
    #[error("no {0} slot on this container")]
    UnknownSlot(FilterName),
    #[error("direction tokens must be exactly [ascending, descending], got {0} entries")]
    DirectionCount(usize),
}
