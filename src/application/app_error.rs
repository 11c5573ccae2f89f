use chrono::NaiveTime;
use thiserror::Error;

use crate::domain::calendar::InvalidRange;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid date range: {0}")]
    InvalidRange(#[from] InvalidRange),

    #[error("Date is in the past")]
    PastDate,

    #[error("Changes for today are closed after {cutoff}")]
    CutoffExceeded { cutoff: NaiveTime },

    #[error("Date is already paused")]
    DuplicatePause,

    #[error("Date is not paused")]
    PauseNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRange,
    PastDate,
    CutoffExceeded,
    DuplicatePause,
    PauseNotFound,
    InvalidInput,
    InvalidSignature,
    Conflict,
    NotFound,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRange => "INVALID_RANGE",
            ErrorCode::PastDate => "PAST_DATE",
            ErrorCode::CutoffExceeded => "CUTOFF_EXCEEDED",
            ErrorCode::DuplicatePause => "DUPLICATE_PAUSE",
            ErrorCode::PauseNotFound => "PAUSE_NOT_FOUND",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidRange(_) => ErrorCode::InvalidRange,
            AppError::PastDate => ErrorCode::PastDate,
            AppError::CutoffExceeded { .. } => ErrorCode::CutoffExceeded,
            AppError::DuplicatePause => ErrorCode::DuplicatePause,
            AppError::PauseNotFound => ErrorCode::PauseNotFound,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::InvalidSignature => ErrorCode::InvalidSignature,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Transient failures where retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
