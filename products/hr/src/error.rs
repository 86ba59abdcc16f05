use platform_api::ApiError;
use thiserror::Error;

use crate::ports::StoreError;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Employee is already assigned to this project")]
    AlreadyAssigned,
    #[error("staleness window reaches past the earliest representable date")]
    StaleWindowOutOfRange,
    #[error("storage failure")]
    Store(#[from] StoreError),
}

impl HrError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<HrError> for ApiError {
    fn from(value: HrError) -> Self {
        match value {
            HrError::Validation(message) => ApiError::Validation(message),
            HrError::NotFound(_) => ApiError::NotFound(value.to_string()),
            HrError::AlreadyAssigned => ApiError::Conflict(value.to_string()),
            HrError::StaleWindowOutOfRange => ApiError::internal(anyhow::Error::new(value)),
            HrError::Store(err) => ApiError::internal(anyhow::Error::new(err)),
        }
    }
}
