use thiserror::Error;

use crate::catalog::CatalogError;
use crate::dialogue::states::MergeConflict;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("budget bound conflict: minimum {min} exceeds maximum {max}")]
    BudgetRangeConflict { min: i64, max: i64 },
    #[error("mileage bound conflict: minimum {min} exceeds maximum {max}")]
    MileageRangeConflict { min: f64, max: f64 },
}

impl From<MergeConflict> for DomainError {
    fn from(value: MergeConflict) -> Self {
        match value {
            MergeConflict::BudgetRange { min, max } => Self::BudgetRangeConflict { min, max },
            MergeConflict::MileageRange { min, max } => Self::MileageRangeConflict { min, max },
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("fallback generator unavailable: {0}")]
    FallbackUnavailable(String),
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        Self::StoreUnavailable(value.to_string())
    }
}

impl ApplicationError {
    /// Reply shown to the buyer in place of the failed step.
    pub fn user_message(&self, brand: &str) -> String {
        match self {
            Self::StoreUnavailable(_) => {
                "Sorry, I couldn't search our catalog right now. Please try again in a moment."
                    .to_string()
            }
            Self::FallbackUnavailable(_) => format!(
                "I'm having trouble connecting. Please ask about {brand} cars or visit our website."
            ),
        }
    }
}

/// Transport-facing rejection. Turn failures never reach this layer; only
/// malformed requests and unknown sessions do.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn not_found(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::NotFound { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "No conversation exists for that session.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::NotFound { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}
