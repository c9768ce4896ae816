use thiserror::Error;

use crate::db::traits::StoreError;

/// The error taxonomy shared by all the engine APIs.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// The request was malformed. Nothing was changed.
    #[error("{0}")]
    ValidationError(String),
    /// The caller is authenticated, but lacks the role for this operation.
    #[error("{0}")]
    AuthorizationError(String),
    /// The entity does not exist, or is not visible to the caller.
    #[error("{0}")]
    NotFound(String),
    /// Storage or another collaborator failed. Retrying may help.
    #[error("A required service failed. {0}")]
    DependencyError(String),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        Self::DependencyError(e.to_string())
    }
}

impl OrderFlowError {
    pub fn order_not_found() -> Self {
        Self::NotFound("Order not found".to_string())
    }
}
