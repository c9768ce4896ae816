use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use thiserror::Error;
use urbanease_engine::{OrderFlowError, StoreError};

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Could not read query string: {0}")]
    InvalidQuery(String),
    #[error("The request body is too large. {0}")]
    PayloadTooLarge(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InsufficientPermissions(String),
}

impl ServerError {
    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Renders the error envelope. Internal details are logged, and never sent to the client.
    fn error_response(&self) -> HttpResponse {
        let body = if self.is_internal() {
            error!("💻️ Request failed with an internal error. {self}");
            JsonResponse::failure("Something went wrong on our side. Please try again later.")
        } else {
            match self {
                Self::AuthenticationError(e) => JsonResponse::failure(e.headline()).with_error(e.to_string()),
                Self::InvalidRequestBody(e) => JsonResponse::failure("Invalid request body").with_error(e),
                Self::InvalidRequestPath(e) => JsonResponse::failure("Invalid request path").with_error(e),
                Self::InvalidQuery(e) => JsonResponse::failure("Invalid query string").with_error(e),
                Self::PayloadTooLarge(e) => JsonResponse::failure("Request body is too large").with_error(e),
                other => JsonResponse::failure(other),
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl AuthError {
    /// The short, client-facing summary of the failure.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::MissingToken => "Authentication required",
            Self::InsufficientPermissions(_) => "Insufficient permissions",
            Self::ValidationError(_) | Self::PoorlyFormattedToken(_) => "Invalid or expired token",
            Self::CouldNotIssueToken(_) => "Could not issue token",
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(s) => Self::ValidationError(s),
            OrderFlowError::AuthorizationError(s) => Self::InsufficientPermissions(s),
            OrderFlowError::NotFound(s) => Self::NoRecordFound(s),
            OrderFlowError::DependencyError(s) => Self::BackendError(s),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}
