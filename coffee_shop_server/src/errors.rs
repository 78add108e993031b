use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use coffee_shop_engine::DrinkApiError;
use log::{debug, error};
use thiserror::Error;

use crate::data_objects::ErrorResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    AuthenticationError(#[from] AuthError),
    #[error("Resource not found. {0}")]
    NoRecordFound(String),
    #[error("Unprocessable. {0}")]
    Unprocessable(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Request body is too large. The limit is {0} bytes.")]
    PayloadTooLarge(usize),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationError(e) => e.status_code(),
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(status, self.to_string()))
    }
}

impl From<DrinkApiError> for ServerError {
    fn from(e: DrinkApiError) -> Self {
        match e {
            DrinkApiError::DrinkNotFound(_) => Self::NoRecordFound(e.to_string()),
            DrinkApiError::ValidationError(_) | DrinkApiError::DuplicateTitle(_) => Self::Unprocessable(e.to_string()),
            DrinkApiError::CorruptRecipe { .. } => {
                error!("🗃️ Data integrity fault. {e}");
                Self::Unprocessable("The stored drink could not be read".to_string())
            },
            // Anything left over is a failure in the store itself. Don't leak its details to the caller.
            DrinkApiError::DatabaseError(_) => {
                debug!("🗃️ Store operation failed. {e}");
                Self::Unprocessable("The request could not be completed".to_string())
            },
        }
    }
}

/// Failures of the bearer-token authorization pipeline.
///
/// Each variant maps to exactly one status code (see [`AuthError::status_code`]); the display text is returned to the
/// caller as the error message.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    AuthHeaderMissing,
    #[error("Authorization header must be a bearer token. {0}")]
    AuthHeaderMalformed(String),
    #[error("Unable to parse authentication token. {0}")]
    MalformedToken(String),
    #[error("Unable to find the appropriate key.")]
    KeyNotFound,
    #[error("Unable to fetch the signing keys of the identity provider.")]
    KeySetUnavailable(String),
    #[error("Token expired.")]
    TokenExpired,
    #[error("Incorrect claims. Please, check the audience and issuer. {0}")]
    InvalidClaims(String),
    #[error("Token signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("Permissions not included in JWT.")]
    PermissionsClaimMissing,
    #[error("Permission not found. {0} is required.")]
    PermissionNotFound(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PermissionsClaimMissing => StatusCode::BAD_REQUEST,
            Self::PermissionNotFound(_) => StatusCode::FORBIDDEN,
            Self::AuthHeaderMissing |
            Self::AuthHeaderMalformed(_) |
            Self::MalformedToken(_) |
            Self::KeyNotFound |
            Self::KeySetUnavailable(_) |
            Self::TokenExpired |
            Self::InvalidClaims(_) |
            Self::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
        }
    }
}
