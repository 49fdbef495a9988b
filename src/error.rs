//! Error taxonomy and its translation to the response envelope.
//!
//! Collaborators raise their own low-level errors. Every one of them is
//! turned into exactly one [`StorefrontError`] before it reaches a handler,
//! and the internal detail is logged at that point, never sent.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::auth::email::MailError;
use crate::auth::password::HashError;
use crate::db::StoreError;
use crate::response::ApiResponse;
use crate::validation::ValidationReport;

#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error("invalid fields: {}", .0.invalid_fields().join(", "))]
    ValidationFailed(ValidationReport),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("account not found")]
    AccountNotFound,

    #[error("email not verified")]
    EmailNotVerified,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("email already verified")]
    AlreadyVerified,

    #[error("verification token rejected")]
    VerificationFailed,

    #[error("token invalid")]
    TokenInvalid,

    #[error("token expired")]
    TokenExpired,

    #[error("missing bearer token")]
    MissingToken,

    #[error("forbidden")]
    Forbidden,

    #[error("product not found")]
    ProductNotFound,

    #[error("cart item not found")]
    CartItemNotFound,

    #[error("route not found")]
    RouteNotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("persistence failed")]
    PersistenceFailed,

    #[error("mail delivery failed")]
    DeliveryFailed,

    #[error("internal error")]
    Internal,
}

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_)
            | Self::MalformedBody(_)
            | Self::DuplicateEmail
            | Self::EmailNotVerified
            | Self::IncorrectPassword
            | Self::AlreadyVerified
            | Self::VerificationFailed
            | Self::TokenInvalid
            | Self::TokenExpired => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AccountNotFound
            | Self::ProductNotFound
            | Self::CartItemNotFound
            | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
            Self::PersistenceFailed | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::IncorrectPassword => "INCORRECT_PASSWORD",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingToken => "MISSING_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::PersistenceFailed => "PERSISTENCE_FAILED",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Client-facing text. Never carries collaborator detail.
    pub fn message(&self) -> String {
        match self {
            Self::ValidationFailed(_) => "Invalid fields".to_string(),
            Self::MalformedBody(_) => "Malformed request body".to_string(),
            Self::PayloadTooLarge => "Request body too large".to_string(),
            Self::DuplicateEmail => "Email already exists".to_string(),
            Self::AccountNotFound => "User not found".to_string(),
            Self::EmailNotVerified => "Email not verified".to_string(),
            Self::IncorrectPassword => "Incorrect password".to_string(),
            Self::AlreadyVerified => "Email already verified".to_string(),
            Self::VerificationFailed => "Invalid or expired token".to_string(),
            Self::TokenInvalid => "Invalid token".to_string(),
            Self::TokenExpired => "Token expired".to_string(),
            Self::MissingToken => "Missing authorization".to_string(),
            Self::Forbidden => "You do not have access to this resource".to_string(),
            Self::ProductNotFound => "Product not found".to_string(),
            Self::CartItemNotFound => "Product not found in cart".to_string(),
            Self::RouteNotFound => "Route not found".to_string(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::PersistenceFailed => "Could not save changes".to_string(),
            Self::DeliveryFailed => "Could not send email, please try again later".to_string(),
            Self::Internal => "Internal server error".to_string(),
        }
    }

    pub fn to_envelope(&self) -> ApiResponse {
        let response = ApiResponse::failure(self.status(), self.code(), &self.message());
        match self {
            Self::ValidationFailed(report) => response.with_data(json!({ "errors": report })),
            _ => response,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        self.to_envelope().into_response()
    }
}

impl From<StoreError> for StorefrontError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => StorefrontError::DuplicateEmail,
            other => {
                log::error!("Database error: {}", other);
                StorefrontError::PersistenceFailed
            }
        }
    }
}

impl From<HashError> for StorefrontError {
    fn from(err: HashError) -> Self {
        log::error!("Password hashing error: {}", err);
        StorefrontError::Internal
    }
}

impl From<MailError> for StorefrontError {
    fn from(err: MailError) -> Self {
        log::error!("Failed to send email: {}", err);
        StorefrontError::DeliveryFailed
    }
}

impl From<JsonRejection> for StorefrontError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        log::warn!("Rejected request body: {}", detail);
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return StorefrontError::PayloadTooLarge;
        }
        StorefrontError::MalformedBody(detail)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StorefrontError>;
