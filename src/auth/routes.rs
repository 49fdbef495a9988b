//! Authentication REST API routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use serde_json::json;

use super::{
    middleware::{access_gate, AccessGate},
    models::{EmailRequest, Identity, LoginRequest, RecoveryPasswordRequest, RegisterRequest},
    service::AuthService,
};
use crate::error::Result;
use crate::extract::JsonBody;
use crate::response::ApiResponse;

/// Create auth router, to be nested under `/auth`
pub fn auth_router(auth: Arc<AuthService>) -> Router {
    let protected = Router::new()
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            AccessGate::new(auth.clone()),
            access_gate,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/verify-email/{token}", get(verify_email))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/recovery-password/{token}", post(recovery_password))
        .route("/resend-verification", post(resend_verification))
        .with_state(auth)
        .merge(protected)
}

/// POST /auth/register - Register new account
async fn register(
    State(auth): State<Arc<AuthService>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<ApiResponse> {
    let account = auth.register(req).await?;
    Ok(ApiResponse::success(
        "REGISTERED",
        "User registered, please verify your email",
    )
    .with_data(json!({ "account": account })))
}

/// GET /auth/verify-email/{token} - Verify email
async fn verify_email(
    State(auth): State<Arc<AuthService>>,
    Path(token): Path<String>,
) -> Result<ApiResponse> {
    auth.verify_email(&token)?;
    Ok(ApiResponse::success("EMAIL_VERIFIED", "Email verified successfully"))
}

/// POST /auth/login - Login with email/password
async fn login(
    State(auth): State<Arc<AuthService>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<ApiResponse> {
    let session = auth.login(&req.email, &req.password)?;
    Ok(ApiResponse::success("LOGIN_SUCCESS", "Login successful").with_data(session))
}

/// POST /auth/forgot-password - Request password reset
async fn forgot_password(
    State(auth): State<Arc<AuthService>>,
    JsonBody(req): JsonBody<EmailRequest>,
) -> Result<ApiResponse> {
    auth.forgot_password(&req.email).await?;
    Ok(ApiResponse::success("RESET_EMAIL_SENT", "Recovery email sent"))
}

/// POST /auth/recovery-password/{token} - Set a new password with a reset token
async fn recovery_password(
    State(auth): State<Arc<AuthService>>,
    Path(token): Path<String>,
    JsonBody(req): JsonBody<RecoveryPasswordRequest>,
) -> Result<ApiResponse> {
    auth.reset_password(&token, &req.password)?;
    Ok(ApiResponse::success("PASSWORD_RESET", "Password reset successfully"))
}

/// POST /auth/resend-verification - Send a fresh verification link
async fn resend_verification(
    State(auth): State<Arc<AuthService>>,
    JsonBody(req): JsonBody<EmailRequest>,
) -> Result<ApiResponse> {
    auth.resend_verification(&req.email).await?;
    Ok(ApiResponse::success("VERIFICATION_SENT", "Verification email sent"))
}

/// GET /auth/me - Identity attached by the access gate
async fn current_user(Extension(identity): Extension<Identity>) -> ApiResponse {
    ApiResponse::success("OK", "Authenticated").with_data(json!({ "user": identity }))
}
