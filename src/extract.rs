use axum::extract::FromRequest;

use crate::error::StorefrontError;

/// `axum::Json` whose rejection is rendered with the response envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(StorefrontError))]
pub struct JsonBody<T>(pub T);
