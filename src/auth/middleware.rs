//! Access gate for protected routes
//!
//! Extracts the bearer token from the `Authorization` header, verifies it,
//! re-reads the account it names and enforces the route's allowed roles.
//! The resolved [`Identity`] is attached to the request extensions.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::models::{Identity, Role, TokenPurpose};
use super::service::{gate_token_error, AuthService};
use crate::error::{Result, StorefrontError};

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn extract_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Gate configuration for one group of routes
#[derive(Clone)]
pub struct AccessGate {
    auth: Arc<AuthService>,
    allowed_roles: Option<Arc<[Role]>>,
}

impl AccessGate {
    /// Any verified account may pass
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self {
            auth,
            allowed_roles: None,
        }
    }

    /// Only accounts holding one of `roles` may pass
    pub fn with_roles(auth: Arc<AuthService>, roles: &[Role]) -> Self {
        Self {
            auth,
            allowed_roles: Some(roles.into()),
        }
    }

    /// Resolve the caller from a raw `Authorization` header value.
    pub fn authorize(&self, header: Option<&str>) -> Result<Identity> {
        let token = extract_token(header).ok_or(StorefrontError::MissingToken)?;

        let claims = self.auth.tokens().verify(token).map_err(gate_token_error)?;
        if claims.purpose != TokenPurpose::Access {
            return Err(StorefrontError::TokenInvalid);
        }

        // Role and verification state come from the live record, not the token.
        let account = self
            .auth
            .store()
            .find_by_email(&claims.email)?
            .ok_or(StorefrontError::TokenInvalid)?;

        if !account.email_verified {
            return Err(StorefrontError::EmailNotVerified);
        }

        if let Some(roles) = &self.allowed_roles {
            if !roles.contains(&account.role) {
                return Err(StorefrontError::Forbidden);
            }
        }

        Ok(account.identity())
    }
}

/// Middleware entry point, used with `axum::middleware::from_fn_with_state`.
pub async fn access_gate(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, StorefrontError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match gate.authorize(header) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(err) => {
            log::warn!(
                "Access denied for {} {}: {}",
                request.method(),
                request.uri().path(),
                err
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{Claims, RegisterRequest};
    use crate::auth::service::tests::{harness, Harness};
    use assert_matches::assert_matches;
    use serde_json::json;

    async fn verified_alice(h: &Harness) -> String {
        h.service
            .register(RegisterRequest {
                name: json!("Alice Doe"),
                password: json!("supersecret1"),
                email: json!("alice@example.com"),
            })
            .await
            .unwrap();
        let url = h.outbox.sent()[0].action_url.clone();
        h.service.verify_email(url.rsplit('/').next().unwrap()).unwrap();
        h.service
            .login("alice@example.com", "supersecret1")
            .unwrap()
            .access_token
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_token(Some("Bearer ")), None);
        assert_eq!(extract_token(Some("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_token(None), None);
    }

    #[tokio::test]
    async fn test_valid_token_resolves_identity() {
        let h = harness();
        let token = verified_alice(&h).await;
        let auth = Arc::new(h.service);

        let identity = AccessGate::new(auth)
            .authorize(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens() {
        let h = harness();
        let tokens = h.tokens.clone();
        let gate = AccessGate::new(Arc::new(h.service));

        assert_matches!(gate.authorize(None), Err(StorefrontError::MissingToken));
        assert_matches!(
            gate.authorize(Some("Bearer nope")),
            Err(StorefrontError::TokenInvalid)
        );

        let expired = tokens
            .issue(Claims::verification("alice@example.com"), chrono::Duration::seconds(-120))
            .unwrap();
        assert_matches!(
            gate.authorize(Some(&format!("Bearer {}", expired))),
            Err(StorefrontError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn test_non_access_token_is_rejected() {
        let h = harness();
        verified_alice(&h).await;
        let reset = h
            .tokens
            .issue(Claims::reset("alice@example.com"), chrono::Duration::days(1))
            .unwrap();

        let gate = AccessGate::new(Arc::new(h.service));
        assert_matches!(
            gate.authorize(Some(&format!("Bearer {}", reset))),
            Err(StorefrontError::TokenInvalid)
        );
    }

    #[tokio::test]
    async fn test_live_record_is_rechecked() {
        let h = harness();
        h.service
            .register(RegisterRequest {
                name: json!("Alice Doe"),
                password: json!("supersecret1"),
                email: json!("alice@example.com"),
            })
            .await
            .unwrap();
        let account = h.service.store().find_by_email("alice@example.com").unwrap().unwrap();

        // Well-formed access token for an account that is still unverified.
        let token = h.tokens.issue(Claims::access(&account), chrono::Duration::days(1)).unwrap();
        let gate = AccessGate::new(Arc::new(h.service));
        assert_matches!(
            gate.authorize(Some(&format!("Bearer {}", token))),
            Err(StorefrontError::EmailNotVerified)
        );
    }

    #[tokio::test]
    async fn test_role_membership() {
        let h = harness();
        let token = verified_alice(&h).await;
        let auth = Arc::new(h.service);
        let header = format!("Bearer {}", token);

        let admins_only = AccessGate::with_roles(auth.clone(), &[Role::Admin]);
        assert_matches!(admins_only.authorize(Some(&header)), Err(StorefrontError::Forbidden));

        let shoppers = AccessGate::with_roles(auth, &[Role::User, Role::Admin]);
        assert!(shoppers.authorize(Some(&header)).is_ok());
    }
}
