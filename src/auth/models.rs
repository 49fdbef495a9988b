//! Authentication data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    /// Last verification token sent, cleared once the email is verified
    pub verification_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            email_verified: self.email_verified,
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Account as returned after registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Caller identity attached to a request by the access gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// What a token may be redeemed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    VerifyEmail,
    Access,
    ResetPassword,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>, // account id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub purpose: TokenPurpose,
    #[serde(default)]
    pub iat: i64, // issued at timestamp
    #[serde(default)]
    pub exp: i64, // expiration timestamp
}

impl Claims {
    fn email_bound(email: &str, purpose: TokenPurpose) -> Self {
        Self {
            sub: None,
            name: None,
            email: email.to_string(),
            role: None,
            purpose,
            iat: 0,
            exp: 0,
        }
    }

    pub fn verification(email: &str) -> Self {
        Self::email_bound(email, TokenPurpose::VerifyEmail)
    }

    pub fn reset(email: &str) -> Self {
        Self::email_bound(email, TokenPurpose::ResetPassword)
    }

    pub fn access(account: &Account) -> Self {
        Self {
            sub: Some(account.id.clone()),
            name: Some(account.name.clone()),
            email: account.email.clone(),
            role: Some(account.role),
            purpose: TokenPurpose::Access,
            iat: 0,
            exp: 0,
        }
    }
}

// ==================== API request/response types ====================

// Register and recovery bodies keep raw JSON values so the validator can
// report type errors per field instead of failing the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub password: Value,
    #[serde(default)]
    pub email: Value,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecoveryPasswordRequest {
    #[serde(default)]
    pub password: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: "acc_1".to_string(),
            name: "Alice Doe".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            role: Role::User,
            email_verified: false,
            verification_token: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_projections_never_expose_hash() {
        let account = account();
        let summary = serde_json::to_string(&account.summary()).unwrap();
        let public = serde_json::to_string(&account.public()).unwrap();
        let identity = serde_json::to_string(&account.identity()).unwrap();

        for rendered in [summary, public, identity] {
            assert!(!rendered.contains("argon2"));
        }
    }

    #[test]
    fn test_summary_uses_camel_case() {
        let value = serde_json::to_value(account().summary()).unwrap();
        assert_eq!(value["emailVerified"], serde_json::json!(false));
        assert_eq!(value["role"], serde_json::json!("user"));
    }

    #[test]
    fn test_email_bound_claims_omit_identity() {
        let value = serde_json::to_value(Claims::reset("alice@example.com")).unwrap();
        assert!(value.get("sub").is_none());
        assert!(value.get("role").is_none());
        assert_eq!(value["purpose"], serde_json::json!("reset_password"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
    }
}
