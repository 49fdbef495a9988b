//! Registration, verification, login and password recovery.
//!
//! The account record is the authority for every one-time action: a token
//! only binds the request to an email, and whether the action already
//! happened is read back from the store on each call.

use std::sync::Arc;

use serde_json::Value;

use super::database::CredentialStore;
use super::email::MailDispatcher;
use super::jwt::{TokenError, TokenService};
use super::models::{
    Account, AccountSummary, Claims, LoginResponse, RegisterRequest, Role, TokenPurpose,
};
use super::password::CredentialHasher;
use crate::error::{Result, StorefrontError};
use crate::validation::{is_string, matches_email_pattern, min_length, Validator};

pub const NAME_MIN_LENGTH: usize = 5;
pub const PASSWORD_MIN_LENGTH: usize = 10;
pub const EMAIL_MIN_LENGTH: usize = 10;

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    tokens: TokenService,
    mailer: MailDispatcher,
    token_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: CredentialHasher,
        tokens: TokenService,
        mailer: MailDispatcher,
        token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            mailer,
            token_ttl,
        }
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn issue(&self, claims: Claims) -> Result<String> {
        self.tokens.issue(claims, self.token_ttl).map_err(|e| {
            log::error!("JWT creation error: {}", e);
            StorefrontError::Internal
        })
    }

    /// Verify a one-time token for `purpose`. Any failure is `VerificationFailed`.
    fn redeem(&self, token: &str, purpose: TokenPurpose) -> Result<Claims> {
        let claims = self.tokens.verify(token).map_err(|e| {
            log::warn!("Rejected {:?} token: {}", purpose, e);
            StorefrontError::VerificationFailed
        })?;
        if claims.purpose != purpose {
            log::warn!("Token for {:?} presented for {:?}", claims.purpose, purpose);
            return Err(StorefrontError::VerificationFailed);
        }
        Ok(claims)
    }

    fn find_account(&self, email: &str) -> Result<Account> {
        self.store
            .find_by_email(email)?
            .ok_or(StorefrontError::AccountNotFound)
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AccountSummary> {
        Validator::new()
            .field("name", &req.name, vec![is_string(), min_length(NAME_MIN_LENGTH)])
            .field(
                "password",
                &req.password,
                vec![is_string(), min_length(PASSWORD_MIN_LENGTH)],
            )
            .field(
                "email",
                &req.email,
                vec![matches_email_pattern(), min_length(EMAIL_MIN_LENGTH)],
            )
            .check()?;

        let name = text(&req.name);
        let email = text(&req.email);
        let password_hash = self.hasher.hash(text(&req.password))?;
        let verification_token = self.issue(Claims::verification(email))?;

        let now = chrono::Utc::now().to_rfc3339();
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::User,
            email_verified: false,
            verification_token: Some(verification_token.clone()),
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.create(&account)?;
        log::info!("Registered account {} ({})", account.id, account.email);

        // The account stays even if delivery fails; resend_verification recovers it.
        self.mailer
            .send_verification_email(&account.email, &account.name, &verification_token)
            .await?;

        Ok(account.summary())
    }

    pub fn verify_email(&self, token: &str) -> Result<()> {
        let claims = self.redeem(token, TokenPurpose::VerifyEmail)?;
        let account = self.find_account(&claims.email)?;

        if account.email_verified {
            return Err(StorefrontError::AlreadyVerified);
        }

        if self.store.set_verified(&account.email)? == 0 {
            log::error!("Account {} vanished during verification", account.id);
            return Err(StorefrontError::PersistenceFailed);
        }
        log::info!("Email verified for account {}", account.id);
        Ok(())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let account = self.find_account(email)?;

        if !account.email_verified {
            return Err(StorefrontError::EmailNotVerified);
        }

        if !self.hasher.verify(password, &account.password_hash)? {
            return Err(StorefrontError::IncorrectPassword);
        }

        let access_token = self.issue(Claims::access(&account))?;
        Ok(LoginResponse {
            access_token,
            user: account.public(),
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let account = self.find_account(email)?;
        let reset_token = self.issue(Claims::reset(&account.email))?;

        self.mailer
            .send_password_reset_email(&account.email, &account.name, &reset_token)
            .await?;
        log::info!("Password reset requested for account {}", account.id);
        Ok(())
    }

    pub fn reset_password(&self, reset_token: &str, new_password: &Value) -> Result<()> {
        let claims = self.redeem(reset_token, TokenPurpose::ResetPassword)?;
        let account = self.find_account(&claims.email)?;

        Validator::new()
            .field(
                "password",
                new_password,
                vec![is_string(), min_length(PASSWORD_MIN_LENGTH)],
            )
            .check()?;

        let password_hash = self.hasher.hash(text(new_password))?;
        // Write against the looked-up account, never a caller-supplied address.
        if self.store.set_password(&account.email, &password_hash)? == 0 {
            log::error!("Account {} vanished during password reset", account.id);
            return Err(StorefrontError::PersistenceFailed);
        }
        log::info!("Password reset for account {}", account.id);
        Ok(())
    }

    /// Issue and send a fresh verification token for an unverified account.
    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        let account = self.find_account(email)?;
        if account.email_verified {
            return Err(StorefrontError::AlreadyVerified);
        }

        let token = self.issue(Claims::verification(&account.email))?;
        self.store.set_verification_token(&account.email, &token)?;
        self.mailer
            .send_verification_email(&account.email, &account.name, &token)
            .await?;
        Ok(())
    }
}

/// Validated string fields; empty for anything else.
fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

/// Map token failures for the access gate, which keeps the two kinds apart.
pub(crate) fn gate_token_error(err: TokenError) -> StorefrontError {
    match err {
        TokenError::Expired => StorefrontError::TokenExpired,
        TokenError::Invalid | TokenError::Signing(_) => StorefrontError::TokenInvalid,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::database::SqliteCredentialStore;
    use crate::auth::email::LogMailer;
    use crate::db::{Database, StoreResult};
    use assert_matches::assert_matches;
    use serde_json::json;

    pub(crate) struct Harness {
        pub service: AuthService,
        pub outbox: LogMailer,
        pub tokens: TokenService,
    }

    pub(crate) fn harness_with_store(store: Arc<dyn CredentialStore>) -> Harness {
        let outbox = LogMailer::new();
        let tokens = TokenService::new("test-secret");
        let service = AuthService::new(
            store,
            CredentialHasher::new(8, 1, 1).unwrap(),
            tokens.clone(),
            MailDispatcher::log("http://localhost:5173", outbox.clone()),
            chrono::Duration::days(1),
        );
        Harness {
            service,
            outbox,
            tokens,
        }
    }

    pub(crate) fn harness() -> Harness {
        let db = Database::in_memory().unwrap();
        harness_with_store(Arc::new(SqliteCredentialStore::new(db)))
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            name: json!("Alice Doe"),
            password: json!("supersecret1"),
            email: json!("alice@example.com"),
        }
    }

    fn last_token(outbox: &LogMailer) -> String {
        let sent = outbox.sent();
        let url = &sent.last().unwrap().action_url;
        url.rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_full_account_lifecycle() {
        let h = harness();

        let summary = h.service.register(alice()).await.unwrap();
        assert!(!summary.email_verified);
        assert_eq!(h.outbox.sent().len(), 1);
        assert!(h.outbox.sent()[0].action_url.contains("/auth/verify-email/"));

        let verification_token = last_token(&h.outbox);
        h.service.verify_email(&verification_token).unwrap();

        let login = h.service.login("alice@example.com", "supersecret1").unwrap();
        assert_eq!(login.user.email, "alice@example.com");
        let claims = h.tokens.verify(&login.access_token).unwrap();
        assert_eq!(claims.purpose, TokenPurpose::Access);
        assert_eq!(claims.role, Some(Role::User));
        assert_eq!(claims.sub.as_deref(), Some(summary.id.as_str()));

        assert_matches!(
            h.service.verify_email(&verification_token),
            Err(StorefrontError::AlreadyVerified)
        );
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let h = harness();
        let result = h
            .service
            .register(RegisterRequest {
                name: json!(7),
                password: json!("short"),
                email: json!("not-an-email"),
            })
            .await;

        match result {
            Err(StorefrontError::ValidationFailed(report)) => {
                assert_eq!(report.invalid_fields(), vec!["email", "name", "password"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(h.outbox.sent().is_empty());
        assert!(h.service.store().find_by_email("not-an-email").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_twice_is_duplicate() {
        let h = harness();
        let first = h.service.register(alice()).await.unwrap();

        assert_matches!(
            h.service.register(alice()).await,
            Err(StorefrontError::DuplicateEmail)
        );
        let stored = h.service.store().find_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(h.outbox.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_login_blocked_until_verified() {
        let h = harness();
        h.service.register(alice()).await.unwrap();

        assert_matches!(
            h.service.login("alice@example.com", "supersecret1"),
            Err(StorefrontError::EmailNotVerified)
        );

        h.service.verify_email(&last_token(&h.outbox)).unwrap();
        assert!(h.service.login("alice@example.com", "supersecret1").is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_is_incorrect_password() {
        let h = harness();
        h.service.register(alice()).await.unwrap();
        h.service.verify_email(&last_token(&h.outbox)).unwrap();

        assert_matches!(
            h.service.login("alice@example.com", "wrong-password"),
            Err(StorefrontError::IncorrectPassword)
        );
        assert_matches!(
            h.service.login("nobody@example.com", "supersecret1"),
            Err(StorefrontError::AccountNotFound)
        );
    }

    #[test]
    fn test_verify_email_rejects_bad_tokens() {
        let h = harness();
        assert_matches!(
            h.service.verify_email("garbage"),
            Err(StorefrontError::VerificationFailed)
        );

        let expired = h
            .tokens
            .issue(
                Claims::verification("alice@example.com"),
                chrono::Duration::seconds(-120),
            )
            .unwrap();
        assert_matches!(
            h.service.verify_email(&expired),
            Err(StorefrontError::VerificationFailed)
        );

        let orphan = h
            .tokens
            .issue(Claims::verification("ghost@example.com"), chrono::Duration::days(1))
            .unwrap();
        assert_matches!(
            h.service.verify_email(&orphan),
            Err(StorefrontError::AccountNotFound)
        );
    }

    #[tokio::test]
    async fn test_reset_token_cannot_verify_email() {
        let h = harness();
        h.service.register(alice()).await.unwrap();
        h.service.forgot_password("alice@example.com").await.unwrap();

        assert_matches!(
            h.service.verify_email(&last_token(&h.outbox)),
            Err(StorefrontError::VerificationFailed)
        );
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let h = harness();
        h.service.register(alice()).await.unwrap();
        h.service.verify_email(&last_token(&h.outbox)).unwrap();

        h.service.forgot_password("alice@example.com").await.unwrap();
        let reset = h.outbox.sent().last().unwrap().clone();
        assert!(reset.action_url.contains("/auth/recovery-password/"));

        h.service
            .reset_password(&last_token(&h.outbox), &json!("brandnewpass1"))
            .unwrap();

        assert_matches!(
            h.service.login("alice@example.com", "supersecret1"),
            Err(StorefrontError::IncorrectPassword)
        );
        assert!(h.service.login("alice@example.com", "brandnewpass1").is_ok());
    }

    #[tokio::test]
    async fn test_reset_token_is_bound_to_its_account() {
        let h = harness();
        h.service.register(alice()).await.unwrap();
        h.service
            .register(RegisterRequest {
                name: json!("Bobby Roe"),
                password: json!("bobsecret99"),
                email: json!("bobby@example.com"),
            })
            .await
            .unwrap();

        h.service.forgot_password("alice@example.com").await.unwrap();
        h.service
            .reset_password(&last_token(&h.outbox), &json!("alicechanged1"))
            .unwrap();

        let bob = h.service.store().find_by_email("bobby@example.com").unwrap().unwrap();
        let hasher = CredentialHasher::new(8, 1, 1).unwrap();
        assert!(hasher.verify("bobsecret99", &bob.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_reset_password_validates_new_password() {
        let h = harness();
        h.service.register(alice()).await.unwrap();
        h.service.forgot_password("alice@example.com").await.unwrap();

        assert_matches!(
            h.service.reset_password(&last_token(&h.outbox), &json!("short")),
            Err(StorefrontError::ValidationFailed(_))
        );
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let h = harness();
        assert_matches!(
            h.service.forgot_password("nobody@example.com").await,
            Err(StorefrontError::AccountNotFound)
        );
        assert!(h.outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn test_resend_verification() {
        let h = harness();
        h.service.register(alice()).await.unwrap();

        h.service.resend_verification("alice@example.com").await.unwrap();
        assert_eq!(h.outbox.sent().len(), 2);

        h.service.verify_email(&last_token(&h.outbox)).unwrap();
        assert_matches!(
            h.service.resend_verification("alice@example.com").await,
            Err(StorefrontError::AlreadyVerified)
        );
    }

    /// Store whose rows disappear between lookup and write.
    struct VanishingStore {
        inner: SqliteCredentialStore,
    }

    impl CredentialStore for VanishingStore {
        fn create(&self, account: &Account) -> StoreResult<()> {
            self.inner.create(account)
        }
        fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
            self.inner.find_by_email(email)
        }
        fn set_verified(&self, _email: &str) -> StoreResult<usize> {
            Ok(0)
        }
        fn set_password(&self, _email: &str, _password_hash: &str) -> StoreResult<usize> {
            Ok(0)
        }
        fn set_verification_token(&self, email: &str, token: &str) -> StoreResult<usize> {
            self.inner.set_verification_token(email, token)
        }
    }

    #[tokio::test]
    async fn test_zero_rows_affected_is_persistence_failure() {
        let store = VanishingStore {
            inner: SqliteCredentialStore::new(Database::in_memory().unwrap()),
        };
        let h = harness_with_store(Arc::new(store));
        h.service.register(alice()).await.unwrap();

        assert_matches!(
            h.service.verify_email(&last_token(&h.outbox)),
            Err(StorefrontError::PersistenceFailed)
        );

        h.service.forgot_password("alice@example.com").await.unwrap();
        assert_matches!(
            h.service
                .reset_password(&last_token(&h.outbox), &json!("brandnewpass1")),
            Err(StorefrontError::PersistenceFailed)
        );
    }
}
