//! Email sending for verification and password reset

use std::sync::{Arc, Mutex};

use html_escape::{encode_double_quoted_attribute, encode_safe};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::{AppConfig, SmtpSettings};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// The link the recipient is asked to follow
    pub action_url: String,
}

fn verification_mail(frontend_url: &str, to: &str, name: &str, token: &str) -> OutgoingMail {
    let verify_url = format!("{}/auth/verify-email/{}", frontend_url, token);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Verify your email</title></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Welcome, {name}!</h1>
    <p>Please confirm your email address by following the link below:</p>
    <p><a href="{url}">Verify email</a></p>
    <p style="word-break: break-all; color: #666;">{url}</p>
    <p style="color: #999; font-size: 12px;">This link expires in 24 hours.</p>
</body>
</html>"#,
        name = encode_safe(name),
        url = encode_double_quoted_attribute(&verify_url)
    );

    OutgoingMail {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        html,
        action_url: verify_url,
    }
}

fn reset_mail(frontend_url: &str, to: &str, name: &str, token: &str) -> OutgoingMail {
    let reset_url = format!("{}/auth/recovery-password/{}", frontend_url, token);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Reset your password</title></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Password recovery</h1>
    <p>Hi {name},</p>
    <p>We received a request to reset your password. Follow the link below to choose a new one:</p>
    <p><a href="{url}">Reset password</a></p>
    <p style="word-break: break-all; color: #666;">{url}</p>
    <p style="color: #999; font-size: 12px;">If you did not ask for this, you can ignore this email.</p>
</body>
</html>"#,
        name = encode_safe(name),
        url = encode_double_quoted_attribute(&reset_url)
    );

    OutgoingMail {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        html,
        action_url: reset_url,
    }
}

/// SMTP delivery through a STARTTLS relay
pub struct SmtpMailer {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(creds)
            .build();

        Ok(Self {
            from: settings.from.clone(),
            transport,
        })
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(mail.to.parse()?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html.clone())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Logs instead of sending and keeps every message in an outbox.
#[derive(Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    fn send(&self, mail: &OutgoingMail) {
        log::info!(
            "[MOCK EMAIL] '{}' to {}: {}",
            mail.subject,
            mail.to,
            mail.action_url
        );
        match self.outbox.lock() {
            Ok(mut outbox) => outbox.push(mail.clone()),
            Err(_) => log::warn!("Mock outbox lock poisoned, message not recorded"),
        }
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().map(|outbox| outbox.clone()).unwrap_or_default()
    }
}

enum Transport {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

/// Renders auth emails and hands them to SMTP or to the log.
pub struct MailDispatcher {
    frontend_url: String,
    transport: Transport,
}

impl MailDispatcher {
    pub fn smtp(frontend_url: &str, mailer: SmtpMailer) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            transport: Transport::Smtp(mailer),
        }
    }

    pub fn log(frontend_url: &str, mailer: LogMailer) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            transport: Transport::Log(mailer),
        }
    }

    /// SMTP when fully configured, otherwise the logging mailer
    pub fn from_config(config: &AppConfig) -> Self {
        match config.smtp() {
            Some(settings) => match SmtpMailer::new(&settings) {
                Ok(mailer) => {
                    log::info!("Sending mail through {}:{}", settings.host, settings.port);
                    Self::smtp(&config.frontend_url, mailer)
                }
                Err(e) => {
                    log::warn!("Failed to initialize email service: {}. Using mock.", e);
                    Self::log(&config.frontend_url, LogMailer::new())
                }
            },
            None => {
                log::info!("Email not configured. Using mock email service.");
                Self::log(&config.frontend_url, LogMailer::new())
            }
        }
    }

    pub async fn send_verification_email(
        &self,
        to_email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let mail = verification_mail(&self.frontend_url, to_email, name, token);
        self.deliver(&mail).await
    }

    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let mail = reset_mail(&self.frontend_url, to_email, name, token);
        self.deliver(&mail).await
    }

    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        match &self.transport {
            Transport::Smtp(mailer) => mailer.send(mail).await,
            Transport::Log(mailer) => {
                mailer.send(mail);
                Ok(())
            }
        }
    }
}
