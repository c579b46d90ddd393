/// Email service for password-reset OTP mails
use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use crate::services::auth::OTP_TTL_MINUTES;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl EmailService {
    /// Build email service from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only).
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| AppError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Mailer that never sends; used by tests and local runs
    pub fn disabled() -> Result<Self> {
        Self::new(&EmailConfig {
            smtp_from: "PlayTube <no-reply@playtube.dev>".to_string(),
            ..Default::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the password-reset OTP
    pub async fn send_otp_email(&self, recipient: &str, user_name: &str, otp: &str) -> Result<()> {
        let subject = "Your PlayTube password reset code";
        let body = format!(
            "Hi {user_name},\n\nYour password reset code is {otp}.\n\
             It expires in {OTP_TTL_MINUTES} minutes.\n\n\
             If you did not request a reset, you can ignore this email."
        );
        self.send_mail(recipient, subject, &body).await
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if let Some(transport) = &self.transport {
            let to = recipient
                .parse::<Mailbox>()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient email address: {}", e)))?;

            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject)
                .header(header::ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

            transport
                .send(email)
                .await
                .map_err(|e| AppError::Upstream(format!("Failed to send email: {}", e)))?;
            info!(subject, "email sent successfully");
        } else {
            info!(
                subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_host_means_no_op() {
        let config = EmailConfig {
            smtp_from: "PlayTube <no-reply@playtube.dev>".into(),
            ..Default::default()
        };
        let service = EmailService::new(&config).unwrap();
        assert!(!service.is_enabled());
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let config = EmailConfig {
            smtp_from: "not an address".into(),
            ..Default::default()
        };
        assert!(EmailService::new(&config).is_err());
    }

    #[actix_rt::test]
    async fn no_op_mode_accepts_sends() {
        let service = EmailService::disabled().unwrap();
        service
            .send_otp_email("viewer@example.com", "viewer", "1234")
            .await
            .unwrap();
    }
}
