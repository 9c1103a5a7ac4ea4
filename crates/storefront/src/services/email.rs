//! Email delivery for one-time passcodes.
//!
//! Uses SMTP via lettre. The service is only built when SMTP is configured.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use elegance_core::{Email, OtpPurpose};

use crate::config::SmtpConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a one-time passcode.
    ///
    /// # Errors
    ///
    /// Returns error if the message can't be built or delivered.
    pub async fn send_otp(
        &self,
        to: &Email,
        code: &str,
        purpose: OtpPurpose,
        ttl_minutes: i64,
    ) -> Result<(), EmailError> {
        let (subject, body) = otp_message(code, purpose, ttl_minutes);

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(message).await?;

        tracing::info!(to = %to, purpose = ?purpose, "Passcode email sent");
        Ok(())
    }
}

fn otp_message(code: &str, purpose: OtpPurpose, ttl_minutes: i64) -> (&'static str, String) {
    let subject = match purpose {
        OtpPurpose::Login => "Your Elegance sign-in code",
        OtpPurpose::Signup => "Verify your email for Elegance",
    };
    let body = format!(
        "Your verification code is {code}.\n\nIt expires in {ttl_minutes} minutes. \
         If you didn't request it, you can ignore this email.\n"
    );
    (subject, body)
}
