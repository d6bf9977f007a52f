//! SMTP mailer implementation.

use std::str::FromStr;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use ratecast_core::error::{RatecastError, Result};
use ratecast_core::traits::MailGateway;

/// SMTP connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host name
    pub host: String,
    /// Relay port
    pub port: u16,
    /// Login for PLAIN auth; empty disables authentication
    pub username: String,
    /// Password for PLAIN auth
    pub password: String,
    /// Sender mailbox, e.g. `Rates <rates@example.com>`
    pub from: String,
    /// Implicit TLS (SMTPS) instead of STARTTLS
    pub ssl: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            ssl: false,
        }
    }
}

/// Mail gateway backed by an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport. No connection is made until the first send.
    ///
    /// # Errors
    /// [`RatecastError::ConfigError`] if `from` is not a valid mailbox or the
    /// relay parameters are rejected.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from = Mailbox::from_str(&config.from).map_err(|e| {
            RatecastError::ConfigError(format!("Invalid sender address '{}': {}", config.from, e))
        })?;

        let builder = if config.ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| RatecastError::ConfigError(format!("Invalid SMTP relay '{}': {}", config.host, e)))?
        .port(config.port);

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
                .authentication(vec![Mechanism::Plain])
        };

        info!(
            host = %config.host,
            port = config.port,
            ssl = config.ssl,
            "SMTP mailer configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailGateway for SmtpMailer {
    #[instrument(skip_all, fields(recipients = recipients.len(), subject = %subject))]
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        let messages = build_messages(&self.from, recipients, subject, body)?;

        for message in messages {
            self.transport
                .send(message)
                .await
                .map_err(|e| RatecastError::MailGatewayError(e.to_string()))?;
        }

        debug!("All messages handed to the relay");
        Ok(())
    }
}

/// Builds one message per recipient, skipping addresses that do not parse.
fn build_messages(
    from: &Mailbox,
    recipients: &[String],
    subject: &str,
    body: &str,
) -> Result<Vec<Message>> {
    let mut messages = Vec::with_capacity(recipients.len());

    for recipient in recipients {
        let to = match Mailbox::from_str(recipient) {
            Ok(to) => to,
            Err(e) => {
                warn!(recipient = %recipient, error = %e, "Invalid email address");
                continue;
            }
        };

        let message = Message::builder()
            .from(from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| RatecastError::MailGatewayError(e.to_string()))?;

        messages.push(message);
    }

    Ok(messages)
}
