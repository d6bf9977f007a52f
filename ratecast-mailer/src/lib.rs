//! SMTP mail gateway for Ratecast.
//!
//! Implements [`ratecast_core::MailGateway`] with `lettre`'s async SMTP
//! transport. Each recipient gets an individual plain-text message.

mod smtp;

pub use smtp::{SmtpConfig, SmtpMailer};
