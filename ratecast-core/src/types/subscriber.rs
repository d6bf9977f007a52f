//! Subscriber types.

use std::fmt;
use std::str::FromStr;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_EMAIL_LEN;
use crate::error::{RatecastError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// EMAIL ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A subscriber address that passed validation.
///
/// The raw input is kept verbatim (no trimming or case folding), because the
/// registry stores exactly what was subscribed. Anything RFC 5322 accepts as
/// a single mailbox is valid, including the `Name <user@host>` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates `raw` as a subscriber address.
    ///
    /// # Errors
    /// [`RatecastError::ValidationError`] if the input is empty, is
    /// [`MAX_EMAIL_LEN`] bytes or longer, or does not parse as a mailbox.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(RatecastError::ValidationError("Email is required".into()));
        }
        if raw.len() >= MAX_EMAIL_LEN {
            return Err(RatecastError::ValidationError(format!(
                "Email cannot be longer than {} characters",
                MAX_EMAIL_LEN
            )));
        }
        if raw.contains(['\r', '\n']) {
            return Err(RatecastError::ValidationError("Invalid email address".into()));
        }
        Mailbox::from_str(raw)
            .map_err(|_| RatecastError::ValidationError("Invalid email address".into()))?;

        Ok(Self(raw.to_string()))
    }

    /// Returns the address as subscribed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = RatecastError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPEND OUTCOME
// ═══════════════════════════════════════════════════════════════════════════════

/// What the registry found when an append was processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Appended {
    /// First time this address was accepted.
    New,
    /// The address was already a member.
    Existing,
}

impl Appended {
    /// Returns true if the address was already a member.
    pub fn existed(self) -> bool {
        matches!(self, Appended::Existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("foo@mail.com" ; "plain address")]
    #[test_case("bar@my.notmail.org" ; "subdomain")]
    #[test_case("Foo Bar <foo@mail.com>" ; "display name")]
    fn test_valid_addresses(raw: &str) {
        let email = EmailAddress::parse(raw).unwrap();
        assert_eq!(email.as_str(), raw);
    }

    #[test_case("" ; "empty")]
    #[test_case("not-an-email" ; "missing at sign")]
    #[test_case("foo@" ; "missing domain")]
    #[test_case("foo@mail.com\nbar@mail.com" ; "embedded newline")]
    fn test_invalid_addresses(raw: &str) {
        let err = EmailAddress::parse(raw).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_length_limit() {
        let domain = "@mail.com";
        let at_limit = format!("{}{}", "a".repeat(MAX_EMAIL_LEN - domain.len()), domain);
        assert_eq!(at_limit.len(), MAX_EMAIL_LEN);
        assert!(EmailAddress::parse(&at_limit).is_err());

        let under_limit = format!("{}{}", "a".repeat(MAX_EMAIL_LEN - 1 - domain.len()), domain);
        let err = EmailAddress::parse(&under_limit).err();
        // Local parts over 64 octets may still be rejected by the mailbox parser,
        // but never with the length message.
        if let Some(err) = err {
            assert!(!err.to_string().contains("longer than"));
        }
    }

    #[test]
    fn test_serde_validates() {
        let ok: EmailAddress = serde_json::from_str("\"foo@mail.com\"").unwrap();
        assert_eq!(ok.to_string(), "foo@mail.com");
        assert!(serde_json::from_str::<EmailAddress>("\"nope\"").is_err());
    }

    #[test]
    fn test_appended_existed() {
        assert!(Appended::Existing.existed());
        assert!(!Appended::New.existed());
    }
}
