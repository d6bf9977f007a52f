//! Error types for Ratecast.
//!
//! One error hierarchy shared by the registry, the collaborators, and the
//! HTTP layer. The HTTP crate decides status codes from the variant.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `RatecastError`.
pub type Result<T> = std::result::Result<T, RatecastError>;

/// Main error type for all Ratecast operations.
#[derive(Debug, Error)]
pub enum RatecastError {
    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed (empty, too long, or malformed address).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The address is already a member of the registry.
    #[error("Already subscribed: {0}")]
    AlreadySubscribed(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The backing file could not be opened or replayed.
    #[error("Failed to load registry from {path}: {source}")]
    RegistryInit {
        /// Backing file location.
        path: PathBuf,
        /// Underlying open or read failure.
        #[source]
        source: std::io::Error,
    },

    /// The durable write failed after the address was accepted in memory.
    #[error("Failed to persist '{email}': {source}")]
    RegistryPersistence {
        /// Address whose line was not written.
        email: String,
        /// Result of the membership check that preceded the write.
        existed: bool,
        /// Underlying write failure.
        #[source]
        source: std::io::Error,
    },

    /// The registry worker has been shut down.
    #[error("Registry is closed")]
    RegistryClosed,

    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The exchange-rate source failed.
    #[error("Rate source error: {0}")]
    RateSourceError(String),

    /// The outbound mail gateway failed.
    #[error("Mail gateway error: {0}")]
    MailGatewayError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION & SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RatecastError {
    /// Returns true if the caller sent something unacceptable (HTTP 400 territory).
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RatecastError::ValidationError(_) | RatecastError::AlreadySubscribed(_)
        )
    }

    /// Returns true if an external collaborator failed.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            RatecastError::RateSourceError(_) | RatecastError::MailGatewayError(_)
        )
    }
}
