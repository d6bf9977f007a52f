//! Common traits for Ratecast.
//!
//! The HTTP layer only talks to these interfaces, so handlers can be
//! exercised against stubs and the real collaborators can be swapped freely.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Appended;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the durable, deduplicating subscriber store.
#[async_trait]
pub trait SubscriberRegistry: Send + Sync {
    /// Records `email`, reporting whether it was already a member.
    ///
    /// Mutations are serialized: for concurrent calls with the same address
    /// exactly one observes [`Appended::New`].
    async fn append(&self, email: &str) -> Result<Appended>;

    /// Returns an owned snapshot of all members in first-accepted order.
    fn list(&self) -> Vec<String>;

    /// Number of members.
    fn len(&self) -> usize {
        self.list().len()
    }

    /// Returns true if there are no members.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops accepting appends and releases the backing storage.
    async fn close(&self) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATOR TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the exchange-rate lookup.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the current BTC price in USD.
    async fn fetch_rate(&self) -> Result<f64>;
}

/// Interface for outbound mail.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Sends the same plain-text message to every recipient.
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRate(f64);

    #[async_trait]
    impl RateSource for FixedRate {
        async fn fetch_rate(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_rate_source_object_safety() {
        let source: Box<dyn RateSource> = Box::new(FixedRate(42.0));
        assert_eq!(source.fetch_rate().await.unwrap(), 42.0);
    }
}
