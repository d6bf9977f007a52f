//! App state: registry, rate source, mail gateway.

use std::sync::Arc;

use ratecast_core::traits::{MailGateway, RateSource, SubscriberRegistry};

/// Collaborators shared by every handler.
///
/// Constructed once by the caller and injected into the router; handlers
/// never reach for globals.
#[derive(Clone)]
pub struct AppState {
    /// Durable subscriber list
    pub registry: Arc<dyn SubscriberRegistry>,
    /// BTC/USD price lookup
    pub rates: Arc<dyn RateSource>,
    /// Outbound mail
    pub mailer: Arc<dyn MailGateway>,
}

impl AppState {
    /// Bundles the collaborators.
    pub fn new(
        registry: Arc<dyn SubscriberRegistry>,
        rates: Arc<dyn RateSource>,
        mailer: Arc<dyn MailGateway>,
    ) -> Self {
        Self {
            registry,
            rates,
            mailer,
        }
    }
}
