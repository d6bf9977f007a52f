//! Service-wide constants for Ratecast.

// ═══════════════════════════════════════════════════════════════════════════════
// SUBSCRIPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Addresses of this many bytes or more are rejected.
pub const MAX_EMAIL_LEN: usize = 512;

// ═══════════════════════════════════════════════════════════════════════════════
// BROADCAST
// ═══════════════════════════════════════════════════════════════════════════════

/// Subject line of the rate broadcast.
pub const RATE_EMAIL_SUBJECT: &str = "Bitcoin rate";

/// Renders the body of the rate broadcast.
///
/// `f64`'s `Display` never switches to exponent notation and drops a zero
/// fraction, so `42.0` renders as `42`.
pub fn rate_email_body(rate: f64) -> String {
    format!("Bitcoin rate is {} USD", rate)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default listen address of the HTTP server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default location of the subscriber log.
pub const DEFAULT_SUBSCRIBERS_PATH: &str = "data/subscribers.txt";

/// Default CoinGecko API root.
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com";
