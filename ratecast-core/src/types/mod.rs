//! Domain types for Ratecast.
//!
//! - [`EmailAddress`]: A validated subscriber address
//! - [`Appended`]: Outcome of a registry append

mod subscriber;

pub use subscriber::*;
