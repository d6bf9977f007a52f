//! # Ratecast Core
//!
//! Core types, errors, and traits shared by every Ratecast crate:
//!
//! - **Types**: Validated subscriber addresses and append outcomes
//! - **Errors**: One error hierarchy with HTTP-relevant classification
//! - **Constants**: Limits, broadcast text, and defaults
//! - **Traits**: Registry, rate source, and mail gateway interfaces
//!
//! ## Example
//!
//! ```rust
//! use ratecast_core::EmailAddress;
//!
//! let email = EmailAddress::parse("foo@mail.com").unwrap();
//! assert_eq!(email.as_str(), "foo@mail.com");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, RatecastError};
pub use traits::*;
pub use types::*;
