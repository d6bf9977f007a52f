//! # Ratecast Registry
//!
//! The durable subscriber list behind `POST /subscribe` and the rate
//! broadcast.
//!
//! - **Memory**: [`MemberSet`], the membership set plus enumeration order
//! - **File**: [`FileRegistry`], an append-only text log with a single
//!   serialization worker in front of it
//!
//! ## Example
//!
//! ```rust,ignore
//! use ratecast_registry::{Appended, FileRegistry};
//!
//! let registry = FileRegistry::open("data/subscribers.txt").await?;
//!
//! assert_eq!(registry.append("foo@mail.com").await?, Appended::New);
//! assert_eq!(registry.append("foo@mail.com").await?, Appended::Existing);
//! assert_eq!(registry.list(), vec!["foo@mail.com"]);
//!
//! registry.close().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
mod file;

pub use memory::MemberSet;
pub use file::{FileRegistry, RegistryOptions};

// Re-export the trait and outcome from core
pub use ratecast_core::traits::SubscriberRegistry as Registry;
pub use ratecast_core::types::Appended;
