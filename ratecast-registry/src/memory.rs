//! In-memory membership state.
//!
//! The set half is owned exclusively by the registry worker. The ordered half
//! is shared: the worker pushes under the write lock, readers copy under the
//! read lock, so a reader never sees a half-updated sequence.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

/// Read side of the enumeration order, shared with request handlers.
pub(crate) type SharedOrder = Arc<RwLock<Vec<String>>>;

/// Membership set plus first-accepted enumeration order.
///
/// # Invariant
///
/// `order` holds exactly the elements of `members`, each once, in the order
/// they were first inserted.
#[derive(Debug, Default)]
pub struct MemberSet {
    members: HashSet<String>,
    order: SharedOrder,
}

impl MemberSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from previously accepted addresses, keeping the first
    /// occurrence of each.
    pub fn from_replay<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut set = Self::new();
        for line in lines {
            set.insert(&line);
        }
        set
    }

    /// Inserts `email`, returning true if it was not already a member.
    pub fn insert(&mut self, email: &str) -> bool {
        if self.members.contains(email) {
            return false;
        }
        self.members.insert(email.to_string());
        self.order.write().push(email.to_string());
        true
    }

    /// Exact membership test.
    pub fn contains(&self, email: &str) -> bool {
        self.members.contains(email)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if there are no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Owned copy of the enumeration order.
    pub fn snapshot(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Handle for readers that live outside the worker.
    pub(crate) fn shared_order(&self) -> SharedOrder {
        Arc::clone(&self.order)
    }
}
