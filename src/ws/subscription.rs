//! Per-connection subscription manager.
//!
//! Tracks which users a WebSocket client follows and provides
//! server-side event filtering. A new connection follows everyone.

use std::collections::HashSet;

/// Wildcard user id.
pub const WILDCARD: &str = "*";

/// Manages the set of user subscriptions for a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    /// Followed user IDs. Ignored while `subscribe_all` is set.
    user_ids: HashSet<String>,
    /// Whether the client follows every user.
    subscribe_all: bool,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self {
            user_ids: HashSet::new(),
            subscribe_all: true,
        }
    }
}

impl SubscriptionManager {
    /// Creates a manager that follows every user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows the given users.
    ///
    /// Naming specific users narrows a wildcard subscription to exactly
    /// those users; `"*"` restores the full feed.
    pub fn subscribe(&mut self, ids: &[String]) {
        if ids.iter().any(|id| id == WILDCARD) {
            self.subscribe_all = true;
            self.user_ids.clear();
            return;
        }
        if self.subscribe_all && !ids.is_empty() {
            self.subscribe_all = false;
        }
        self.user_ids.extend(ids.iter().cloned());
    }

    /// Stops following the given users; `"*"` unfollows everyone.
    pub fn unsubscribe(&mut self, ids: &[String]) {
        if ids.iter().any(|id| id == WILDCARD) {
            self.subscribe_all = false;
            self.user_ids.clear();
            return;
        }
        for id in ids {
            self.user_ids.remove(id);
        }
    }

    /// Returns `true` if events for `user_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, user_id: &str) -> bool {
        self.subscribe_all || self.user_ids.contains(user_id)
    }

    /// Returns the number of explicitly followed users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
