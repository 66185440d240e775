//! Single-use `k1` tokens of pending withdrawals.

use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct PendingWithdrawal {
    username: String,
    expires_at: Instant,
}

/// Concurrent store of issued `k1` tokens.
///
/// A token is valid for one callback within its time-to-live.
#[derive(Debug)]
pub struct K1Store {
    ttl: Duration,
    pending: DashMap<String, PendingWithdrawal>,
}

impl K1Store {
    /// Creates an empty store whose tokens live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: DashMap::new(),
        }
    }

    /// Records `k1` as issued to `username`.
    pub fn issue(&self, k1: impl Into<String>, username: impl Into<String>) {
        self.pending.insert(
            k1.into(),
            PendingWithdrawal {
                username: username.into(),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Removes `k1` and returns the username it was issued to.
    ///
    /// Returns `None` for unknown, already used or expired tokens.
    pub fn consume(&self, k1: &str) -> Option<String> {
        let (_, pending) = self.pending.remove(k1)?;
        (Instant::now() < pending.expires_at).then_some(pending.username)
    }

    /// Drops expired tokens and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.pending.len();
        self.pending.retain(|_, pending| now < pending.expires_at);
        before.saturating_sub(self.pending.len())
    }

    /// Number of outstanding tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no token is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
