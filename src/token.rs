//! Request tokens and the latest-request slot
//!
//! Every `fetch` mints a [`RequestToken`] from a shared [`LatestSlot`]. Minting
//! also makes the new token current, which supersedes every earlier token in one
//! atomic step. A completion may deliver its result only while its token is still
//! current.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for one fetch invocation
///
/// Tokens issued by the same slot are strictly increasing. `0` is never issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Get the inner counter value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<RequestToken> for u64 {
    fn from(token: RequestToken) -> Self {
        token.0
    }
}

/// The single "current request" slot shared by all in-flight fetches
///
/// Lock-free: `issue` is a `fetch_add` and `is_current` a load, both with
/// acquire/release ordering so a completion on another thread observes every
/// issuance that happened before it.
#[derive(Debug, Default)]
pub struct LatestSlot {
    /// Counter value of the most recently issued token (0 = none yet)
    current: AtomicU64,
}

impl LatestSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new token and make it current
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `token` is still the most recently issued token
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current.load(Ordering::Acquire) == token.0
    }

    /// The most recently issued token, if any
    pub fn current(&self) -> Option<RequestToken> {
        match self.current.load(Ordering::Acquire) {
            0 => None,
            n => Some(RequestToken(n)),
        }
    }
}
