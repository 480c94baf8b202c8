//! Core types and events for query-fetch

use crate::error::{ErrorKind, Result};
use crate::token::RequestToken;
use serde::{Deserialize, Serialize};

/// Outcome handed to the consumer callback: `Ok` on success, `Err` on failure
pub type FetchResult<T = serde_json::Value> = Result<T>;

/// Terminal state of a fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// The token was still current; the callback ran exactly once
    Delivered,
    /// A newer fetch superseded this one; the callback never ran
    Dropped,
}

impl Delivery {
    /// Whether the callback was invoked
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Lifecycle events emitted by [`FetchPipeline`](crate::FetchPipeline)
///
/// Events are broadcast; subscribers that lag behind lose the oldest events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A fetch was issued and its token became current
    Issued {
        /// The new token
        token: RequestToken,
        /// The assembled URL (None if it could not be built)
        url: Option<String>,
    },

    /// A request is being retried after a transient failure
    Retrying {
        /// The request's token
        token: RequestToken,
        /// Attempt number about to start (1 = first retry)
        attempt: u32,
    },

    /// The callback ran for this fetch
    Delivered {
        /// The request's token
        token: RequestToken,
        /// Failure class, or None on success
        error: Option<ErrorKind>,
    },

    /// The result was discarded because a newer fetch superseded it
    Dropped {
        /// The superseded token
        token: RequestToken,
    },
}

impl Event {
    /// Token the event refers to
    pub fn token(&self) -> RequestToken {
        match self {
            Event::Issued { token, .. }
            | Event::Retrying { token, .. }
            | Event::Delivered { token, .. }
            | Event::Dropped { token } => *token,
        }
    }
}
