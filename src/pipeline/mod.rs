//! Latest-request-wins fetch pipeline, split into focused submodules.
//!
//! - [`endpoint`] - Base URL + query string assembly
//! - [`fetch`] - Issuing JSON and raw-body requests, classifying responses and token-gated delivery

mod endpoint;
mod fetch;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use endpoint::build_url;
pub use fetch::FetchHandle;

use crate::config::FetchConfig;
use crate::error::Result;
use crate::token::{LatestSlot, RequestToken};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Issues JSON GET requests and delivers only the newest request's result
///
/// Cloning is cheap; clones share the same latest-request slot, so a fetch on
/// any clone supersedes in-flight fetches on every other clone.
///
/// # Example
///
/// ```no_run
/// use query_fetch::{FetchConfig, FetchPipeline, FieldPath, Query};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = FetchPipeline::new(FetchConfig::default())?;
///
///     let query = Query::new()
///         .param("method", "flickr.galleries.getPhotos")
///         .param("gallery_id", "66911286-72157647263150569")
///         .param("extras", "url_m")
///         .param("format", "json")
///         .param("nojsoncallback", 1);
///     let path: FieldPath = "photos.photo[?].url_m".parse()?;
///
///     let handle = pipeline.fetch(
///         "https://api.flickr.com/services/rest/",
///         &query,
///         path,
///         |result| match result {
///             Ok(url) => println!("photo: {url}"),
///             Err(e) => eprintln!("fetch failed: {e}"),
///         },
///     );
///
///     println!("{:?}", handle.join().await?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FetchPipeline {
    config: Arc<FetchConfig>,
    transport: Arc<dyn HttpTransport>,
    slot: Arc<LatestSlot>,
    event_tx: broadcast::Sender<Event>,
}

impl FetchPipeline {
    /// Create a pipeline backed by [`ReqwestTransport`]
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a pipeline that sends requests through `transport`
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn with_transport(config: FetchConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(config.event_capacity);

        tracing::debug!(
            timeout_ms = config.request_timeout.as_millis(),
            retries = config.retry.max_attempts,
            "Fetch pipeline created"
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
            slot: Arc::new(LatestSlot::new()),
            event_tx,
        })
    }

    /// Subscribe to lifecycle events
    ///
    /// Each subscriber receives every event independently. A subscriber that
    /// falls behind by more than `event_capacity` events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The most recently issued token, if any fetch has been made
    pub fn current_token(&self) -> Option<RequestToken> {
        self.slot.current()
    }

    /// Whether `token` still belongs to the most recent fetch
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.slot.is_current(token)
    }

    /// Get the configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Emit an event to all subscribers; dropped silently when nobody listens
    fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for FetchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPipeline")
            .field("config", &self.config)
            .field("current", &self.slot.current())
            .finish_non_exhaustive()
    }
}
