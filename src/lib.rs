//! # query-fetch
//!
//! Asynchronous JSON fetching with latest-request-wins delivery.
//!
//! ## Design Philosophy
//!
//! query-fetch is designed to be:
//! - **Non-blocking** - `fetch` returns a handle immediately; results arrive through a callback
//! - **Latest wins** - Issuing a fetch supersedes every fetch issued before it
//! - **Typed failures** - Every failure reaches the callback as an [`Error`] with a stable [`ErrorKind`]
//! - **Event-driven** - Consumers may subscribe to lifecycle events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use query_fetch::{FetchConfig, FetchPipeline, Query};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = FetchPipeline::new(FetchConfig::default())?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let query = Query::new()
//!         .param("method", "flickr.galleries.getPhotos")
//!         .param("format", "json")
//!         .param("nojsoncallback", 1);
//!
//!     let handle = pipeline.fetch(
//!         "https://api.flickr.com/services/rest/",
//!         &query,
//!         ["photos", "photo"],
//!         |result| println!("{result:?}"),
//!     );
//!     handle.join().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Field paths into decoded JSON documents
pub mod field_path;
/// Fetch pipeline (decomposed into focused submodules)
pub mod pipeline;
/// Query-string encoding
pub mod query;
/// Retry logic with exponential backoff
pub mod retry;
/// Request tokens and the latest-request slot
pub mod token;
/// HTTP transport abstraction
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{FetchConfig, RetryConfig};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use field_path::{FieldPath, FieldPathError, FieldPathErrorKind, ParseFieldPathError, Segment};
pub use pipeline::{FetchHandle, FetchPipeline};
pub use query::{ParamValue, Parameter, Query, decode_query, encode_query};
pub use token::{LatestSlot, RequestToken};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{Delivery, Event, FetchResult};
