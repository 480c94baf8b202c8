//! Issuing fetches and token-gated delivery.

use super::FetchPipeline;
use super::endpoint::build_url;
use crate::error::{Error, Result, TransportError};
use crate::field_path::FieldPath;
use crate::query::Parameter;
use crate::retry::retry_while;
use crate::token::RequestToken;
use crate::types::{Delivery, Event, FetchResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};
use url::Url;

/// Handle to an issued fetch
///
/// Dropping the handle does not cancel anything; the request still completes
/// and its result is still delivered or dropped.
#[derive(Debug)]
pub struct FetchHandle {
    token: RequestToken,
    url: Option<String>,
    task: JoinHandle<Delivery>,
}

impl FetchHandle {
    /// Token minted for this fetch
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Request URL, or None when it could not be built
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether the fetch has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal state
    ///
    /// # Errors
    /// Returns the join error if the consumer callback panicked
    pub async fn join(self) -> std::result::Result<Delivery, JoinError> {
        self.task.await
    }
}

impl FetchPipeline {
    /// Issue a request and deliver the value at `field_path` to `on_result`
    ///
    /// Returns immediately. The new request supersedes every fetch issued before
    /// it: their results are discarded without invoking their callbacks. This
    /// request's own callback runs exactly once, unless it is itself superseded
    /// before it completes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch<P, F>(
        &self,
        base_url: &str,
        parameters: P,
        field_path: impl Into<FieldPath>,
        on_result: F,
    ) -> FetchHandle
    where
        P: AsRef<[Parameter]>,
        F: FnOnce(FetchResult) + Send + 'static,
    {
        let field_path = field_path.into();
        self.launch(
            base_url,
            parameters.as_ref(),
            move |pipeline, token, url| async move {
                pipeline.execute(token, &url, &field_path).await
            },
            on_result,
        )
    }

    /// Issue a request and deliver the raw response body to `on_result`
    ///
    /// Shares the latest-request slot with [`fetch`](Self::fetch): a JSON fetch
    /// supersedes a pending bytes fetch and vice versa. Responses are classified
    /// the same way, except that the body is never decoded.
    pub fn fetch_bytes<P, F>(&self, base_url: &str, parameters: P, on_result: F) -> FetchHandle
    where
        P: AsRef<[Parameter]>,
        F: FnOnce(FetchResult<Vec<u8>>) + Send + 'static,
    {
        self.launch(
            base_url,
            parameters.as_ref(),
            |pipeline, token, url| async move { pipeline.fetch_body(token, &url).await },
            on_result,
        )
    }

    /// Mint a token, build the URL and spawn `work` under the token gate
    fn launch<T, W, Fut, F>(
        &self,
        base_url: &str,
        parameters: &[Parameter],
        work: W,
        on_result: F,
    ) -> FetchHandle
    where
        T: Send + 'static,
        W: FnOnce(FetchPipeline, RequestToken, Url) -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
        F: FnOnce(FetchResult<T>) + Send + 'static,
    {
        let token = self.slot.issue();
        let url = build_url(base_url, parameters);
        let url_text = url.as_ref().ok().map(Url::to_string);

        debug!(%token, url = ?url_text, "Fetch issued");
        self.emit_event(Event::Issued {
            token,
            url: url_text.clone(),
        });

        let pipeline = self.clone();
        let task = tokio::spawn(async move {
            let outcome = match url {
                Ok(url) => work(pipeline.clone(), token, url).await,
                Err(e) => Err(e),
            };
            pipeline.deliver(token, outcome, on_result)
        });

        FetchHandle {
            token,
            url: url_text,
            task,
        }
    }

    /// Like [`fetch`](Self::fetch), but deserializes the resolved value into `T`
    ///
    /// A value that does not match `T` is delivered as [`Error::Decode`].
    pub fn fetch_as<T, P, F>(
        &self,
        base_url: &str,
        parameters: P,
        field_path: impl Into<FieldPath>,
        on_result: F,
    ) -> FetchHandle
    where
        T: DeserializeOwned + 'static,
        P: AsRef<[Parameter]>,
        F: FnOnce(FetchResult<T>) + Send + 'static,
    {
        self.fetch(base_url, parameters, field_path, move |result| {
            on_result(result.and_then(|value| serde_json::from_value(value).map_err(Error::from)))
        })
    }

    /// Request, decode and resolve; everything except delivery
    async fn execute(&self, token: RequestToken, url: &Url, field_path: &FieldPath) -> FetchResult {
        let body = self.fetch_body(token, url).await?;
        let document: Value = serde_json::from_slice(&body)?;
        Ok(field_path.resolve(&document)?)
    }

    /// Body of a successful response, with opt-in retries while `token` is current
    async fn fetch_body(&self, token: RequestToken, url: &Url) -> Result<Vec<u8>> {
        retry_while(
            &self.config.retry,
            || self.request(url),
            |attempt| {
                // a superseded request must not keep hitting the network
                if !self.slot.is_current(token) {
                    return false;
                }
                self.emit_event(Event::Retrying { token, attempt });
                true
            },
        )
        .await
    }

    /// One GET, classified into body or failure
    async fn request(&self, url: &Url) -> Result<Vec<u8>> {
        let timeout = self.config.request_timeout;
        let response = tokio::time::timeout(timeout, self.transport.get(url))
            .await
            .map_err(|_| {
                Error::from(TransportError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                })
            })??;

        if !response.is_success() {
            return Err(Error::ResponseStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        if response.body.is_empty() {
            return Err(TransportError::EmptyBody {
                url: url.to_string(),
            }
            .into());
        }

        Ok(response.body)
    }

    /// Hand `outcome` to `on_result` if `token` is still current
    fn deliver<T, F>(&self, token: RequestToken, outcome: FetchResult<T>, on_result: F) -> Delivery
    where
        F: FnOnce(FetchResult<T>),
    {
        if !self.slot.is_current(token) {
            debug!(%token, current = ?self.slot.current(), "Dropping superseded result");
            self.emit_event(Event::Dropped { token });
            return Delivery::Dropped;
        }

        let error = outcome.as_ref().err().map(Error::kind);
        match &outcome {
            Ok(_) => debug!(%token, "Delivering result"),
            Err(e) => warn!(%token, error = %e, kind = %e.kind(), "Delivering failure"),
        }

        on_result(outcome);
        self.emit_event(Event::Delivered { token, error });
        Delivery::Delivered
    }
}
