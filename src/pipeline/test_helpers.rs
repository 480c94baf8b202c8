//! Shared test helpers: a scripted transport with controllable completion order.

use crate::config::FetchConfig;
use crate::error::{Error, Result, TransportError};
use crate::pipeline::FetchPipeline;
use crate::transport::{HttpResponse, HttpTransport};
use crate::types::FetchResult;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use url::Url;

pub(crate) const BASE: &str = "http://api.test/services/rest/";

/// One scripted reply, optionally held back until its gate is released
struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    reply: Result<HttpResponse>,
}

/// Transport that answers from per-URL scripts
///
/// Replies are keyed by full URL so concurrently spawned requests pick up the
/// right script regardless of which task reaches the transport first.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, url: &str, gate: Option<oneshot::Receiver<()>>, reply: Result<HttpResponse>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Scripted { gate, reply });
    }

    /// Reply immediately
    pub(crate) fn reply(&self, url: &str, status: u16, body: &str) {
        self.push(url, None, Ok(HttpResponse::new(status, body)));
    }

    /// Reply once the returned sender fires (or is dropped)
    pub(crate) fn reply_gated(&self, url: &str, status: u16, body: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(url, Some(rx), Ok(HttpResponse::new(status, body)));
        tx
    }

    /// Never reply
    pub(crate) fn hang(&self, url: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            url,
            Some(rx),
            Err(TransportError::Other {
                url: url.to_string(),
                reason: "released a hanging request".to_string(),
            }
            .into()),
        );
        tx
    }

    /// Fail with a transport error
    pub(crate) fn fail(&self, url: &str, error: Error) {
        self.push(url, None, Err(error));
    }

    /// URLs requested so far, in arrival order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url.as_str())
            .and_then(VecDeque::pop_front);

        let Some(Scripted { gate, reply }) = scripted else {
            return Err(TransportError::Other {
                url: url.to_string(),
                reason: "no scripted reply".to_string(),
            }
            .into());
        };

        if let Some(gate) = gate {
            gate.await.ok();
        }
        reply
    }
}

/// Full URL for a request with a single `page` parameter
pub(crate) fn page_url(page: u32) -> String {
    format!("{BASE}?page={page}")
}

pub(crate) fn create_test_pipeline(
    config: FetchConfig,
) -> (FetchPipeline, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new();
    let pipeline = FetchPipeline::with_transport(config, transport.clone()).unwrap();
    (pipeline, transport)
}

/// Callback results, tagged with a label per fetch
pub(crate) struct Deliveries {
    tx: mpsc::UnboundedSender<(&'static str, FetchResult)>,
    rx: mpsc::UnboundedReceiver<(&'static str, FetchResult)>,
}

impl Deliveries {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Callback that records its result under `label`
    pub(crate) fn callback(&self, label: &'static str) -> impl FnOnce(FetchResult) + Send + 'static {
        let tx = self.tx.clone();
        move |result| {
            tx.send((label, result)).ok();
        }
    }

    /// Everything delivered so far
    pub(crate) fn drain(&mut self) -> Vec<(&'static str, FetchResult)> {
        let mut out = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            out.push(item);
        }
        out
    }
}
