//! Collecting callback results across spawned fetches

use query_fetch::FetchResult;
use std::time::Duration;
use tokio::sync::mpsc;

/// Callback results tagged with the label of the fetch that produced them
pub struct Collector {
    tx: mpsc::UnboundedSender<(&'static str, FetchResult)>,
    rx: mpsc::UnboundedReceiver<(&'static str, FetchResult)>,
}

impl Collector {
    /// Create an empty collector
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Callback recording its result under `label`
    pub fn callback(&self, label: &'static str) -> impl FnOnce(FetchResult) + Send + 'static {
        let tx = self.tx.clone();
        move |result| {
            tx.send((label, result)).ok();
        }
    }

    /// Wait for the next delivered result
    ///
    /// # Returns
    /// `None` if nothing arrives within `timeout`
    pub async fn next(&mut self, timeout: Duration) -> Option<(&'static str, FetchResult)> {
        tokio::time::timeout(timeout, self.rx.recv()).await.ok().flatten()
    }

    /// Everything delivered so far, without waiting
    pub fn drain(&mut self) -> Vec<(&'static str, FetchResult)> {
        let mut out = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            out.push(item);
        }
        out
    }
}

/// Labels of everything delivered so far
pub fn delivered_labels(collector: &mut Collector) -> Vec<&'static str> {
    collector.drain().into_iter().map(|(label, _)| label).collect()
}
