use super::Error;
use ledger_protos::{
    common::{Envelope, Status},
    orderer::BroadcastResponse,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// A mock [crate::Committer] that replies with a fixed status.
#[derive(Clone)]
pub struct Committer {
    name: String,
    status: Status,
    info: String,
    reachable: bool,
    latency: Option<Duration>,

    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Envelope>>>,
}

impl Committer {
    /// Create a committer that replies with `status` and `info`.
    pub fn new(name: &str, status: Status, info: &str) -> Self {
        Self {
            name: name.to_string(),
            status,
            info: info.to_string(),
            reachable: true,
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a committer that can never be reached.
    pub fn unreachable(name: &str) -> Self {
        Self {
            reachable: false,
            ..Self::new(name, Status::Unknown, "")
        }
    }

    /// Time out any broadcast that waits less than `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of envelopes received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every envelope received, in order.
    pub fn received(&self) -> Vec<Envelope> {
        self.received.lock().unwrap().clone()
    }
}

impl crate::Committer for Committer {
    type Error = Error;

    fn name(&self) -> &str {
        &self.name
    }

    async fn broadcast(
        &self,
        envelope: Envelope,
        timeout: Option<Duration>,
    ) -> Result<BroadcastResponse, Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.received.lock().unwrap().push(envelope);
        if !self.reachable {
            return Err(Error::Unreachable(self.name.clone()));
        }
        if let (Some(timeout), Some(latency)) = (timeout, self.latency) {
            if timeout < latency {
                return Err(Error::Timeout(self.name.clone()));
            }
        }
        Ok(BroadcastResponse {
            status: self.status as i32,
            info: self.info.clone(),
        })
    }
}
