use super::{respond, Error};
use ledger_protos::peer::{ProposalResponse, SignedProposal};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// A mock [crate::Endorser] that replies with a fixed status.
///
/// Latency is simulated: if the caller's timeout is shorter than the configured latency, the
/// request times out immediately.
#[derive(Clone)]
pub struct Endorser {
    name: String,
    status: i32,
    result: Vec<u8>,
    reachable: bool,
    latency: Option<Duration>,

    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<SignedProposal>>>,
}

impl Endorser {
    /// Create an endorser that replies with `status`.
    pub fn new(name: &str, status: i32) -> Self {
        Self {
            name: name.to_string(),
            status,
            result: b"result".to_vec(),
            reachable: true,
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an endorser that can never be reached.
    pub fn unreachable(name: &str) -> Self {
        Self {
            reachable: false,
            ..Self::new(name, 0)
        }
    }

    /// Return `result` from the simulated chaincode.
    pub fn with_result(mut self, result: &[u8]) -> Self {
        self.result = result.to_vec();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of proposals received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every proposal received, in order.
    pub fn received(&self) -> Vec<SignedProposal> {
        self.received.lock().unwrap().clone()
    }
}

impl crate::Endorser for Endorser {
    type Error = Error;

    fn name(&self) -> &str {
        &self.name
    }

    async fn process_proposal(
        &self,
        proposal: SignedProposal,
        timeout: Option<Duration>,
    ) -> Result<ProposalResponse, Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.received.lock().unwrap().push(proposal.clone());
        if !self.reachable {
            return Err(Error::Unreachable(self.name.clone()));
        }
        if let (Some(timeout), Some(latency)) = (timeout, self.latency) {
            if timeout < latency {
                return Err(Error::Timeout(self.name.clone()));
            }
        }
        Ok(respond(
            &self.name,
            self.status,
            &self.result,
            &proposal.proposal_bytes,
        ))
    }
}
