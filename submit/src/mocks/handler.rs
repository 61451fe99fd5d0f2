use super::Error;
use crate::Outcome;
use ledger_protos::{
    common::Envelope,
    peer::{ProposalResponse, SignedProposal},
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Default)]
struct Record {
    proposals: usize,
    envelopes: usize,
    targets: Vec<Vec<String>>,
}

/// A mock [crate::Handler] that replies with canned responses and records what it was given.
#[derive(Clone)]
pub struct Handler {
    responses: Vec<ProposalResponse>,
    outcome: Outcome,
    fail: bool,

    record: Arc<Mutex<Record>>,
}

impl Default for Handler {
    fn default() -> Self {
        Self::new(Vec::new(), Outcome::unknown())
    }
}

impl Handler {
    /// Reply to proposals with `responses` and to envelopes with `outcome`.
    pub fn new(responses: Vec<ProposalResponse>, outcome: Outcome) -> Self {
        Self {
            responses,
            outcome,
            fail: false,
            record: Arc::default(),
        }
    }

    /// Create a handler that fails every delivery.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of proposals handled.
    pub fn proposals(&self) -> usize {
        self.record.lock().unwrap().proposals
    }

    /// Number of envelopes handled.
    pub fn envelopes(&self) -> usize {
        self.record.lock().unwrap().envelopes
    }

    /// Targets supplied alongside each message, in order.
    pub fn targets(&self) -> Vec<Vec<String>> {
        self.record.lock().unwrap().targets.clone()
    }
}

impl crate::Handler<SignedProposal> for Handler {
    type Reply = Vec<ProposalResponse>;
    type Error = Error;

    async fn handle(
        &self,
        _: SignedProposal,
        targets: &[String],
        _: Option<Duration>,
    ) -> Result<Self::Reply, Error> {
        {
            let mut record = self.record.lock().unwrap();
            record.proposals += 1;
            record.targets.push(targets.to_vec());
        }
        if self.fail {
            return Err(Error::Handler);
        }
        Ok(self.responses.clone())
    }
}

impl crate::Handler<Envelope> for Handler {
    type Reply = Outcome;
    type Error = Error;

    async fn handle(
        &self,
        _: Envelope,
        targets: &[String],
        _: Option<Duration>,
    ) -> Result<Self::Reply, Error> {
        {
            let mut record = self.record.lock().unwrap();
            record.envelopes += 1;
            record.targets.push(targets.to_vec());
        }
        if self.fail {
            return Err(Error::Handler);
        }
        Ok(self.outcome.clone())
    }
}
