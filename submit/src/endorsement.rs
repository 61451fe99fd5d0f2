//! Responses collected for a single proposal.

use crate::{Error, SUCCESS};
use bytes::Bytes;
use ledger_protos::{
    common::{ChannelHeader, Header},
    peer::{Proposal, ProposalResponse},
    Message,
};

/// A target that could not produce a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub target: String,
    pub message: String,
}

/// Every response (and transport failure) collected for a proposal, in arrival order.
///
/// Once handed out by [crate::Proposal], an [Endorsement] is never modified, so it may be shared
/// by any number of [crate::Commit]s.
#[derive(Clone, Debug)]
pub struct Endorsement {
    transaction_id: String,
    proposal: Proposal,
    header: Header,
    responses: Vec<ProposalResponse>,
    failures: Vec<Failure>,
}

impl Endorsement {
    /// Create a record for `proposal` holding `responses`.
    ///
    /// Fails if the proposal header cannot be decoded.
    pub fn new(proposal: Proposal, responses: Vec<ProposalResponse>) -> Result<Self, Error> {
        let header = Header::decode(proposal.header.clone())?;
        let channel_header = ChannelHeader::decode(header.channel_header.clone())?;
        Ok(Self {
            transaction_id: channel_header.tx_id,
            proposal,
            header,
            responses,
            failures: Vec::new(),
        })
    }

    pub(crate) fn record(&mut self, response: ProposalResponse) {
        self.responses.push(response);
    }

    pub(crate) fn record_failure(&mut self, target: &str, message: String) {
        self.failures.push(Failure {
            target: target.to_string(),
            message,
        });
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// The proposal every response was produced for.
    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    /// The decoded header shared by the proposal and every response.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn responses(&self) -> &[ProposalResponse] {
        &self.responses
    }

    /// Targets that could not be reached.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Returns true if no responses were collected.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Responses reporting [SUCCESS].
    pub fn successful(&self) -> impl Iterator<Item = &ProposalResponse> {
        self.responses.iter().filter(|response| is_success(response))
    }

    /// Responses reporting anything other than [SUCCESS].
    pub fn failed(&self) -> impl Iterator<Item = &ProposalResponse> {
        self.responses.iter().filter(|response| !is_success(response))
    }

    /// Returns true if every successful response carries the same payload.
    ///
    /// Endorsers that disagree on the simulation result produce a transaction that will be
    /// rejected at validation.
    pub fn compare_results(&self) -> bool {
        let mut payloads = self.successful().map(|response| &response.payload);
        let Some(first) = payloads.next() else {
            return false;
        };
        payloads.all(|payload| payload == first)
    }

    /// Payloads returned by the chaincode in successful responses, in arrival order.
    pub fn results(&self) -> Vec<Bytes> {
        self.successful()
            .filter_map(|response| response.response.as_ref())
            .map(|response| response.payload.clone())
            .collect()
    }
}

fn is_success(response: &ProposalResponse) -> bool {
    response
        .response
        .as_ref()
        .is_some_and(|response| response.status == SUCCESS)
}
