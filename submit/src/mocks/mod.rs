//! Mock implementations for testing.

use crate::{Channel, Config, SUCCESS};
use bytes::Bytes;
use ledger_protos::{
    common::{ChannelHeader, Header, HeaderType, SignatureHeader},
    peer::{self, ChaincodeAction, ProposalResponse, ProposalResponsePayload, Response},
    Message,
};
use prometheus_client::registry::Registry;
use sha2::{Digest, Sha256};
use thiserror::Error;

mod committer;
pub use committer::Committer;
mod endorser;
pub use endorser::Endorser;
mod handler;
pub use handler::Handler;
mod identity;
pub use identity::Identity;

/// Errors returned by mock targets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("signing rejected")]
    Signing,
    #[error("handler rejected")]
    Handler,
}

/// Create a [Channel] with a throwaway metrics registry.
pub fn channel(
    name: &str,
    endorsers: Vec<Endorser>,
    committers: Vec<Committer>,
) -> Channel<Endorser, Committer> {
    let mut registry = Registry::default();
    Channel::new(
        &mut registry,
        Config {
            name: name.to_string(),
            endorsers,
            committers,
        },
    )
}

/// Create an unsigned proposal for `tx_id` on `channel`.
pub fn proposal(channel: &str, tx_id: &str) -> peer::Proposal {
    let channel_header = ChannelHeader {
        r#type: HeaderType::EndorserTransaction as i32,
        channel_id: channel.to_string(),
        tx_id: tx_id.to_string(),
        ..Default::default()
    };
    let signature_header = SignatureHeader {
        creator: Bytes::from_static(b"creator"),
        nonce: Bytes::from_static(b"nonce"),
    };
    let header = Header {
        channel_header: channel_header.encode_to_vec().into(),
        signature_header: signature_header.encode_to_vec().into(),
    };
    peer::Proposal {
        header: header.encode_to_vec().into(),
        payload: peer::ChaincodeProposalPayload::default().encode_to_vec().into(),
        extension: Bytes::new(),
    }
}

/// Create the response `endorser` would return for a proposal, reporting `status` and `result`.
pub fn response(endorser: &str, status: i32, result: &[u8]) -> ProposalResponse {
    respond(endorser, status, result, &[])
}

pub(crate) fn respond(
    endorser: &str,
    status: i32,
    result: &[u8],
    proposal: &[u8],
) -> ProposalResponse {
    let result = Bytes::copy_from_slice(result);
    let message = if status == SUCCESS { "" } else { "rejected" };
    let outcome = Response {
        status,
        message: message.to_string(),
        payload: result.clone(),
    };
    let action = ChaincodeAction {
        results: result,
        response: Some(outcome.clone()),
        ..Default::default()
    };
    let payload: Bytes = ProposalResponsePayload {
        proposal_hash: Bytes::copy_from_slice(&Sha256::digest(proposal)),
        extension: action.encode_to_vec().into(),
    }
    .encode_to_vec()
    .into();

    // Endorse whatever was simulated (validation filters on status)
    let mut signed = Vec::with_capacity(endorser.len() + payload.len());
    signed.extend_from_slice(&payload);
    signed.extend_from_slice(endorser.as_bytes());
    let endorsement = peer::Endorsement {
        endorser: Bytes::copy_from_slice(endorser.as_bytes()),
        signature: Bytes::copy_from_slice(&Sha256::digest(&signed)),
    };
    ProposalResponse {
        version: 1,
        timestamp: None,
        response: Some(outcome),
        payload,
        endorsement: Some(endorsement),
    }
}
