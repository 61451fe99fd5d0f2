//! Proposals, endorsements, and the transaction structure committed to the ledger.

use bytes::Bytes;
use std::collections::BTreeMap;

/// Language a chaincode is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChaincodeType {
    Undefined = 0,
    Golang = 1,
    Node = 2,
    Car = 3,
    Java = 4,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeId {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub version: String,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
    #[prost(btree_map = "string, bytes", tag = "2")]
    pub decorations: BTreeMap<String, Vec<u8>>,
    #[prost(bool, tag = "3")]
    pub is_init: bool,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeSpec {
    #[prost(enumeration = "ChaincodeType", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
    #[prost(int32, tag = "4")]
    pub timeout: i32,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeInvocationSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
}

/// Carried in the `extension` of an endorser transaction's channel header.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeHeaderExtension {
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
}

/// Invocation input plus data only visible to endorsers.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeProposalPayload {
    /// Serialized [ChaincodeInvocationSpec].
    #[prost(bytes = "bytes", tag = "1")]
    pub input: Bytes,
    /// Private inputs for the chaincode. Never part of a committed transaction.
    #[prost(btree_map = "string, bytes", tag = "2")]
    pub transient_map: BTreeMap<String, Vec<u8>>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Proposal {
    /// Serialized [crate::common::Header].
    #[prost(bytes = "bytes", tag = "1")]
    pub header: Bytes,
    /// Serialized [ChaincodeProposalPayload].
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
    #[prost(bytes = "bytes", tag = "3")]
    pub extension: Bytes,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SignedProposal {
    #[prost(bytes = "bytes", tag = "1")]
    pub proposal_bytes: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

/// Result of executing a chaincode.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Response {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "bytes", tag = "3")]
    pub payload: Bytes,
}

/// An endorser's signature over a proposal response payload.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Endorsement {
    /// Serialized identity of the endorser.
    #[prost(bytes = "bytes", tag = "1")]
    pub endorser: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ProposalResponse {
    #[prost(int32, tag = "1")]
    pub version: i32,
    #[prost(message, optional, tag = "2")]
    pub timestamp: Option<crate::common::Timestamp>,
    #[prost(message, optional, tag = "4")]
    pub response: Option<Response>,
    /// Serialized [ProposalResponsePayload].
    #[prost(bytes = "bytes", tag = "5")]
    pub payload: Bytes,
    #[prost(message, optional, tag = "6")]
    pub endorsement: Option<Endorsement>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ProposalResponsePayload {
    #[prost(bytes = "bytes", tag = "1")]
    pub proposal_hash: Bytes,
    /// Serialized [ChaincodeAction].
    #[prost(bytes = "bytes", tag = "2")]
    pub extension: Bytes,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeAction {
    #[prost(bytes = "bytes", tag = "1")]
    pub results: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub events: Bytes,
    #[prost(message, optional, tag = "3")]
    pub response: Option<Response>,
    #[prost(message, optional, tag = "4")]
    pub chaincode_id: Option<ChaincodeId>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeEndorsedAction {
    #[prost(bytes = "bytes", tag = "1")]
    pub proposal_response_payload: Bytes,
    #[prost(message, repeated, tag = "2")]
    pub endorsements: Vec<Endorsement>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeActionPayload {
    /// Serialized [ChaincodeProposalPayload] with the transient map removed.
    #[prost(bytes = "bytes", tag = "1")]
    pub chaincode_proposal_payload: Bytes,
    #[prost(message, optional, tag = "2")]
    pub action: Option<ChaincodeEndorsedAction>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct TransactionAction {
    /// Serialized [crate::common::SignatureHeader] of the proposal.
    #[prost(bytes = "bytes", tag = "1")]
    pub header: Bytes,
    /// Serialized [ChaincodeActionPayload].
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Transaction {
    #[prost(message, repeated, tag = "1")]
    pub actions: Vec<TransactionAction>,
}
