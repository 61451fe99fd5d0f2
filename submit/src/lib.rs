//! Build, endorse, and commit ledger transactions.
//!
//! # Overview
//!
//! Submitting a transaction happens in two phases, each driven by an [Action]:
//!
//! 1. A [Proposal] is built, signed by an [Identity], and sent to a set of [Endorser]s. Every
//!    response (successful or not) is collected into an [Endorsement].
//! 2. A [Commit] rebuilds the transaction envelope from the [Endorsement] (dropping any
//!    transient data that only endorsers may see), is signed, and is broadcast to a list of
//!    [Committer]s until one accepts it.
//!
//! Network transport and key management are not part of this crate. Callers provide them by
//! implementing [Endorser], [Committer], and [Identity] (or use [identity::Signer]).
//!
//! # Delivery
//!
//! Both phases accept [SendOptions], which resolve to exactly one [Delivery]: either a handler
//! that owns routing (e.g. discovery-based target selection) or an explicit list of target names
//! registered with the [Channel].
//!
//! When broadcasting to explicit targets, the first [Outcome] reporting success (in target order)
//! is returned. If no target succeeds, the outcome of the last target is returned.
//!
//! # Status
//!
//! `ledger-submit` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

use bytes::Bytes;
use ledger_protos::{
    common::Envelope,
    orderer::BroadcastResponse,
    peer::{ProposalResponse, SignedProposal},
};
use std::{convert::Infallible, future::Future, time::Duration};
use thiserror::Error;

pub mod action;
pub use action::{Action, Base, Delivery, SendOptions, State};
pub mod broadcast;
pub use broadcast::{Outcome, Strategy};
pub mod channel;
pub use channel::{Channel, Config};
pub mod commit;
pub use commit::Commit;
pub mod endorsement;
pub use endorsement::Endorsement;
pub mod identity;
mod metrics;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod proposal;
pub use proposal::{Proposal, Request};
pub mod query;
pub use query::Query;

/// Status an endorser reports when it accepted a proposal.
pub const SUCCESS: i32 = 200;

/// Errors that can occur when building, signing, or sending an [Action].
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("cannot {operation} while {state}")]
    Precondition {
        operation: &'static str,
        state: State,
    },
    #[error("proposal has not been endorsed")]
    NotEndorsed,
    #[error("no valid endorsements found")]
    NoValidEndorsements,
    #[error("unknown target: {0}")]
    UnknownTarget(String),
    #[error("signing failed: {0}")]
    Signing(anyhow::Error),
    #[error("handler failed: {0}")]
    Handler(anyhow::Error),
    #[error("unable to decode: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// The identity that creates and signs transactions.
pub trait Identity: Send + Sync + 'static {
    /// Error returned when a signature cannot be produced.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Membership service provider of the identity.
    fn name(&self) -> &str;

    /// Serialized identity placed in signature headers.
    fn serialized(&self) -> Bytes;

    /// Sign `message`.
    ///
    /// The message should not be hashed prior to calling this function.
    fn sign(&self, message: &[u8]) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}

/// A node that simulates proposals and endorses the result.
pub trait Endorser: Clone + Send + Sync + 'static {
    /// Error returned when the endorser cannot be reached.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name the endorser is registered under.
    fn name(&self) -> &str;

    /// Send a signed proposal, waiting at most `timeout` (if provided) for a response.
    fn process_proposal(
        &self,
        proposal: SignedProposal,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<ProposalResponse, Self::Error>> + Send;
}

/// A node that accepts transaction envelopes for ordering.
pub trait Committer: Clone + Send + Sync + 'static {
    /// Error returned when the committer cannot be reached.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name the committer is registered under.
    fn name(&self) -> &str;

    /// Broadcast a signed envelope, waiting at most `timeout` (if provided) for a response.
    fn broadcast(
        &self,
        envelope: Envelope,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<BroadcastResponse, Self::Error>> + Send;
}

/// Delegate that routes a signed message (a proposal or an envelope) on behalf of an [Action].
///
/// Handlers own their delivery policy (e.g. discovery-based target selection or retries). Whatever
/// they reply is surfaced to the caller without modification.
pub trait Handler<M>: Send + Sync + 'static {
    /// Reply produced for the message.
    type Reply: Send;

    /// Error returned when the handler cannot deliver the message.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver `message`.
    ///
    /// `targets` holds any target names supplied alongside the handler (possibly empty).
    fn handle(
        &self,
        message: M,
        targets: &[String],
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Self::Reply, Self::Error>> + Send;
}

/// Handler type for requests that are only ever sent to explicit targets.
#[derive(Clone, Copy, Debug)]
pub enum NoHandler {}

impl Handler<SignedProposal> for NoHandler {
    type Reply = Vec<ProposalResponse>;
    type Error = Infallible;

    async fn handle(
        &self,
        _: SignedProposal,
        _: &[String],
        _: Option<Duration>,
    ) -> Result<Self::Reply, Self::Error> {
        match *self {}
    }
}

impl Handler<Envelope> for NoHandler {
    type Reply = Outcome;
    type Error = Infallible;

    async fn handle(
        &self,
        _: Envelope,
        _: &[String],
        _: Option<Duration>,
    ) -> Result<Self::Reply, Self::Error> {
        match *self {}
    }
}
