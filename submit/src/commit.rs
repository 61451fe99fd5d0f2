//! Turn collected endorsements into a transaction and broadcast it.
//!
//! # Assembly
//!
//! The transaction is rebuilt from an [Endorsement] in the following order:
//!
//! 1. Keep the endorsement of every response reporting [crate::SUCCESS] (responses with any
//!    other status are dropped even if they carry an endorsement).
//! 2. Take the proposal response payload from the first response collected.
//! 3. Decode the original proposal payload and keep only its input. The transient map is only
//!    meant for endorsers: every endorser hashed the payload without it, so it must never reach
//!    the ordering service.
//! 4. Nest `ChaincodeEndorsedAction → ChaincodeActionPayload → TransactionAction → Transaction`
//!    and wrap the transaction in a `Payload` carrying the original proposal header.

use crate::{
    action::{Action, Base, Delivery, SendOptions},
    broadcast::{self, Outcome, Strategy},
    Channel, Committer, Endorsement, Endorser, Error, Handler, Identity,
};
use bytes::Bytes;
use ledger_protos::{
    common::Envelope,
    peer::{
        ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeProposalPayload, Transaction,
        TransactionAction,
    },
    Message,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info, warn};

/// Input used to build a [Commit].
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Endorsement to commit (replaces any endorsement supplied earlier).
    pub endorsement: Option<Arc<Endorsement>>,
}

/// A `Payload` whose header is carried as the exact bytes of the proposal header.
///
/// An embedded message and a bytes field share a wire type, so this encodes identically to
/// `Payload` without re-encoding (and possibly reordering) the header.
#[derive(Clone, PartialEq, ::prost::Message)]
struct SignedPayload {
    #[prost(bytes = "bytes", tag = "1")]
    header: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    data: Bytes,
}

/// Rebuild the transaction payload committed to by `endorsement`.
pub fn assemble(endorsement: &Endorsement) -> Result<Bytes, Error> {
    let Some(first) = endorsement.responses().first() else {
        return Err(Error::NotEndorsed);
    };
    let endorsements: Vec<_> = endorsement
        .successful()
        .filter_map(|response| response.endorsement.clone())
        .collect();
    if endorsements.is_empty() {
        return Err(Error::NoValidEndorsements);
    }

    // Remove transient data
    let original = ChaincodeProposalPayload::decode(endorsement.proposal().payload.clone())?;
    let trimmed = ChaincodeProposalPayload {
        input: original.input,
        transient_map: BTreeMap::new(),
    };

    // Nest actions
    let action = ChaincodeEndorsedAction {
        proposal_response_payload: first.payload.clone(),
        endorsements,
    };
    let action_payload = ChaincodeActionPayload {
        chaincode_proposal_payload: trimmed.encode_to_vec().into(),
        action: Some(action),
    };
    let header = endorsement.header();
    let transaction = Transaction {
        actions: vec![TransactionAction {
            header: header.signature_header.clone(),
            payload: action_payload.encode_to_vec().into(),
        }],
    };
    let payload = SignedPayload {
        header: endorsement.proposal().header.clone(),
        data: transaction.encode_to_vec().into(),
    };
    Ok(payload.encode_to_vec().into())
}

/// A transaction built from endorsements and broadcast to committers.
pub struct Commit<E: Endorser, C: Committer> {
    base: Base,
    channel: Arc<Channel<E, C>>,
    endorsement: Option<Arc<Endorsement>>,
}

impl<E: Endorser, C: Committer> Commit<E, C> {
    /// Create a commit for `chaincode` on `channel`.
    pub fn new(chaincode: impl Into<String>, channel: Arc<Channel<E, C>>) -> Self {
        Self {
            base: Base::new(chaincode),
            channel,
            endorsement: None,
        }
    }

    /// Supply the endorsement to build from.
    pub fn with_endorsement(mut self, endorsement: Arc<Endorsement>) -> Self {
        self.endorsement = Some(endorsement);
        self
    }

    pub fn endorsement(&self) -> Option<&Arc<Endorsement>> {
        self.endorsement.as_ref()
    }

    /// The signed envelope, if the commit has been signed.
    pub fn envelope(&self) -> Result<Envelope, Error> {
        self.base.envelope("send")
    }
}

impl<E: Endorser, C: Committer> Action for Commit<E, C> {
    type Request = Request;
    type Message = Envelope;
    type Reply = Outcome;
    type Outcome = Outcome;

    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    fn build<I: Identity>(&mut self, identity: &I, request: Request) -> Result<Bytes, Error> {
        self.base.reset();
        if let Some(endorsement) = request.endorsement {
            self.endorsement = Some(endorsement);
        }
        let endorsement = self
            .endorsement
            .as_ref()
            .ok_or(Error::MissingParameter("endorsement"))?;
        let payload = assemble(endorsement)?;
        debug!(
            channel = self.channel.name(),
            chaincode = self.base.name(),
            tx_id = endorsement.transaction_id(),
            endorsements = endorsement.successful().count(),
            creator = identity.name(),
            "built transaction"
        );
        Ok(self.base.built(payload))
    }

    async fn send<H: Handler<Self::Message, Reply = Self::Reply>>(
        &mut self,
        options: SendOptions<H>,
    ) -> Result<Outcome, Error> {
        let envelope = self.base.envelope("send")?;
        let outcome = match options.delivery()? {
            Delivery::Handler {
                handler,
                targets,
                timeout,
            } => handler
                .handle(envelope, &targets, timeout)
                .await
                .map_err(|err| Error::Handler(err.into()))?,
            Delivery::Targets {
                targets,
                timeout,
                strategy,
            } => {
                let committers = self.channel.committers(&targets)?;
                let metrics = self.channel.metrics();
                match strategy {
                    Strategy::Sequential => {
                        broadcast::sequential(&committers, &envelope, timeout, metrics).await
                    }
                    Strategy::Concurrent => {
                        broadcast::concurrent(&committers, &envelope, timeout, metrics).await
                    }
                }
            }
        };
        self.base.sent();

        let tx_id = self
            .endorsement
            .as_ref()
            .map(|endorsement| endorsement.transaction_id().to_string())
            .unwrap_or_default();
        if outcome.is_success() {
            info!(
                channel = self.channel.name(),
                %tx_id,
                committer = ?outcome.target,
                "transaction accepted"
            );
        } else {
            warn!(
                channel = self.channel.name(),
                %tx_id,
                status = ?outcome.status,
                info = %outcome.info,
                "transaction not accepted"
            );
        }
        Ok(outcome)
    }
}
