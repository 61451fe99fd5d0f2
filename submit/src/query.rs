//! Evaluate a chaincode function without committing the result.

use crate::{
    action::{Action, Base, SendOptions},
    Channel, Committer, Endorsement, Endorser, Error, Handler, Identity, Proposal, Request,
};
use bytes::Bytes;
use ledger_protos::peer::{ProposalResponse, SignedProposal};
use std::sync::Arc;

/// A [Proposal] whose responses are read rather than committed.
pub struct Query<E: Endorser, C: Committer> {
    proposal: Proposal<E, C>,
}

impl<E: Endorser, C: Committer> Query<E, C> {
    /// Create a query evaluating `chaincode` on `channel`.
    pub fn new(chaincode: impl Into<String>, channel: Arc<Channel<E, C>>) -> Self {
        Self {
            proposal: Proposal::new(chaincode, channel),
        }
    }

    /// The responses collected by the most recent `send` (if any).
    pub fn endorsement(&self) -> Option<Arc<Endorsement>> {
        self.proposal.endorsement()
    }

    pub fn transaction_id(&self) -> Option<String> {
        self.proposal.transaction_id()
    }
}

impl<E: Endorser, C: Committer> Action for Query<E, C> {
    type Request = Request;
    type Message = SignedProposal;
    type Reply = Vec<ProposalResponse>;
    type Outcome = Vec<Bytes>;

    fn base(&self) -> &Base {
        self.proposal.base()
    }

    fn base_mut(&mut self) -> &mut Base {
        self.proposal.base_mut()
    }

    fn build<I: Identity>(&mut self, identity: &I, request: Request) -> Result<Bytes, Error> {
        self.proposal.build(identity, request)
    }

    async fn send<H: Handler<Self::Message, Reply = Self::Reply>>(
        &mut self,
        options: SendOptions<H>,
    ) -> Result<Vec<Bytes>, Error> {
        let endorsement = self.proposal.send(options).await?;
        if endorsement.successful().next().is_none() {
            return Err(Error::NoValidEndorsements);
        }
        Ok(endorsement.results())
    }
}
