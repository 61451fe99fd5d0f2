//! Build a chaincode invocation and collect endorsements for it.
//!
//! # Transaction Identity
//!
//! Every [Proposal::build] draws a fresh random nonce. The transaction id is the hex-encoded
//! SHA-256 digest of the nonce followed by the serialized creator, so a rebuilt proposal is always
//! a new transaction.
//!
//! # Endorsement
//!
//! When sent to explicit targets, the signed proposal is issued to every endorser at once and
//! every reply is kept (successful or not), in the order it arrived. Endorsers that cannot be
//! reached are recorded as [crate::endorsement::Failure]s rather than aborting the send.

use crate::{
    action::{Action, Base, Delivery, SendOptions},
    metrics, Channel, Committer, Endorsement, Endorser, Error, Handler, Identity,
};
use bytes::Bytes;
use futures::{stream::FuturesUnordered, StreamExt};
use ledger_protos::{
    common::{ChannelHeader, Header, HeaderType, SignatureHeader, Timestamp},
    peer::{
        self, ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
        ChaincodeProposalPayload, ChaincodeSpec, ChaincodeType, ProposalResponse, SignedProposal,
    },
    Message,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::{collections::BTreeMap, sync::Arc, time::SystemTime};
use tracing::{debug, info, warn};

/// Length of the random nonce placed in every signature header.
pub const NONCE_LENGTH: usize = 24;

/// Invocation to propose.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Chaincode function to invoke (placed before `args`).
    pub function: Option<String>,

    /// Arguments passed to the function.
    pub args: Vec<Bytes>,

    /// Private inputs visible only to endorsers.
    pub transient: BTreeMap<String, Bytes>,

    /// Whether the invocation initializes the chaincode.
    pub init: bool,

    /// Time recorded in the channel header (defaults to now).
    pub timestamp: Option<SystemTime>,
}

impl Request {
    /// Invoke `function`.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Default::default()
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_transient(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.transient.insert(key.into(), value.into());
        self
    }

    pub fn with_init(mut self) -> Self {
        self.init = true;
        self
    }
}

/// Generate a random nonce.
pub fn nonce() -> Bytes {
    let mut nonce = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    Bytes::copy_from_slice(&nonce)
}

/// Derive the transaction id for a `nonce` and serialized `creator`.
pub fn transaction_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes.iter() {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// A chaincode invocation sent to endorsers.
pub struct Proposal<E: Endorser, C: Committer> {
    base: Base,
    channel: Arc<Channel<E, C>>,
    proposal: Option<peer::Proposal>,
    endorsement: Option<Arc<Endorsement>>,
}

impl<E: Endorser, C: Committer> Proposal<E, C> {
    /// Create a proposal invoking `chaincode` on `channel`.
    pub fn new(chaincode: impl Into<String>, channel: Arc<Channel<E, C>>) -> Self {
        Self {
            base: Base::new(chaincode),
            channel,
            proposal: None,
            endorsement: None,
        }
    }

    /// The proposal produced by the most recent `build` (if any).
    pub fn proposal(&self) -> Option<&peer::Proposal> {
        self.proposal.as_ref()
    }

    /// The transaction id of the most recent `build` (if any).
    pub fn transaction_id(&self) -> Option<String> {
        let proposal = self.proposal.as_ref()?;
        let header = Header::decode(proposal.header.clone()).ok()?;
        let channel_header = ChannelHeader::decode(header.channel_header).ok()?;
        Some(channel_header.tx_id)
    }

    /// The responses collected by the most recent `send` (if any).
    pub fn endorsement(&self) -> Option<Arc<Endorsement>> {
        self.endorsement.clone()
    }

    pub fn channel(&self) -> &Arc<Channel<E, C>> {
        &self.channel
    }

    /// The signed proposal, if the proposal has been signed.
    pub fn signed_proposal(&self) -> Result<SignedProposal, Error> {
        let envelope = self.base.envelope("send")?;
        Ok(SignedProposal {
            proposal_bytes: envelope.payload,
            signature: envelope.signature,
        })
    }

    async fn collect(
        &self,
        endorsement: &mut Endorsement,
        signed: SignedProposal,
        endorsers: Vec<E>,
        timeout: Option<std::time::Duration>,
    ) {
        let metrics = self.channel.metrics();

        let mut pending: FuturesUnordered<_> = endorsers
            .into_iter()
            .map(|endorser| {
                let signed = signed.clone();
                async move {
                    let result = endorser.process_proposal(signed, timeout).await;
                    (endorser, result)
                }
            })
            .collect();
        while let Some((endorser, result)) = pending.next().await {
            match result {
                Ok(response) => {
                    let status = response.response.as_ref().map(|r| r.status);
                    if status == Some(crate::SUCCESS) {
                        metrics.endorsement(metrics::Status::Success);
                        debug!(endorser = endorser.name(), "proposal endorsed");
                    } else {
                        metrics.endorsement(metrics::Status::Rejected);
                        warn!(endorser = endorser.name(), ?status, "proposal rejected");
                    }
                    endorsement.record(response);
                }
                Err(err) => {
                    metrics.endorsement(metrics::Status::Unreachable);
                    warn!(endorser = endorser.name(), ?err, "endorser unreachable");
                    endorsement.record_failure(endorser.name(), err.to_string());
                }
            }
        }
    }
}

impl<E: Endorser, C: Committer> Action for Proposal<E, C> {
    type Request = Request;
    type Message = SignedProposal;
    type Reply = Vec<ProposalResponse>;
    type Outcome = Arc<Endorsement>;

    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    fn build<I: Identity>(&mut self, identity: &I, request: Request) -> Result<Bytes, Error> {
        self.base.reset();
        self.proposal = None;
        self.endorsement = None;

        if self.base.name().is_empty() {
            return Err(Error::MissingParameter("chaincode"));
        }
        if self.channel.name().is_empty() {
            return Err(Error::MissingParameter("channel"));
        }
        let mut args = Vec::with_capacity(request.args.len() + 1);
        if let Some(function) = request.function {
            args.push(function.into_bytes());
        }
        args.extend(request.args.iter().map(|arg| arg.to_vec()));
        if args.is_empty() {
            return Err(Error::MissingParameter("args"));
        }

        // Identify the transaction
        let creator = identity.serialized();
        let nonce = nonce();
        let tx_id = transaction_id(&nonce, &creator);
        let chaincode_id = ChaincodeId {
            name: self.base.name().to_string(),
            ..Default::default()
        };

        // Construct header
        let extension = ChaincodeHeaderExtension {
            chaincode_id: Some(chaincode_id.clone()),
        };
        let channel_header = ChannelHeader {
            r#type: HeaderType::EndorserTransaction as i32,
            timestamp: Some(Timestamp::from(
                request.timestamp.unwrap_or_else(SystemTime::now),
            )),
            channel_id: self.channel.name().to_string(),
            tx_id: tx_id.clone(),
            epoch: 0,
            extension: extension.encode_to_vec().into(),
            ..Default::default()
        };
        let signature_header = SignatureHeader { creator, nonce };
        let header = Header {
            channel_header: channel_header.encode_to_vec().into(),
            signature_header: signature_header.encode_to_vec().into(),
        };

        // Construct payload
        let invocation = ChaincodeInvocationSpec {
            chaincode_spec: Some(ChaincodeSpec {
                r#type: ChaincodeType::Golang as i32,
                chaincode_id: Some(chaincode_id),
                input: Some(ChaincodeInput {
                    args,
                    decorations: BTreeMap::new(),
                    is_init: request.init,
                }),
                timeout: 0,
            }),
        };
        let payload = ChaincodeProposalPayload {
            input: invocation.encode_to_vec().into(),
            transient_map: request
                .transient
                .into_iter()
                .map(|(key, value)| (key, value.to_vec()))
                .collect(),
        };
        let proposal = peer::Proposal {
            header: header.encode_to_vec().into(),
            payload: payload.encode_to_vec().into(),
            extension: Bytes::new(),
        };
        let bytes: Bytes = proposal.encode_to_vec().into();
        debug!(
            channel = self.channel.name(),
            chaincode = self.base.name(),
            %tx_id,
            "built proposal"
        );
        self.proposal = Some(proposal);
        Ok(self.base.built(bytes))
    }

    async fn send<H: Handler<Self::Message, Reply = Self::Reply>>(
        &mut self,
        options: SendOptions<H>,
    ) -> Result<Arc<Endorsement>, Error> {
        let signed = self.signed_proposal()?;
        let delivery = options.delivery()?;
        let proposal = self
            .proposal
            .clone()
            .ok_or(Error::MissingParameter("proposal"))?;
        let mut endorsement = Endorsement::new(proposal, Vec::new())?;
        match delivery {
            Delivery::Handler {
                handler,
                targets,
                timeout,
            } => {
                self.channel.metrics().proposals.inc();
                let responses = handler
                    .handle(signed, &targets, timeout)
                    .await
                    .map_err(|err| Error::Handler(err.into()))?;
                for response in responses {
                    endorsement.record(response);
                }
            }
            Delivery::Targets {
                targets, timeout, ..
            } => {
                let endorsers = self.channel.endorsers(&targets)?;
                self.channel.metrics().proposals.inc();
                self.collect(&mut endorsement, signed, endorsers, timeout)
                    .await;
            }
        }
        self.base.sent();

        let successful = endorsement.successful().count();
        let collected = endorsement.responses().len();
        let endorsement = Arc::new(endorsement);
        self.endorsement = Some(endorsement.clone());
        if endorsement.is_empty() {
            warn!(
                channel = self.channel.name(),
                tx_id = endorsement.transaction_id(),
                failures = endorsement.failures().len(),
                "no endorsement responses"
            );
            return Err(Error::NotEndorsed);
        }
        info!(
            channel = self.channel.name(),
            tx_id = endorsement.transaction_id(),
            collected,
            successful,
            "collected endorsements"
        );
        Ok(endorsement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mocks, Outcome, State, SUCCESS};
    use futures::executor::block_on;
    use ledger_protos::msp::SerializedIdentity;
    use std::time::Duration;

    fn channel(endorsers: Vec<mocks::Endorser>) -> Arc<Channel<mocks::Endorser, mocks::Committer>> {
        Arc::new(mocks::channel("mychannel", endorsers, Vec::new()))
    }

    fn decode_payload(proposal: &peer::Proposal) -> (ChaincodeProposalPayload, ChaincodeInput) {
        let payload = ChaincodeProposalPayload::decode(proposal.payload.clone()).unwrap();
        let invocation = ChaincodeInvocationSpec::decode(payload.input.clone()).unwrap();
        let input = invocation.chaincode_spec.unwrap().input.unwrap();
        (payload, input)
    }

    #[test]
    fn test_transaction_id() {
        // SHA-256 of the empty string
        assert_eq!(
            transaction_id(&[], &[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(transaction_id(b"a", b"b"), transaction_id(b"b", b"a"));
    }

    #[test]
    fn test_nonce_is_random() {
        let first = nonce();
        assert_eq!(first.len(), NONCE_LENGTH);
        assert_ne!(first, nonce());
    }

    #[test]
    fn test_build_requires_chaincode() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("", channel(Vec::new()));
        let err = proposal
            .build(&identity, Request::new("transfer"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("chaincode")));
    }

    #[test]
    fn test_build_requires_channel() {
        let identity = mocks::Identity::new("Org1MSP");
        let channel = Arc::new(mocks::channel("", Vec::new(), Vec::new()));
        let mut proposal = Proposal::new("asset", channel);
        let err = proposal
            .build(&identity, Request::new("transfer"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("channel")));
    }

    #[test]
    fn test_build_requires_args() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("asset", channel(Vec::new()));
        let err = proposal.build(&identity, Request::default()).unwrap_err();
        assert!(matches!(err, Error::MissingParameter("args")));
        assert_eq!(proposal.state(), State::Unbuilt);
    }

    #[test]
    fn test_build_structure() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("asset", channel(Vec::new()));
        let request = Request::new("transfer")
            .with_arg("alice")
            .with_arg("bob")
            .with_transient("price", "100");
        let bytes = proposal.build(&identity, request).unwrap();
        assert_eq!(proposal.state(), State::Built);

        let built = peer::Proposal::decode(bytes).unwrap();
        assert_eq!(Some(&built), proposal.proposal());

        // Header
        let header = Header::decode(built.header.clone()).unwrap();
        let channel_header = ChannelHeader::decode(header.channel_header).unwrap();
        let signature_header = SignatureHeader::decode(header.signature_header).unwrap();
        assert_eq!(channel_header.r#type, HeaderType::EndorserTransaction as i32);
        assert_eq!(channel_header.channel_id, "mychannel");
        assert_eq!(signature_header.nonce.len(), NONCE_LENGTH);
        assert_eq!(
            channel_header.tx_id,
            transaction_id(&signature_header.nonce, &signature_header.creator)
        );
        assert_eq!(proposal.transaction_id(), Some(channel_header.tx_id));
        let creator = SerializedIdentity::decode(signature_header.creator).unwrap();
        assert_eq!(creator.mspid, "Org1MSP");
        let extension = ChaincodeHeaderExtension::decode(channel_header.extension).unwrap();
        assert_eq!(extension.chaincode_id.unwrap().name, "asset");

        // Payload
        let (payload, input) = decode_payload(&built);
        assert_eq!(
            input.args,
            vec![b"transfer".to_vec(), b"alice".to_vec(), b"bob".to_vec()]
        );
        assert!(!input.is_init);
        assert_eq!(payload.transient_map.get("price"), Some(&b"100".to_vec()));
    }

    #[test]
    fn test_build_args_without_function() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("asset", channel(Vec::new()));
        let request = Request {
            args: vec![Bytes::from_static(b"query"), Bytes::from_static(b"a")],
            init: true,
            ..Default::default()
        };
        let bytes = proposal.build(&identity, request).unwrap();
        let (_, input) = decode_payload(&peer::Proposal::decode(bytes).unwrap());
        assert_eq!(input.args, vec![b"query".to_vec(), b"a".to_vec()]);
        assert!(input.is_init);
    }

    #[test]
    fn test_rebuild_is_fresh() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("asset", channel(Vec::new()));
        proposal.build(&identity, Request::new("a")).unwrap();
        let first = proposal.transaction_id().unwrap();
        block_on(proposal.sign(&identity)).unwrap();
        assert_eq!(proposal.state(), State::Signed);

        proposal.build(&identity, Request::new("b")).unwrap();
        assert_eq!(proposal.state(), State::Built);
        assert_ne!(proposal.transaction_id().unwrap(), first);
        let (_, input) = decode_payload(proposal.proposal().unwrap());
        assert_eq!(input.args, vec![b"b".to_vec()]);
    }

    #[test]
    fn test_send_requires_signature() {
        let identity = mocks::Identity::new("Org1MSP");
        let peer0 = mocks::Endorser::new("peer0", SUCCESS);
        let mut proposal = Proposal::new("asset", channel(vec![peer0.clone()]));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        let err = block_on(proposal.send(SendOptions::targets(["peer0"]))).unwrap_err();
        assert!(matches!(
            err,
            Error::Precondition {
                state: State::Built,
                ..
            }
        ));
        assert_eq!(peer0.calls(), 0);
    }

    #[test]
    fn test_send_requires_handler_or_targets() {
        let identity = mocks::Identity::new("Org1MSP");
        let peer0 = mocks::Endorser::new("peer0", SUCCESS);
        let mut proposal = Proposal::new("asset", channel(vec![peer0.clone()]));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        block_on(proposal.sign(&identity)).unwrap();
        let err = block_on(proposal.send(SendOptions::default())).unwrap_err();
        assert!(matches!(err, Error::MissingParameter(_)));
        assert_eq!(peer0.calls(), 0);
        assert_eq!(proposal.channel().metrics().proposals.get(), 0);
    }

    #[test]
    fn test_send_collects_every_response() {
        let identity = mocks::Identity::new("Org1MSP");
        let endorsers = vec![
            mocks::Endorser::new("peer0", SUCCESS),
            mocks::Endorser::new("peer1", 500),
            mocks::Endorser::unreachable("peer2"),
            mocks::Endorser::new("peer3", SUCCESS).with_latency(Duration::from_secs(10)),
        ];
        let mut proposal = Proposal::new("asset", channel(endorsers.clone()));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        block_on(proposal.sign(&identity)).unwrap();

        let options = SendOptions::targets(["peer0", "peer1", "peer2", "peer3"])
            .with_timeout(Duration::from_secs(3));
        let endorsement = block_on(proposal.send(options)).unwrap();
        assert_eq!(proposal.state(), State::Sent);
        assert_eq!(endorsement.responses().len(), 2);
        assert_eq!(endorsement.successful().count(), 1);
        assert_eq!(endorsement.failures().len(), 2);
        assert_eq!(
            endorsement.transaction_id(),
            proposal.transaction_id().unwrap()
        );
        assert!(Arc::ptr_eq(&endorsement, &proposal.endorsement().unwrap()));
        for endorser in &endorsers {
            assert_eq!(endorser.calls(), 1);
            let received = endorser.received();
            assert_eq!(received[0], proposal.signed_proposal().unwrap());
        }
    }

    #[test]
    fn test_send_unknown_target() {
        let identity = mocks::Identity::new("Org1MSP");
        let peer0 = mocks::Endorser::new("peer0", SUCCESS);
        let mut proposal = Proposal::new("asset", channel(vec![peer0.clone()]));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        block_on(proposal.sign(&identity)).unwrap();
        let err = block_on(proposal.send(SendOptions::targets(["peer0", "peer9"]))).unwrap_err();
        assert!(matches!(err, Error::UnknownTarget(name) if name == "peer9"));
        assert_eq!(peer0.calls(), 0);
        assert_eq!(proposal.channel().metrics().proposals.get(), 0);
    }

    #[test]
    fn test_send_without_responses() {
        let identity = mocks::Identity::new("Org1MSP");
        let peer0 = mocks::Endorser::unreachable("peer0");
        let mut proposal = Proposal::new("asset", channel(vec![peer0]));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        block_on(proposal.sign(&identity)).unwrap();
        let err = block_on(proposal.send(SendOptions::targets(["peer0"]))).unwrap_err();
        assert!(matches!(err, Error::NotEndorsed));

        // Failures remain available for inspection
        let endorsement = proposal.endorsement().unwrap();
        assert_eq!(endorsement.failures()[0].target, "peer0");
    }

    #[test]
    fn test_send_through_handler() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("asset", channel(Vec::new()));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        block_on(proposal.sign(&identity)).unwrap();

        let handler = mocks::Handler::new(
            vec![
                mocks::response("peer0", SUCCESS, b"result"),
                mocks::response("peer1", SUCCESS, b"result"),
            ],
            Outcome::unknown(),
        );
        let options = SendOptions {
            targets: Some(vec!["peer0".to_string()]),
            ..SendOptions::handler(handler.clone())
        };
        let endorsement = block_on(proposal.send(options)).unwrap();
        assert_eq!(endorsement.successful().count(), 2);
        assert_eq!(handler.proposals(), 1);
        assert_eq!(handler.targets(), vec![vec!["peer0".to_string()]]);
        assert_eq!(proposal.channel().metrics().proposals.get(), 1);
    }

    #[test]
    fn test_handler_failure_is_raised() {
        let identity = mocks::Identity::new("Org1MSP");
        let mut proposal = Proposal::new("asset", channel(Vec::new()));
        proposal.build(&identity, Request::new("transfer")).unwrap();
        block_on(proposal.sign(&identity)).unwrap();
        let err = block_on(proposal.send(SendOptions::handler(mocks::Handler::failing()))).unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(proposal.state(), State::Signed);
    }
}
