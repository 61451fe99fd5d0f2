use futures::executor::block_on;
use ledger_protos::{
    common::{Envelope, Payload, Status},
    peer::{ChaincodeActionPayload, ChaincodeProposalPayload, Transaction},
    Message,
};
use ledger_submit::{
    commit, identity::Signer, mocks, Action, Channel, Commit, Config, Error, Proposal, Query,
    Request, SendOptions, State, Strategy, SUCCESS,
};
use p256::ecdsa::{signature::Verifier, Signature};
use prometheus_client::{encoding::text::encode, registry::Registry};
use rand::{rngs::StdRng, SeedableRng};
use std::{sync::Arc, time::Duration};

fn init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn signer() -> Signer {
    let mut rng = StdRng::seed_from_u64(42);
    Signer::random(&mut rng, "Org1MSP", "-----BEGIN CERTIFICATE-----")
}

#[test]
fn test_endorse_and_commit() {
    init();
    let signer = signer();
    let endorsers = vec![
        mocks::Endorser::new("peer0", SUCCESS),
        mocks::Endorser::new("peer1", SUCCESS),
        mocks::Endorser::new("peer2", 500),
    ];
    let committers = vec![
        mocks::Committer::unreachable("orderer0"),
        mocks::Committer::new("orderer1", Status::Success, ""),
    ];
    let mut registry = Registry::default();
    let channel = Arc::new(Channel::new(
        &mut registry,
        Config {
            name: "mychannel".to_string(),
            endorsers,
            committers: committers.clone(),
        },
    ));

    // Endorse
    let mut proposal = Proposal::new("asset", channel.clone());
    proposal
        .build(
            &signer,
            Request::new("transfer")
                .with_arg("alice")
                .with_arg("bob")
                .with_transient("price", "100"),
        )
        .unwrap();
    block_on(proposal.sign(&signer)).unwrap();
    let options =
        SendOptions::targets(["peer0", "peer1", "peer2"]).with_timeout(Duration::from_secs(3));
    let endorsement = block_on(proposal.send(options)).unwrap();
    assert_eq!(endorsement.responses().len(), 3);
    assert_eq!(endorsement.successful().count(), 2);
    assert!(endorsement.compare_results());

    // Commit
    let mut commit = Commit::new("asset", channel);
    commit
        .build(
            &signer,
            commit::Request {
                endorsement: Some(endorsement.clone()),
            },
        )
        .unwrap();
    let signed = block_on(commit.sign(&signer)).unwrap();
    let outcome = block_on(commit.send(SendOptions::targets(["orderer0", "orderer1"]))).unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.target.as_deref(), Some("orderer1"));
    assert_eq!(commit.state(), State::Sent);

    // The envelope is signed by the creator
    let envelope = Envelope::decode(signed).unwrap();
    let signature = Signature::from_der(&envelope.signature).unwrap();
    assert!(signer
        .verifying_key()
        .verify(&envelope.payload, &signature)
        .is_ok());
    assert_eq!(committers[1].received(), vec![envelope.clone()]);

    // The transaction carries two endorsements and no transient data
    let payload = Payload::decode(envelope.payload).unwrap();
    let transaction = Transaction::decode(payload.data).unwrap();
    let action = ChaincodeActionPayload::decode(transaction.actions[0].payload.clone()).unwrap();
    assert_eq!(action.action.unwrap().endorsements.len(), 2);
    let trimmed = ChaincodeProposalPayload::decode(action.chaincode_proposal_payload).unwrap();
    assert!(trimmed.transient_map.is_empty());

    // Metrics
    let mut buffer = String::new();
    encode(&mut buffer, &registry).unwrap();
    assert!(buffer.contains("mychannel_proposals_total 1"));
    assert!(buffer.contains("mychannel_endorsements_total{status=\"Success\"} 2"));
    assert!(buffer.contains("mychannel_endorsements_total{status=\"Rejected\"} 1"));
    assert!(buffer.contains("mychannel_broadcasts_total{status=\"Unreachable\"} 1"));
    assert!(buffer.contains("mychannel_broadcasts_total{status=\"Success\"} 1"));
}

#[test]
fn test_commit_rejected_everywhere() {
    init();
    let signer = signer();
    let channel = Arc::new(mocks::channel(
        "mychannel",
        vec![mocks::Endorser::new("peer0", SUCCESS)],
        vec![
            mocks::Committer::new("orderer0", Status::BadRequest, "m1"),
            mocks::Committer::new("orderer1", Status::BadRequest, "m2"),
            mocks::Committer::new("orderer2", Status::BadRequest, "m3"),
        ],
    ));
    let mut proposal = Proposal::new("asset", channel.clone());
    proposal.build(&signer, Request::new("transfer")).unwrap();
    block_on(proposal.sign(&signer)).unwrap();
    let endorsement = block_on(proposal.send(SendOptions::targets(["peer0"]))).unwrap();

    let mut commit = Commit::new("asset", channel).with_endorsement(endorsement);
    commit.build(&signer, commit::Request::default()).unwrap();
    block_on(commit.sign(&signer)).unwrap();
    let options = SendOptions::targets(["orderer0", "orderer1", "orderer2"])
        .with_strategy(Strategy::Concurrent);
    let outcome = block_on(commit.send(options)).unwrap();
    assert_eq!(outcome.status, Status::BadRequest);
    assert_eq!(outcome.info, "m3");
}

#[test]
fn test_offline_signature() {
    init();
    let signer = signer();
    let channel = Arc::new(mocks::channel(
        "mychannel",
        vec![mocks::Endorser::new("peer0", SUCCESS)],
        Vec::new(),
    ));
    let mut proposal = Proposal::new("asset", channel);
    let payload = proposal.build(&signer, Request::new("transfer")).unwrap();

    // Sign elsewhere and attach the result
    let signature = block_on(ledger_submit::Identity::sign(&signer, &payload)).unwrap();
    proposal.base_mut().set_signature(signature.clone()).unwrap();
    assert_eq!(proposal.state(), State::Signed);
    let signed = proposal.signed_proposal().unwrap();
    assert_eq!(signed.proposal_bytes, payload);
    assert_eq!(signed.signature, signature);

    let endorsement = block_on(proposal.send(SendOptions::targets(["peer0"]))).unwrap();
    assert_eq!(endorsement.successful().count(), 1);
}

#[test]
fn test_query_results() {
    init();
    let signer = signer();
    let channel = Arc::new(mocks::channel(
        "mychannel",
        vec![
            mocks::Endorser::new("peer0", SUCCESS).with_result(b"100"),
            mocks::Endorser::unreachable("peer1"),
        ],
        Vec::new(),
    ));
    let mut query = Query::new("asset", channel);
    query
        .build(&signer, Request::new("balance").with_arg("alice"))
        .unwrap();
    block_on(query.sign(&signer)).unwrap();
    let results = block_on(query.send(SendOptions::targets(["peer0", "peer1"]))).unwrap();
    assert_eq!(results, vec![bytes::Bytes::from_static(b"100")]);
    let endorsement = query.endorsement().unwrap();
    assert_eq!(endorsement.failures().len(), 1);

    // Unknown targets are rejected before anything is sent
    let err = block_on(query.send(SendOptions::targets(["peer9"]))).unwrap_err();
    assert!(matches!(err, Error::UnknownTarget(_)));
}
