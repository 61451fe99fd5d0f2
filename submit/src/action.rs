//! Lifecycle shared by every request sent to the network.
//!
//! An [Action] moves through `Unbuilt → Built → Signed → Sent`. Calling `build` always discards
//! whatever was built (and signed) before, so an action may be reused, but each payload is built
//! from scratch. `sign` requires a built payload and `send` requires a signature.

use crate::{broadcast::Strategy, Error, Handler, Identity, NoHandler};
use bytes::Bytes;
use ledger_protos::{common::Envelope, Message};
use std::{fmt, future::Future, time::Duration};

/// Position of an [Action] in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Unbuilt,
    Built,
    Signed,
    Sent,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            State::Unbuilt => "unbuilt",
            State::Built => "built",
            State::Signed => "signed",
            State::Sent => "sent",
        };
        f.write_str(state)
    }
}

/// Payload and signature state embedded in every [Action].
#[derive(Clone, Debug)]
pub struct Base {
    name: String,
    state: State,
    payload: Option<Bytes>,
    signature: Option<Bytes>,
}

impl Base {
    /// Create an unbuilt base for the chaincode `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: State::Unbuilt,
            payload: None,
            signature: None,
        }
    }

    /// Name of the chaincode targeted by the action.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the action in its lifecycle.
    pub fn state(&self) -> State {
        self.state
    }

    /// The payload produced by the most recent `build` (if any).
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    /// The signature over the current payload (if any).
    pub fn signature(&self) -> Option<&Bytes> {
        self.signature.as_ref()
    }

    /// Discard any built payload and signature.
    pub fn reset(&mut self) {
        self.state = State::Unbuilt;
        self.payload = None;
        self.signature = None;
    }

    /// Store a freshly built payload, returning it.
    pub fn built(&mut self, payload: Bytes) -> Bytes {
        self.state = State::Built;
        self.signature = None;
        self.payload = Some(payload.clone());
        payload
    }

    fn unsigned(&self) -> Result<Bytes, Error> {
        match (self.state, &self.payload) {
            (State::Built | State::Signed, Some(payload)) => Ok(payload.clone()),
            (state, _) => Err(Error::Precondition {
                operation: "sign",
                state,
            }),
        }
    }

    /// Sign the current payload with `identity`, returning the serialized signed envelope.
    pub async fn sign<I: Identity>(&mut self, identity: &I) -> Result<Bytes, Error> {
        let payload = self.unsigned()?;
        let signature = identity
            .sign(&payload)
            .await
            .map_err(|err| Error::Signing(err.into()))?;
        self.set_signature(signature)
    }

    /// Attach a signature produced elsewhere (e.g. by an offline signer) over the current payload,
    /// returning the serialized signed envelope.
    pub fn set_signature(&mut self, signature: Bytes) -> Result<Bytes, Error> {
        let payload = self.unsigned()?;
        let envelope = Envelope {
            payload,
            signature: signature.clone(),
        };
        self.signature = Some(signature);
        self.state = State::Signed;
        Ok(envelope.encode_to_vec().into())
    }

    /// The signed envelope, if the action has been signed.
    pub fn envelope(&self, operation: &'static str) -> Result<Envelope, Error> {
        match (self.state, &self.payload, &self.signature) {
            (State::Signed | State::Sent, Some(payload), Some(signature)) => Ok(Envelope {
                payload: payload.clone(),
                signature: signature.clone(),
            }),
            (state, _, _) => Err(Error::Precondition { operation, state }),
        }
    }

    /// Record that the signed envelope was handed to the network.
    pub fn sent(&mut self) {
        self.state = State::Sent;
    }
}

/// Where a signed message should be delivered.
#[derive(Clone, Debug)]
pub enum Delivery<H> {
    /// Hand the message to a delegate that owns routing.
    Handler {
        handler: H,
        targets: Vec<String>,
        timeout: Option<Duration>,
    },
    /// Send the message to each named target registered with the channel.
    Targets {
        targets: Vec<String>,
        timeout: Option<Duration>,
        strategy: Strategy,
    },
}

/// Options supplied when sending an [Action].
///
/// Exactly one delivery mode is used: the `handler` (when present) or the `targets`.
#[derive(Clone, Debug)]
pub struct SendOptions<H = NoHandler> {
    /// Delegate responsible for delivery.
    pub handler: Option<H>,

    /// Names of targets registered with the channel.
    pub targets: Option<Vec<String>>,

    /// Maximum time to wait on each target.
    pub timeout: Option<Duration>,

    /// How broadcast targets are attempted (ignored when endorsing).
    pub strategy: Strategy,
}

impl Default for SendOptions<NoHandler> {
    fn default() -> Self {
        Self {
            handler: None,
            targets: None,
            timeout: None,
            strategy: Strategy::default(),
        }
    }
}

impl SendOptions<NoHandler> {
    /// Deliver to the named targets.
    pub fn targets<S: Into<String>>(targets: impl IntoIterator<Item = S>) -> Self {
        Self {
            targets: Some(targets.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

impl<H> SendOptions<H> {
    /// Deliver through `handler`.
    pub fn handler(handler: H) -> Self {
        Self {
            handler: Some(handler),
            targets: None,
            timeout: None,
            strategy: Strategy::default(),
        }
    }

    /// Wait at most `timeout` on each target.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attempt broadcast targets with `strategy`.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolve the options into a single [Delivery].
    ///
    /// A handler takes precedence over targets. Fails if neither is provided.
    pub fn delivery(self) -> Result<Delivery<H>, Error> {
        match (self.handler, self.targets) {
            (Some(handler), targets) => Ok(Delivery::Handler {
                handler,
                targets: targets.unwrap_or_default(),
                timeout: self.timeout,
            }),
            (None, Some(targets)) => Ok(Delivery::Targets {
                targets,
                timeout: self.timeout,
                strategy: self.strategy,
            }),
            (None, None) => Err(Error::MissingParameter("handler or targets")),
        }
    }
}

/// A request that is built, signed, and then sent to the network.
pub trait Action: Send {
    /// Input required to build the payload.
    type Request;

    /// Signed message handed to a [Handler].
    type Message;

    /// Reply expected from a [Handler].
    type Reply;

    /// Result of a successful `send`.
    type Outcome;

    fn base(&self) -> &Base;

    fn base_mut(&mut self) -> &mut Base;

    fn state(&self) -> State {
        self.base().state()
    }

    /// Build a fresh payload for `request`, discarding any previous payload.
    fn build<I: Identity>(&mut self, identity: &I, request: Self::Request) -> Result<Bytes, Error>;

    /// Sign the built payload with `identity`, returning the serialized signed envelope.
    fn sign<'a, I: Identity>(
        &'a mut self,
        identity: &'a I,
    ) -> impl Future<Output = Result<Bytes, Error>> + Send + 'a {
        self.base_mut().sign(identity)
    }

    /// Send the signed envelope.
    fn send<H: Handler<Self::Message, Reply = Self::Reply>>(
        &mut self,
        options: SendOptions<H>,
    ) -> impl Future<Output = Result<Self::Outcome, Error>> + Send;
}
