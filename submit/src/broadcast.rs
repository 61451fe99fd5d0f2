//! Deliver a signed envelope to a list of committers.
//!
//! Targets are resolved in the order they were supplied:
//! - The first target to report [Status::Success] wins. Later targets are never contacted
//!   (or, when attempted concurrently, their outcomes are ignored).
//! - If no target succeeds, the outcome of the last target is returned.
//! - If there are no targets at all, an [Outcome] with [Status::Unknown] is returned.
//!
//! A target that cannot be reached (including one that times out) yields an [Outcome] with
//! [Status::ServiceUnavailable] rather than an error.

use crate::{metrics, metrics::Metrics, Committer};
use futures::future::join_all;
use ledger_protos::{common::Envelope, common::Status, orderer::BroadcastResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// How broadcast targets are attempted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Attempt one target at a time, stopping at the first success.
    #[default]
    Sequential,

    /// Attempt every target at once and resolve the outcomes in target order.
    Concurrent,
}

/// Result of delivering an envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Status reported by the target ([Status::Unknown] if the code is not recognized).
    pub status: Status,

    /// Status code exactly as reported by the target.
    pub code: i32,

    /// Detail reported by the target (or the transport error).
    pub info: String,

    /// Name of the target that produced the outcome (if any was attempted).
    pub target: Option<String>,
}

impl Outcome {
    /// Outcome used when no target was attempted.
    pub fn unknown() -> Self {
        Self {
            status: Status::Unknown,
            code: Status::Unknown as i32,
            info: String::new(),
            target: None,
        }
    }

    /// Outcome reported by `target`.
    pub fn reported(target: &str, response: BroadcastResponse) -> Self {
        Self {
            status: response.status(),
            code: response.status,
            info: response.info,
            target: Some(target.to_string()),
        }
    }

    /// Outcome for a `target` that could not be reached.
    pub fn unreachable(target: &str, error: impl std::fmt::Display) -> Self {
        Self {
            status: Status::ServiceUnavailable,
            code: Status::ServiceUnavailable as i32,
            info: error.to_string(),
            target: Some(target.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Select the first successful outcome, or else the last outcome observed.
pub fn resolve(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
    let mut bad_result = Outcome::unknown();
    for outcome in outcomes {
        if outcome.is_success() {
            return outcome;
        }
        bad_result = outcome;
    }
    bad_result
}

async fn attempt<C: Committer>(
    committer: &C,
    envelope: Envelope,
    timeout: Option<Duration>,
    metrics: &Metrics,
) -> Outcome {
    let name = committer.name();
    match committer.broadcast(envelope, timeout).await {
        Ok(response) => {
            let outcome = Outcome::reported(name, response);
            if outcome.is_success() {
                metrics.broadcast(metrics::Status::Success);
                debug!(committer = name, "broadcast accepted");
            } else {
                metrics.broadcast(metrics::Status::Rejected);
                warn!(
                    committer = name,
                    status = ?outcome.status,
                    code = outcome.code,
                    info = %outcome.info,
                    "broadcast rejected"
                );
            }
            outcome
        }
        Err(err) => {
            metrics.broadcast(metrics::Status::Unreachable);
            warn!(committer = name, ?err, "broadcast failed");
            Outcome::unreachable(name, err)
        }
    }
}

/// Attempt each committer in order, returning as soon as one succeeds.
pub(crate) async fn sequential<C: Committer>(
    committers: &[C],
    envelope: &Envelope,
    timeout: Option<Duration>,
    metrics: &Metrics,
) -> Outcome {
    let mut bad_result = Outcome::unknown();
    for committer in committers {
        let outcome = attempt(committer, envelope.clone(), timeout, metrics).await;
        if outcome.is_success() {
            return outcome;
        }
        bad_result = outcome;
    }
    bad_result
}

/// Attempt all committers at once, resolving their outcomes in the order supplied.
pub(crate) async fn concurrent<C: Committer>(
    committers: &[C],
    envelope: &Envelope,
    timeout: Option<Duration>,
    metrics: &Metrics,
) -> Outcome {
    let outcomes = join_all(
        committers
            .iter()
            .map(|committer| attempt(committer, envelope.clone(), timeout, metrics)),
    )
    .await;
    resolve(outcomes)
}
