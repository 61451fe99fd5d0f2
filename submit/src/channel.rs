//! Named endorsers and committers that serve a single channel.

use crate::{metrics::Metrics, Committer, Endorser, Error};
use prometheus_client::registry::Registry;
use std::collections::BTreeMap;
use tracing::warn;

/// Configuration for a [Channel].
pub struct Config<E: Endorser, C: Committer> {
    /// Name of the channel (placed in every channel header).
    pub name: String,

    /// Endorsers that may be named as proposal targets.
    pub endorsers: Vec<E>,

    /// Committers that may be named as broadcast targets.
    pub committers: Vec<C>,
}

/// Resolves target names to transport handles.
pub struct Channel<E: Endorser, C: Committer> {
    name: String,
    endorsers: BTreeMap<String, E>,
    committers: BTreeMap<String, C>,
    metrics: Metrics,
}

impl<E: Endorser, C: Committer> Channel<E, C> {
    /// Create a new channel, registering its metrics with `registry`.
    ///
    /// Metrics are prefixed with the channel name, so any number of channels may share a
    /// registry. If multiple targets share a name, the last one registered is kept.
    pub fn new(registry: &mut Registry, cfg: Config<E, C>) -> Self {
        let mut endorsers = BTreeMap::new();
        for endorser in cfg.endorsers {
            let name = endorser.name().to_string();
            if endorsers.insert(name.clone(), endorser).is_some() {
                warn!(channel = %cfg.name, endorser = %name, "duplicate endorser");
            }
        }
        let mut committers = BTreeMap::new();
        for committer in cfg.committers {
            let name = committer.name().to_string();
            if committers.insert(name.clone(), committer).is_some() {
                warn!(channel = %cfg.name, committer = %name, "duplicate committer");
            }
        }
        let metrics = match prefix(&cfg.name) {
            Some(prefix) => Metrics::init(registry.sub_registry_with_prefix(prefix)),
            None => Metrics::init(registry),
        };
        Self {
            name: cfg.name,
            endorsers,
            committers,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the endorser registered as `name`.
    pub fn endorser(&self, name: &str) -> Result<&E, Error> {
        self.endorsers
            .get(name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))
    }

    /// Look up the committer registered as `name`.
    pub fn committer(&self, name: &str) -> Result<&C, Error> {
        self.committers
            .get(name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))
    }

    /// Resolve every name in `targets`, preserving order.
    ///
    /// Fails on the first unknown name, before any target is contacted.
    pub fn endorsers(&self, targets: &[String]) -> Result<Vec<E>, Error> {
        targets
            .iter()
            .map(|name| self.endorser(name).cloned())
            .collect()
    }

    /// Resolve every name in `targets`, preserving order.
    ///
    /// Fails on the first unknown name, before any target is contacted.
    pub fn committers(&self, targets: &[String]) -> Result<Vec<C>, Error> {
        targets
            .iter()
            .map(|name| self.committer(name).cloned())
            .collect()
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Metric prefix for a channel name (characters not allowed in metric names become `_`).
fn prefix(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let mut prefix: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if prefix.starts_with(|c: char| c.is_ascii_digit()) {
        prefix.insert(0, '_');
    }
    Some(prefix)
}
