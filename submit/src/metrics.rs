use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Metric label that indicates how a target handled a request.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Status {
    /// The target accepted the request.
    Success,
    /// The target replied with a non-success status.
    Rejected,
    /// The target could not be reached (or timed out).
    Unreachable,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct Label {
    status: Status,
}

/// Metrics for a [crate::Channel].
#[derive(Clone, Default)]
pub struct Metrics {
    /// Number of proposals sent to endorsers
    pub proposals: Counter,
    /// Number of endorsement responses by status
    pub endorsements: Family<Label, Counter>,
    /// Number of broadcast attempts by status
    pub broadcasts: Family<Label, Counter>,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given registry.
    pub fn init(registry: &mut Registry) -> Self {
        let metrics = Metrics::default();
        registry.register(
            "proposals",
            "Number of proposals sent to endorsers",
            metrics.proposals.clone(),
        );
        registry.register(
            "endorsements",
            "Number of endorsement responses by status",
            metrics.endorsements.clone(),
        );
        registry.register(
            "broadcasts",
            "Number of broadcast attempts by status",
            metrics.broadcasts.clone(),
        );
        metrics
    }

    pub fn endorsement(&self, status: Status) {
        self.endorsements.get_or_create(&Label { status }).inc();
    }

    pub fn broadcast(&self, status: Status) {
        self.broadcasts.get_or_create(&Label { status }).inc();
    }
}
