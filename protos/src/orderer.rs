//! Messages exchanged with ordering services.

use crate::common::Status;

/// Reply to a broadcast envelope.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct BroadcastResponse {
    #[prost(enumeration = "Status", tag = "1")]
    pub status: i32,
    /// Free-form detail, usually populated on failure.
    #[prost(string, tag = "2")]
    pub info: String,
}
