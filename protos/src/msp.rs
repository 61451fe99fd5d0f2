//! Membership identities.

use bytes::Bytes;

/// An identity as it appears in signature headers and endorsements.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SerializedIdentity {
    /// Membership service provider that issued the identity.
    #[prost(string, tag = "1")]
    pub mspid: String,
    /// Certificate (PEM) of the identity.
    #[prost(bytes = "bytes", tag = "2")]
    pub id_bytes: Bytes,
}
