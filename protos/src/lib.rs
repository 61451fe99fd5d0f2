//! Wire schema for ledger transaction proposals, endorsements, and envelopes.
//!
//! Every message mirrors the network's protocol definition: field numbers, field
//! presence, and nesting are part of the compatibility surface and must not change.
//! Messages are declared directly with `prost` derives so no `protoc` is required
//! at build time.
//!
//! # Status
//!
//! `ledger-protos` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod common;
pub mod msp;
pub mod orderer;
pub mod peer;

pub use prost::{DecodeError, Message};
