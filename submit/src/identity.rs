//! ECDSA (P-256) implementation of [crate::Identity].
//!
//! Signatures are DER encoded and normalized to low-S (peers reject any signature with an `s`
//! value in the upper half of the curve order).

use bytes::Bytes;
use ledger_protos::{msp::SerializedIdentity, Message};
use p256::ecdsa::{signature::Signer as _, Signature, SigningKey, VerifyingKey};
use rand::{CryptoRng, Rng};

/// Error returned when a signature cannot be produced.
pub type Error = p256::ecdsa::Error;

/// An identity backed by a P-256 signing key.
#[derive(Clone)]
pub struct Signer {
    mspid: String,
    serialized: Bytes,
    key: SigningKey,
}

impl Signer {
    /// Create a signer for `key`, issued by `mspid` with the PEM encoded `certificate`.
    pub fn new(mspid: impl Into<String>, certificate: impl Into<Bytes>, key: SigningKey) -> Self {
        let mspid = mspid.into();
        let serialized = SerializedIdentity {
            mspid: mspid.clone(),
            id_bytes: certificate.into(),
        };
        Self {
            mspid,
            serialized: serialized.encode_to_vec().into(),
            key,
        }
    }

    /// Create a signer from a raw 32-byte private key.
    pub fn from_slice(
        mspid: impl Into<String>,
        certificate: impl Into<Bytes>,
        private_key: &[u8],
    ) -> Result<Self, Error> {
        let key = SigningKey::from_slice(private_key)?;
        Ok(Self::new(mspid, certificate, key))
    }

    /// Create a signer with a randomly generated key.
    pub fn random<R: CryptoRng + Rng>(
        rng: &mut R,
        mspid: impl Into<String>,
        certificate: impl Into<Bytes>,
    ) -> Self {
        Self::new(mspid, certificate, SigningKey::random(rng))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }
}

impl crate::Identity for Signer {
    type Error = Error;

    fn name(&self) -> &str {
        &self.mspid
    }

    fn serialized(&self) -> Bytes {
        self.serialized.clone()
    }

    async fn sign(&self, message: &[u8]) -> Result<Bytes, Error> {
        let signature: Signature = self.key.try_sign(message)?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(Bytes::copy_from_slice(signature.to_der().as_bytes()))
    }
}
