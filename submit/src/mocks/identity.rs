use super::Error;
use bytes::Bytes;
use ledger_protos::{msp::SerializedIdentity, Message};
use sha2::{Digest, Sha256};

/// A mock [crate::Identity] whose "signature" is the SHA-256 digest of the message.
#[derive(Clone)]
pub struct Identity {
    mspid: String,
    serialized: Bytes,
    fail: bool,
}

impl Identity {
    pub fn new(mspid: &str) -> Self {
        let serialized = SerializedIdentity {
            mspid: mspid.to_string(),
            id_bytes: Bytes::from_static(b"-----BEGIN CERTIFICATE-----"),
        };
        Self {
            mspid: mspid.to_string(),
            serialized: serialized.encode_to_vec().into(),
            fail: false,
        }
    }

    /// Create an identity that refuses to sign.
    pub fn failing(mspid: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(mspid)
        }
    }
}

impl crate::Identity for Identity {
    type Error = Error;

    fn name(&self) -> &str {
        &self.mspid
    }

    fn serialized(&self) -> Bytes {
        self.serialized.clone()
    }

    async fn sign(&self, message: &[u8]) -> Result<Bytes, Error> {
        if self.fail {
            return Err(Error::Signing);
        }
        Ok(Bytes::copy_from_slice(&Sha256::digest(message)))
    }
}
