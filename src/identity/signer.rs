use crate::identity::{Address, Keypair};
use secp256k1::ecdsa::{RecoverableSignature as SecpRecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Invalid signature length: expected 65, got {0}")]
    InvalidLength(usize),

    #[error("Invalid signature bytes: {0}")]
    InvalidBytes(String),

    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Recoverable ECDSA signature: 64 compact bytes plus a one-byte recovery id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    bytes: [u8; 65],
}

impl Serialize for RecoverableSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SignatureVisitor;

        impl<'de> Visitor<'de> for SignatureVisitor {
            type Value = RecoverableSignature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("65 bytes for a recoverable ECDSA signature")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                RecoverableSignature::from_bytes(v).map_err(|e| E::custom(e.to_string()))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(65);
                while let Some(byte) = seq.next_element()? {
                    bytes.push(byte);
                }
                RecoverableSignature::from_bytes(&bytes).map_err(|e| de::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

impl RecoverableSignature {
    /// Get the raw bytes of the signature
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.bytes
    }

    /// Create a signature from raw bytes (64 compact + recovery id)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 65 {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let mut arr = [0u8; 65];
        arr.copy_from_slice(bytes);

        // Validate eagerly so a malformed signature fails at construction
        Self::parse_inner(&arr)?;

        Ok(Self { bytes: arr })
    }

    fn parse_inner(bytes: &[u8; 65]) -> Result<SecpRecoverableSignature, SignatureError> {
        let recovery_id = RecoveryId::from_i32(bytes[64] as i32)
            .map_err(|e| SignatureError::InvalidBytes(e.to_string()))?;
        SecpRecoverableSignature::from_compact(&bytes[..64], recovery_id)
            .map_err(|e| SignatureError::InvalidBytes(e.to_string()))
    }

    fn from_inner(inner: SecpRecoverableSignature) -> Self {
        let (recovery_id, compact) = inner.serialize_compact();
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = recovery_id.to_i32() as u8;
        Self { bytes }
    }

    fn inner(&self) -> Result<SecpRecoverableSignature, SignatureError> {
        Self::parse_inner(&self.bytes)
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.bytes))
    }
}

/// Signing and signer-recovery operations over 32-byte message digests
pub struct Signer;

impl Signer {
    /// Sign a 32-byte digest with a keypair
    pub fn sign_digest(keypair: &Keypair, digest: [u8; 32]) -> RecoverableSignature {
        let secp = Secp256k1::new();
        let message = Message::from_digest(digest);
        let sig = secp.sign_ecdsa_recoverable(&message, keypair.secret_key());
        RecoverableSignature::from_inner(sig)
    }

    /// Recover the signer's address from a digest and signature
    pub fn recover_signer(
        digest: [u8; 32],
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(digest);
        let public_key = secp
            .recover_ecdsa(&message, &signature.inner()?)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        Ok(Address::from_public_key(&public_key))
    }
}
