use rand::rngs::OsRng;
use secp256k1::{PublicKey as SecpPublicKey, Secp256k1, SecretKey};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key bytes: {0}")]
    InvalidBytes(String),
}

/// secp256k1 keypair used to authorize transactions and sign multisig messages
#[derive(Clone, Debug)]
pub struct Keypair {
    secret_key: SecretKey,
    public_key: SecpPublicKey,
}

impl Keypair {
    /// Generate a fresh random keypair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a keypair from a 32-byte secret key
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != 32 {
            return Err(KeypairError::InvalidLength {
                expected: 32,
                got: bytes.len(),
            });
        }

        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;
        let secp = Secp256k1::new();
        let public_key = SecpPublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Get the secret key (for internal use by the signer)
    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Get the public key
    pub fn public_key(&self) -> &SecpPublicKey {
        &self.public_key
    }

    /// Get the raw secret key bytes
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }
}
