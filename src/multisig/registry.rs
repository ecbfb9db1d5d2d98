use crate::identity::Address;
use crate::token::TokenError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Domain tag for group-address derivation
const GROUP_DOMAIN: &[u8] = b"msig2of3:group:";

/// Errors from multisig operations
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Group already registered for this owner triple")]
    AlreadyRegistered,

    #[error("Address {0} is not a registered group")]
    UnregisteredGroup(Address),

    #[error("Caller {0} is not a member of the group")]
    NotAGroupMember(Address),

    #[error("Bad signature: {0}")]
    BadSignature(String),

    #[error("Second authorizer must differ from the caller")]
    SameAuthorizer,

    #[error("Nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("Wrong ledger: registry bound to {expected}, got {got}")]
    LedgerMismatch { expected: Address, got: Address },

    #[error("Ledger transfer failed: {0}")]
    Transfer(#[from] TokenError),
}

/// A registered owner triple and its replay counter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    owners: [Address; 3],
    nonce: u64,
}

impl Group {
    pub fn owners(&self) -> &[Address; 3] {
        &self.owners
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn is_owner(&self, addr: Address) -> bool {
        self.owners.contains(&addr)
    }

    pub(crate) fn bump_nonce(&mut self) {
        self.nonce += 1;
    }
}

/// Derive the group address for an ordered owner triple on a ledger.
///
/// Pure function of the triple and the ledger identity: the same triple on
/// two distinct ledgers derives two distinct addresses, and overlapping
/// triples (sliding windows over an owner list) never collide.
pub fn derive_group_address(
    ledger: Address,
    owner_a: Address,
    owner_b: Address,
    owner_c: Address,
) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update(GROUP_DOMAIN);
    hasher.update(ledger.as_bytes());
    hasher.update(owner_a.as_bytes());
    hasher.update(owner_b.as_bytes());
    hasher.update(owner_c.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

/// Registry of 2-of-3 groups for one ledger instance.
///
/// Owns the group table and per-group nonces; nothing outside
/// `transfer_2of3` ever mutates a nonce.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultisigRegistry {
    /// The ledger instance this registry is bound to
    ledger: Address,
    groups: HashMap<Address, Group>,
    registered_triples: HashMap<(Address, Address, Address), Address>,
}

impl MultisigRegistry {
    /// Create an empty registry bound to a ledger instance
    pub fn new(ledger: Address) -> Self {
        Self {
            ledger,
            groups: HashMap::new(),
            registered_triples: HashMap::new(),
        }
    }

    /// The ledger this registry is bound to
    pub fn ledger(&self) -> Address {
        self.ledger
    }

    /// Register an ordered owner triple, returning its derived address.
    ///
    /// The exact same ordered triple cannot be registered twice. The new
    /// group's nonce starts at 0.
    pub fn register_group(
        &mut self,
        owner_a: Address,
        owner_b: Address,
        owner_c: Address,
    ) -> Result<Address, MultisigError> {
        let triple = (owner_a, owner_b, owner_c);
        if self.registered_triples.contains_key(&triple) {
            return Err(MultisigError::AlreadyRegistered);
        }

        let address = derive_group_address(self.ledger, owner_a, owner_b, owner_c);
        self.groups.insert(address, Group {
            owners: [owner_a, owner_b, owner_c],
            nonce: 0,
        });
        self.registered_triples.insert(triple, address);

        info!(ledger = %self.ledger, group = %address, "multisig group registered");
        Ok(address)
    }

    /// Look up the derived address of a registered triple
    pub fn group_address(
        &self,
        owner_a: Address,
        owner_b: Address,
        owner_c: Address,
    ) -> Option<Address> {
        self.registered_triples
            .get(&(owner_a, owner_b, owner_c))
            .copied()
    }

    /// Get a registered group by its derived address
    pub fn group(&self, address: Address) -> Result<&Group, MultisigError> {
        self.groups
            .get(&address)
            .ok_or(MultisigError::UnregisteredGroup(address))
    }

    pub(crate) fn group_mut(&mut self, address: Address) -> Result<&mut Group, MultisigError> {
        self.groups
            .get_mut(&address)
            .ok_or(MultisigError::UnregisteredGroup(address))
    }

    /// Current nonce of a registered group
    pub fn nonce(&self, address: Address) -> Result<u64, MultisigError> {
        Ok(self.group(address)?.nonce())
    }

    /// Serialize the registry to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize a registry from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        postcard::from_bytes(bytes).ok()
    }
}
