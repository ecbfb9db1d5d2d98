use crate::identity::{Address, RecoverableSignature, Signer};
use crate::multisig::{MultisigError, MultisigRegistry};
use crate::token::Fungible;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Domain tag for transfer-authorization messages
const TRANSFER_DOMAIN: &[u8] = b"msig2of3:transfer:";

/// Digest the second authorizer signs to approve a transfer.
///
/// Binds the ledger identity, the group, the destination, the amount and the
/// group's current nonce; all fields are fixed-width, so no length framing
/// is needed. Including the ledger address makes the signature worthless on
/// any other ledger instance.
pub fn authorization_digest(
    ledger: Address,
    group: Address,
    destination: Address,
    amount: u64,
    nonce: u64,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(TRANSFER_DOMAIN);
    hasher.update(ledger.as_bytes());
    hasher.update(group.as_bytes());
    hasher.update(destination.as_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.update(nonce.to_le_bytes());
    hasher.finalize().into()
}

impl MultisigRegistry {
    /// Execute a transfer out of a group address with 2-of-3 authorization.
    ///
    /// The caller is the first authorizer and must be a group owner; the
    /// detached signature is the second, recovered over
    /// [`authorization_digest`] and required to come from a *different*
    /// owner. `nonce` must equal the group's stored nonce exactly; it is
    /// consumed only after every check and the ledger movement succeed.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_2of3<L: Fungible>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        group_address: Address,
        destination: Address,
        amount: u64,
        nonce: u64,
        signature: &RecoverableSignature,
    ) -> Result<(), MultisigError> {
        if ledger.ledger_address() != self.ledger() {
            return Err(MultisigError::LedgerMismatch {
                expected: self.ledger(),
                got: ledger.ledger_address(),
            });
        }

        let group = self.group(group_address)?;

        if !group.is_owner(caller) {
            return Err(MultisigError::NotAGroupMember(caller));
        }

        let expected_nonce = group.nonce();
        if nonce != expected_nonce {
            return Err(MultisigError::NonceMismatch {
                expected: expected_nonce,
                got: nonce,
            });
        }

        let digest = authorization_digest(self.ledger(), group_address, destination, amount, nonce);
        let signer = Signer::recover_signer(digest, signature)
            .map_err(|e| MultisigError::BadSignature(e.to_string()))?;

        if !group.is_owner(signer) {
            return Err(MultisigError::BadSignature(format!(
                "recovered signer {signer} is not a group owner"
            )));
        }
        if signer == caller {
            return Err(MultisigError::SameAuthorizer);
        }

        // All checks passed; move the funds, then consume the nonce.
        ledger.transfer(group_address, destination, amount)?;
        self.group_mut(group_address)?.bump_nonce();

        debug!(
            ledger = %self.ledger(),
            group = %group_address,
            %destination,
            amount,
            nonce,
            "2-of-3 transfer executed"
        );
        Ok(())
    }
}
