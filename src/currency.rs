// Currency module - native-coin balance ledger
//
// Models attached value, refunds and payouts as explicit balance moves so
// that callers (and tests) can observe exact account balances around every
// operation.

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from native-currency operations
#[derive(Error, Debug)]
pub enum CurrencyError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Balance would overflow")]
    BalanceOverflow,
}

/// Native-currency balances, keyed by address
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CurrencyLedger {
    balances: HashMap<Address, u64>,
}

impl CurrencyLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the balance of an address
    pub fn balance_of(&self, owner: Address) -> u64 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    /// Credit an address out of thin air (funding accounts in tests and
    /// at genesis)
    pub fn deposit(&mut self, owner: Address, amount: u64) -> Result<(), CurrencyError> {
        let balance = self.balances.entry(owner).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(CurrencyError::BalanceOverflow)?;
        Ok(())
    }

    /// Move currency between two addresses
    pub fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<(), CurrencyError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(CurrencyError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        if from == to {
            return Ok(());
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(CurrencyError::BalanceOverflow)?;

        self.balances.insert(from, available - amount);
        self.balances.insert(to, to_balance);
        Ok(())
    }

    /// Serialize the ledger to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize a ledger from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        postcard::from_bytes(bytes).ok()
    }
}
