use crate::currency::{CurrencyError, CurrencyLedger};
use crate::identity::Address;
use crate::token::{Fungible, TokenEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors from fungible-ledger operations
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Insufficient allowance: allowed {allowed}, required {required}")]
    InsufficientAllowance { allowed: u64, required: u64 },

    #[error("Maximum supply exceeded: supply {supply}, requested {requested}, cap {max_supply}")]
    MaxSupplyExceeded {
        supply: u64,
        requested: u64,
        max_supply: u64,
    },

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Token price must be non-zero")]
    ZeroPrice,

    #[error("Currency movement failed: {0}")]
    Currency(#[from] CurrencyError),
}

/// Fungible token ledger.
///
/// Tokens are minted against attached native currency at a fixed price per
/// token and burned back for a refund at the same price. Total supply is
/// capped. The ledger owns the currency collected from mints; burns are
/// refunded out of that balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenLedger {
    /// On-chain identity of this ledger instance
    address: Address,
    /// Native-currency price of one token
    price: u64,
    /// Maximum total supply
    max_supply: u64,
    total_supply: u64,
    balances: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address), u64>,
    /// Append-only journal of emitted records
    events: Vec<TokenEvent>,
}

impl TokenLedger {
    /// Deploy a new token ledger with a fresh random address
    pub fn new(price: u64, max_supply: u64) -> Result<Self, TokenError> {
        if price == 0 {
            return Err(TokenError::ZeroPrice);
        }

        Ok(Self {
            address: Address::random(),
            price,
            max_supply,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            events: Vec::new(),
        })
    }

    /// Native-currency price of one token
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Maximum total supply
    pub fn max_supply(&self) -> u64 {
        self.max_supply
    }

    /// All emitted records, oldest first
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// The most recently emitted record
    pub fn last_event(&self) -> Option<&TokenEvent> {
        self.events.last()
    }

    /// Mint tokens for attached currency: the caller pays `value` and
    /// receives `value / price` tokens (integer division; any remainder
    /// stays with the ledger).
    pub fn mint(
        &mut self,
        currency: &mut CurrencyLedger,
        caller: Address,
        value: u64,
    ) -> Result<u64, TokenError> {
        let minted = value / self.price;

        let new_supply = self
            .total_supply
            .checked_add(minted)
            .ok_or(TokenError::BalanceOverflow)?;
        if new_supply > self.max_supply {
            return Err(TokenError::MaxSupplyExceeded {
                supply: self.total_supply,
                requested: minted,
                max_supply: self.max_supply,
            });
        }

        let new_balance = self
            .balance_of(caller)
            .checked_add(minted)
            .ok_or(TokenError::BalanceOverflow)?;

        // Pull the payment last so a failed pull leaves the ledger untouched
        currency.transfer(caller, self.address, value)?;

        self.total_supply = new_supply;
        self.balances.insert(caller, new_balance);
        self.events.push(TokenEvent::Transfer {
            from: Address::ZERO,
            to: caller,
            value: minted,
        });

        debug!(ledger = %self.address, %caller, minted, "minted tokens");
        Ok(minted)
    }

    /// Burn tokens, refunding `amount * price` currency to the caller
    pub fn burn(
        &mut self,
        currency: &mut CurrencyLedger,
        caller: Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(caller);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let refund = amount
            .checked_mul(self.price)
            .ok_or(TokenError::BalanceOverflow)?;

        currency.transfer(self.address, caller, refund)?;

        self.total_supply -= amount;
        self.balances.insert(caller, available - amount);
        self.events.push(TokenEvent::Transfer {
            from: caller,
            to: Address::ZERO,
            value: amount,
        });

        debug!(ledger = %self.address, %caller, amount, "burned tokens");
        Ok(())
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: u64) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        if from != to {
            let to_balance = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::BalanceOverflow)?;
            self.balances.insert(from, available - amount);
            self.balances.insert(to, to_balance);
        }

        self.events.push(TokenEvent::Transfer {
            from,
            to,
            value: amount,
        });
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

impl Fungible for TokenLedger {
    fn ledger_address(&self) -> Address {
        self.address
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }

    fn balance_of(&self, owner: Address) -> u64 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, caller: Address, to: Address, amount: u64) -> Result<(), TokenError> {
        self.move_balance(caller, to, amount)
    }

    fn approve(&mut self, caller: Address, spender: Address, amount: u64) -> Result<(), TokenError> {
        self.allowances.insert((caller, spender), amount);
        self.events.push(TokenEvent::Approval {
            owner: caller,
            spender,
            value: amount,
        });
        Ok(())
    }

    fn allowance(&self, owner: Address, spender: Address) -> u64 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(owner, caller);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                allowed,
                required: amount,
            });
        }

        self.move_balance(owner, to, amount)?;
        self.allowances.insert((owner, caller), allowed - amount);
        Ok(())
    }
}
