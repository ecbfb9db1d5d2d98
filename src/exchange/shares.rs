// Liquidity shares as a fungible ledger.
//
// The exchange exposes the same interface shape over its own shares as the
// token ledger does over tokens, so anything that consumes a `Fungible`
// ledger (the multisig subsystem included) works on liquidity shares too.

use crate::exchange::pool::{Exchange, ExchangeEvent};
use crate::identity::Address;
use crate::token::{Fungible, TokenError};

impl Exchange {
    /// Balance of liquidity shares held by `owner`
    pub fn share_balance_of(&self, owner: Address) -> u64 {
        self.share_balances.get(&owner).copied().unwrap_or(0)
    }

    /// Total outstanding liquidity shares
    pub fn share_supply(&self) -> u64 {
        self.share_supply
    }

    fn move_shares(&mut self, from: Address, to: Address, amount: u64) -> Result<(), TokenError> {
        let available = self.share_balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        if from != to {
            let to_balance = self
                .share_balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::BalanceOverflow)?;
            self.share_balances.insert(from, available - amount);
            self.share_balances.insert(to, to_balance);
        }

        self.events.push(ExchangeEvent::Transfer {
            from,
            to,
            value: amount,
        });
        Ok(())
    }
}

impl Fungible for Exchange {
    fn ledger_address(&self) -> Address {
        self.address()
    }

    fn total_supply(&self) -> u64 {
        self.share_supply
    }

    fn balance_of(&self, owner: Address) -> u64 {
        self.share_balance_of(owner)
    }

    fn transfer(&mut self, caller: Address, to: Address, amount: u64) -> Result<(), TokenError> {
        self.move_shares(caller, to, amount)
    }

    fn approve(&mut self, caller: Address, spender: Address, amount: u64) -> Result<(), TokenError> {
        self.share_allowances.insert((caller, spender), amount);
        self.events.push(ExchangeEvent::Approval {
            owner: caller,
            spender,
            value: amount,
        });
        Ok(())
    }

    fn allowance(&self, owner: Address, spender: Address) -> u64 {
        self.share_allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
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

        self.move_shares(owner, to, amount)?;
        self.share_allowances.insert((owner, caller), allowed - amount);
        Ok(())
    }
}
