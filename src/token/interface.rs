use crate::identity::Address;
use crate::token::TokenError;

/// The fungible-ledger interface shape: balance queries, direct transfers,
/// and allowance-mediated transfers.
///
/// Implemented by [`TokenLedger`](crate::token::TokenLedger) over token
/// balances and by [`Exchange`](crate::exchange::Exchange) over its own
/// liquidity shares, so the exchange is itself consumable as a fungible
/// ledger by other collaborators (the multisig subsystem among them).
pub trait Fungible {
    /// The on-chain identity of this ledger instance
    fn ledger_address(&self) -> Address;

    /// Total outstanding supply
    fn total_supply(&self) -> u64;

    /// Balance of an owner
    fn balance_of(&self, owner: Address) -> u64;

    /// Move `amount` from the caller to `to`
    fn transfer(&mut self, caller: Address, to: Address, amount: u64) -> Result<(), TokenError>;

    /// Set (not increment) the caller's allowance for `spender`
    fn approve(&mut self, caller: Address, spender: Address, amount: u64) -> Result<(), TokenError>;

    /// Remaining allowance granted by `owner` to `spender`
    fn allowance(&self, owner: Address, spender: Address) -> u64;

    /// Move `amount` from `owner` to `to`, spending the caller's allowance
    fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), TokenError>;
}
