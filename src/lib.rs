// tinyswap - a minimal constant-product exchange engine
//
// The crate is organized around a small set of in-memory ledgers:
// - `currency`: native-coin balances (attached value, refunds, payouts)
// - `token`: an ERC20-shaped fungible ledger with priced mint/burn
// - `exchange`: the constant-product pool, which is itself a fungible
//   ledger over its own liquidity shares
// - `multisig`: 2-of-3 signature-authorized transfers on top of any
//   fungible ledger
//
// Every public operation is an atomic state transition: it either fully
// applies or fails with no mutation. Callers serialize operations.

pub mod currency;
pub mod exchange;
pub mod identity;
pub mod multisig;
pub mod token;
