// Exchange module - constant-product pool over a token/currency pair
//
// The pool custodies both reserves, charges a basis-point fee on both legs
// of every trade, and issues its own fungible liquidity-share token.

mod fees;
mod liquidity;
mod pool;
mod shares;

pub use fees::*;
pub use pool::*;
