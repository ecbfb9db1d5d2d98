// Token module - ERC20-shaped fungible ledger with priced mint/burn

mod events;
mod interface;
mod ledger;

pub use events::*;
pub use interface::*;
pub use ledger::*;
