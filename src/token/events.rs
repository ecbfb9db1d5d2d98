use crate::identity::Address;
use serde::{Deserialize, Serialize};

/// Records emitted by a fungible ledger, consumable by observers.
///
/// Mints appear as transfers from `Address::ZERO`, burns as transfers to
/// `Address::ZERO`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    Transfer {
        from: Address,
        to: Address,
        value: u64,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: u64,
    },
}
