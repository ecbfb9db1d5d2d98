// Multisig module - 2-of-3 signature-authorized transfers
//
// A group of three owners gets a deterministic derived address on a specific
// ledger instance. Moving funds out of that address takes two distinct
// authorizers: the caller (an owner) and a detached signature from a second
// owner over a domain-separated, nonce-bound message.

mod authorize;
mod registry;

pub use authorize::*;
pub use registry::*;
