// Fee-splitting arithmetic, pure functions over basis-point rates.
//
// Rounding policy: `fee_floor` truncates; `gross_up` fixes the net amount
// and rounds the gross (and therefore the fee) up. Both keep the fee within
// one unit of the exact rational fee on the gross amount.

/// Basis points in one whole: a rate of 10_000 is 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

pub(crate) fn div_ceil(numerator: u128, denominator: u128) -> u128 {
    (numerator + denominator - 1) / denominator
}

/// The fee on `amount` at `rate_bps`, truncated toward zero
pub fn fee_floor(rate_bps: u16, amount: u64) -> u64 {
    let exact = rate_bps as u128 * amount as u128 / BPS_DENOMINATOR as u128;
    // rate_bps <= 10_000, so the result never exceeds `amount`
    exact as u64
}

/// Split a gross amount into (net, fee) with the fee truncated
pub fn split(rate_bps: u16, gross: u64) -> (u64, u64) {
    let fee = fee_floor(rate_bps, gross);
    (gross - fee, fee)
}

/// Gross up a net amount: the smallest `gross` whose fee leaves at least
/// `net`, returned as `(gross, fee)`. `None` when the gross overflows u64.
///
/// Requires `rate_bps < 10_000` (a 100% rate has no finite gross).
pub fn gross_up(rate_bps: u16, net: u64) -> Option<(u64, u64)> {
    debug_assert!((rate_bps as u64) < BPS_DENOMINATOR);

    let denominator = (BPS_DENOMINATOR - rate_bps as u64) as u128;
    let gross = div_ceil(net as u128 * BPS_DENOMINATOR as u128, denominator);
    let gross = u64::try_from(gross).ok()?;
    Some((gross, gross - net))
}
