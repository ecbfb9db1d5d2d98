// Liquidity provisioning tests: proportional mints (rounded up),
// proportional burns (rounded down) and their failure paths.

use tinyswap::currency::CurrencyLedger;
use tinyswap::exchange::{Exchange, ExchangeError, ExchangeEvent};
use tinyswap::identity::Address;
use tinyswap::token::{Fungible, TokenLedger};

const TOKEN_PRICE: u64 = 100;

fn setup(
    fee_bps: u16,
    initial_tokens: u64,
    initial_currency: u64,
) -> (CurrencyLedger, TokenLedger, Exchange, Address) {
    let mut currency = CurrencyLedger::new();
    let mut tok = TokenLedger::new(TOKEN_PRICE, 1_000_000_000).unwrap();
    let mut exch = Exchange::new();

    let lp = Address::random();
    currency
        .deposit(lp, initial_tokens * TOKEN_PRICE + initial_currency + 1_000_000)
        .unwrap();
    tok.mint(&mut currency, lp, initial_tokens * TOKEN_PRICE).unwrap();
    tok.approve(lp, exch.address(), initial_tokens).unwrap();
    exch.initialize(&mut tok, &mut currency, lp, fee_bps, initial_tokens, initial_currency)
        .unwrap();

    (currency, tok, exch, lp)
}

/// Fund an account with currency and pre-minted tokens, approved for the
/// exchange
fn provider(
    currency: &mut CurrencyLedger,
    tok: &mut TokenLedger,
    exch: &Exchange,
    eth: u64,
    tokens: u64,
) -> Address {
    let addr = Address::random();
    currency.deposit(addr, eth + tokens * TOKEN_PRICE).unwrap();
    tok.mint(currency, addr, tokens * TOKEN_PRICE).unwrap();
    tok.approve(addr, exch.address(), tokens).unwrap();
    addr
}

// ============================================================================
// MINT
// ============================================================================

#[test]
fn test_mint_at_even_ratio() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 5000);
    let p = provider(&mut currency, &mut tok, &exch, 10_000, 1000);
    let eth_before = currency.balance_of(p);

    // 2500 of 5000 outstanding shares: exactly half the reserves
    let delta = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, 2500, 500, 2500)
        .unwrap();

    assert_eq!(delta.num_tok, 500);
    assert_eq!(delta.num_eth, 2500);
    assert_eq!(exch.share_supply(), 7500);
    assert_eq!(exch.share_balance_of(p), 2500);
    assert_eq!(exch.share_balance_of(lp), 5000);
    assert_eq!(exch.token_reserve(), 1500);
    assert_eq!(exch.currency_reserve(), 7500);
    assert_eq!(tok.balance_of(p), 500);
    assert_eq!(currency.balance_of(p), eth_before - 2500);
    assert_eq!(exch.last_mint_burn_details(), Some(delta));
    assert_eq!(
        exch.events().last(),
        Some(&ExchangeEvent::Transfer { from: Address::ZERO, to: p, value: 2500 })
    );
}

#[test]
fn test_mint_deposits_round_up() {
    let (mut currency, mut tok, mut exch, _lp) = setup(0, 997, 5003);
    let p = provider(&mut currency, &mut tok, &exch, 10_000, 997);

    let token_reserve = exch.token_reserve() as u128;
    let currency_reserve = exch.currency_reserve() as u128;
    let supply = exch.share_supply() as u128;
    let desired = 1000u64;

    let delta = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, desired, 997, 10_000)
        .unwrap();

    // Each leg is the smallest integer at or above the exact pro-rata share
    for (leg, reserve) in [
        (delta.num_tok as u128, token_reserve),
        (delta.num_eth as u128, currency_reserve),
    ] {
        assert!(leg * supply >= reserve * desired as u128);
        assert!((leg - 1) * supply < reserve * desired as u128);
    }
}

#[test]
fn test_mint_slippage_on_either_leg() {
    let (mut currency, mut tok, mut exch, _lp) = setup(30, 1000, 5000);
    let p = provider(&mut currency, &mut tok, &exch, 10_000, 1000);

    // Token leg costs 500, currency leg 2500
    let err = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, 2500, 499, 2500)
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::SlippageExceeded { limit: 499, actual: 500 }
    ));

    let err = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, 2500, 500, 2499)
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::SlippageExceeded { limit: 2499, actual: 2500 }
    ));

    // Nothing moved
    assert_eq!(exch.share_supply(), 5000);
    assert_eq!(exch.token_reserve(), 1000);
    assert_eq!(tok.balance_of(p), 1000);
}

#[test]
fn test_mint_without_approval_leaves_state_untouched() {
    let (mut currency, mut tok, mut exch, _lp) = setup(30, 1000, 5000);
    let p = Address::random();
    currency.deposit(p, 100_000 + 1000 * TOKEN_PRICE).unwrap();
    tok.mint(&mut currency, p, 1000 * TOKEN_PRICE).unwrap();
    // no approve

    let err = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, 2500, 500, 2500)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Token(_)));
    assert_eq!(exch.share_supply(), 5000);
    assert_eq!(exch.token_reserve(), 1000);
    assert_eq!(exch.currency_reserve(), 5000);
}

#[test]
fn test_mint_into_empty_pool_fails() {
    let (mut currency, mut tok, mut exch, _lp) = setup(30, 1000, 0);
    let p = provider(&mut currency, &mut tok, &exch, 10_000, 100);

    // Zero seed currency means zero share supply; pro-rata pricing has no
    // basis
    let err = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, 100, 100, 10_000)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InsufficientLiquidity));
}

// ============================================================================
// BURN
// ============================================================================

#[test]
fn test_burn_at_even_ratio() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 5000);
    let eth_before = currency.balance_of(lp);
    let tok_before = tok.balance_of(lp);

    let delta = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 1000, 200, 1000)
        .unwrap();

    assert_eq!(delta.num_tok, 200);
    assert_eq!(delta.num_eth, 1000);
    assert_eq!(exch.share_supply(), 4000);
    assert_eq!(exch.share_balance_of(lp), 4000);
    assert_eq!(exch.token_reserve(), 800);
    assert_eq!(exch.currency_reserve(), 4000);
    assert_eq!(tok.balance_of(lp), tok_before + 200);
    assert_eq!(currency.balance_of(lp), eth_before + 1000);
    assert_eq!(
        exch.events().last(),
        Some(&ExchangeEvent::Transfer { from: lp, to: Address::ZERO, value: 1000 })
    );
}

#[test]
fn test_burn_payouts_round_down() {
    let (mut currency, mut tok, mut exch, lp) = setup(0, 997, 5003);

    let token_reserve = exch.token_reserve() as u128;
    let currency_reserve = exch.currency_reserve() as u128;
    let supply = exch.share_supply() as u128;
    let burn = 1000u64;

    let delta = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, burn, 0, 0)
        .unwrap();

    // Each leg is the largest integer at or below the exact pro-rata share
    for (leg, reserve) in [
        (delta.num_tok as u128, token_reserve),
        (delta.num_eth as u128, currency_reserve),
    ] {
        assert!(leg * supply <= reserve * burn as u128);
        assert!((leg + 1) * supply > reserve * burn as u128);
    }
}

#[test]
fn test_mint_then_burn_never_profits() {
    let (mut currency, mut tok, mut exch, _lp) = setup(0, 997, 5003);
    let p = provider(&mut currency, &mut tok, &exch, 10_000, 997);

    let minted = exch
        .mint_liquidity_tokens(&mut tok, &mut currency, p, 1000, 997, 10_000)
        .unwrap();
    let burned = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, p, 1000, 0, 0)
        .unwrap();

    // Round-trip loss is at most one unit per leg
    assert!(burned.num_tok <= minted.num_tok);
    assert!(burned.num_eth <= minted.num_eth);
    assert!(minted.num_tok - burned.num_tok <= 1);
    assert!(minted.num_eth - burned.num_eth <= 1);
    assert_eq!(exch.share_balance_of(p), 0);
}

#[test]
fn test_burn_more_shares_than_held() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 5000);

    let err = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 5001, 0, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::InsufficientShares { available: 5000, required: 5001 }
    ));
}

#[test]
fn test_burn_slippage_on_either_leg() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 5000);

    // 1000 shares pay out 200 tokens and 1000 currency
    let err = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 1000, 201, 1000)
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::SlippageExceeded { limit: 201, actual: 200 }
    ));

    let err = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 1000, 200, 1001)
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::SlippageExceeded { limit: 1001, actual: 1000 }
    ));

    assert_eq!(exch.share_balance_of(lp), 5000);
}

#[test]
fn test_burn_everything_empties_pool() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 5000);

    let delta = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 5000, 1000, 5000)
        .unwrap();

    assert_eq!(delta.num_tok, 1000);
    assert_eq!(delta.num_eth, 5000);
    assert_eq!(exch.share_supply(), 0);
    assert_eq!(exch.token_reserve(), 0);
    assert_eq!(exch.currency_reserve(), 0);
    assert_eq!(tok.balance_of(exch.address()), 0);
    assert_eq!(currency.balance_of(exch.address()), 0);
}

#[test]
fn test_burn_on_drained_pool_fails() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 5000);

    exch.burn_liquidity_tokens(&mut tok, &mut currency, lp, 5000, 0, 0)
        .unwrap();
    assert_eq!(exch.share_supply(), 0);

    // With no supply left there is nothing to burn against, zero included
    let err = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 0, 0, 0)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InsufficientLiquidity));

    let err = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 1, 0, 0)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InsufficientLiquidity));
}

#[test]
fn test_burn_on_zero_seed_pool_fails() {
    let (mut currency, mut tok, mut exch, lp) = setup(30, 1000, 0);

    let err = exch
        .burn_liquidity_tokens(&mut tok, &mut currency, lp, 0, 0, 0)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InsufficientLiquidity));
}
