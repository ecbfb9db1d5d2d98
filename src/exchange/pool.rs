use crate::currency::{CurrencyError, CurrencyLedger};
use crate::exchange::fees::{div_ceil, fee_floor, gross_up, split, BPS_DENOMINATOR};
use crate::identity::Address;
use crate::token::{Fungible, TokenError, TokenLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from exchange operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Exchange already initialized")]
    AlreadyInitialized,

    #[error("Exchange not initialized")]
    NotInitialized,

    #[error("Fee rate out of range: {0} bps")]
    InvalidFeeRate(u16),

    #[error("Wrong token ledger: expected {expected}, got {got}")]
    TokenMismatch { expected: Address, got: Address },

    #[error("Slippage exceeded: limit {limit}, actual {actual}")]
    SlippageExceeded { limit: u64, actual: u64 },

    #[error("Insufficient liquidity for the requested trade")]
    InsufficientLiquidity,

    #[error("Insufficient shares: available {available}, required {required}")]
    InsufficientShares { available: u64, required: u64 },

    #[error("Amount would overflow")]
    BalanceOverflow,

    #[error("Token operation failed: {0}")]
    Token(#[from] TokenError),

    #[error("Currency movement failed: {0}")]
    Currency(#[from] CurrencyError),
}

/// Fee legs of a single trade, emitted with every buy and sell.
///
/// `actual_payment` is the currency that actually changed hands;
/// `actual_eth_fee` the currency-leg fee retained by the pool;
/// `actual_token_fee` the token-leg fee retained by the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub actual_payment: u64,
    pub actual_eth_fee: u64,
    pub actual_token_fee: u64,
}

/// Deposit/payout legs of a liquidity mint or burn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityDelta {
    pub num_tok: u64,
    pub num_eth: u64,
}

/// Records emitted by the exchange, consumable by observers.
///
/// `Transfer` and `Approval` are the exchange's own share-ledger records;
/// mints of shares appear as transfers from `Address::ZERO`, burns as
/// transfers to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    FeeDetails(FeeBreakdown),
    MintBurnDetails(LiquidityDelta),
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

/// Constant-product exchange.
///
/// Custodies a token reserve and a native-currency reserve, prices trades on
/// the product of the two, and levies a basis-point fee on both legs of each
/// trade. The exchange is simultaneously a fungible ledger over its own
/// liquidity shares (see the `Fungible` impl in `shares.rs`).
///
/// Invariant: `token_reserve` mirrors the token ledger's balance for the
/// exchange address, and `currency_reserve` mirrors the exchange's own
/// currency balance. Reserves are never tracked apart from real custody.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exchange {
    address: Address,
    /// The bound token ledger, set at initialize
    token_address: Option<Address>,
    fee_rate_bps: u16,
    pub(crate) token_reserve: u64,
    pub(crate) currency_reserve: u64,
    pub(crate) share_supply: u64,
    pub(crate) share_balances: HashMap<Address, u64>,
    pub(crate) share_allowances: HashMap<(Address, Address), u64>,
    initialized: bool,
    pub(crate) events: Vec<ExchangeEvent>,
}

impl Exchange {
    /// Deploy a new, uninitialized exchange with a fresh random address
    pub fn new() -> Self {
        Self {
            address: Address::random(),
            token_address: None,
            fee_rate_bps: 0,
            token_reserve: 0,
            currency_reserve: 0,
            share_supply: 0,
            share_balances: HashMap::new(),
            share_allowances: HashMap::new(),
            initialized: false,
            events: Vec::new(),
        }
    }

    /// The exchange's own on-chain identity
    pub fn address(&self) -> Address {
        self.address
    }

    /// The bound token ledger's address, once initialized
    pub fn token_address(&self) -> Option<Address> {
        self.token_address
    }

    pub fn fee_rate_bps(&self) -> u16 {
        self.fee_rate_bps
    }

    pub fn token_reserve(&self) -> u64 {
        self.token_reserve
    }

    pub fn currency_reserve(&self) -> u64 {
        self.currency_reserve
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// All emitted records, oldest first
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    /// The most recently emitted fee record
    pub fn last_fee_details(&self) -> Option<FeeBreakdown> {
        self.events.iter().rev().find_map(|e| match e {
            ExchangeEvent::FeeDetails(details) => Some(*details),
            _ => None,
        })
    }

    /// The most recently emitted liquidity record
    pub fn last_mint_burn_details(&self) -> Option<LiquidityDelta> {
        self.events.iter().rev().find_map(|e| match e {
            ExchangeEvent::MintBurnDetails(delta) => Some(*delta),
            _ => None,
        })
    }

    /// One-time activation: seed both reserves and mint the initial shares.
    ///
    /// Pulls `initial_tokens` from the caller (who must have approved the
    /// exchange on the token ledger) and `initial_currency` of attached
    /// value. The seed share supply equals the seeded currency amount.
    pub fn initialize(
        &mut self,
        token: &mut TokenLedger,
        currency: &mut CurrencyLedger,
        caller: Address,
        fee_rate_bps: u16,
        initial_tokens: u64,
        initial_currency: u64,
    ) -> Result<(), ExchangeError> {
        if self.initialized {
            return Err(ExchangeError::AlreadyInitialized);
        }
        if fee_rate_bps as u64 >= BPS_DENOMINATOR {
            return Err(ExchangeError::InvalidFeeRate(fee_rate_bps));
        }

        self.ensure_currency(currency, caller, initial_currency)?;

        // The token pull performs its own allowance/balance checks; nothing
        // has been mutated yet if it fails.
        token.transfer_from(self.address, caller, self.address, initial_tokens)?;
        currency.transfer(caller, self.address, initial_currency)?;

        self.token_address = Some(token.ledger_address());
        self.fee_rate_bps = fee_rate_bps;
        self.token_reserve = initial_tokens;
        self.currency_reserve = initial_currency;
        self.share_supply = initial_currency;
        self.share_balances.insert(caller, initial_currency);
        self.initialized = true;
        self.events.push(ExchangeEvent::Transfer {
            from: Address::ZERO,
            to: caller,
            value: initial_currency,
        });

        info!(
            exchange = %self.address,
            token = %token.ledger_address(),
            fee_rate_bps,
            initial_tokens,
            initial_currency,
            "exchange initialized"
        );
        Ok(())
    }

    /// Buy tokens with attached currency.
    ///
    /// The currency price for `desired_tokens` comes from the constant
    /// product at pre-trade reserves, grossed up by the fee rate; any
    /// attached value above the actual payment stays with the caller. The
    /// token-leg fee is withheld from delivery and retained in the reserve.
    pub fn buy_tokens(
        &mut self,
        token: &mut TokenLedger,
        currency: &mut CurrencyLedger,
        caller: Address,
        desired_tokens: u64,
        max_currency: u64,
    ) -> Result<FeeBreakdown, ExchangeError> {
        self.ensure_ready(token)?;

        // A drained pool (zero-seeded, or fully withdrawn) cannot price trades
        if self.token_reserve == 0 || self.currency_reserve == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        if desired_tokens >= self.token_reserve {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let k = self.token_reserve as u128 * self.currency_reserve as u128;
        let remaining_tokens = (self.token_reserve - desired_tokens) as u128;

        // Minimal currency the curve demands for the requested tokens
        let required = div_ceil(k, remaining_tokens) - self.currency_reserve as u128;
        let net_payment = u64::try_from(required).map_err(|_| ExchangeError::BalanceOverflow)?;

        let (actual_payment, actual_eth_fee) =
            gross_up(self.fee_rate_bps, net_payment).ok_or(ExchangeError::BalanceOverflow)?;
        let actual_token_fee = fee_floor(self.fee_rate_bps, desired_tokens);
        let tokens_out = desired_tokens - actual_token_fee;

        if actual_payment > max_currency {
            return Err(ExchangeError::SlippageExceeded {
                limit: max_currency,
                actual: actual_payment,
            });
        }

        let new_currency_reserve = self
            .currency_reserve
            .checked_add(actual_payment)
            .ok_or(ExchangeError::BalanceOverflow)?;

        self.ensure_currency(currency, caller, actual_payment)?;

        token.transfer(self.address, caller, tokens_out)?;
        currency.transfer(caller, self.address, actual_payment)?;

        self.currency_reserve = new_currency_reserve;
        self.token_reserve -= tokens_out;

        let details = FeeBreakdown {
            actual_payment,
            actual_eth_fee,
            actual_token_fee,
        };
        self.events.push(ExchangeEvent::FeeDetails(details));

        debug!(
            exchange = %self.address,
            %caller,
            desired_tokens,
            actual_payment,
            actual_eth_fee,
            actual_token_fee,
            "buy executed"
        );
        Ok(details)
    }

    /// Sell tokens for currency.
    ///
    /// The full `sell_amount` enters the token reserve; the token-leg fee is
    /// bookkeeping only (it is excluded from curve pricing but physically
    /// stays in the reserve). The currency-leg fee is withheld from the
    /// gross payout.
    pub fn sell_tokens(
        &mut self,
        token: &mut TokenLedger,
        currency: &mut CurrencyLedger,
        caller: Address,
        sell_amount: u64,
        min_currency: u64,
    ) -> Result<FeeBreakdown, ExchangeError> {
        self.ensure_ready(token)?;

        if self.token_reserve == 0 || self.currency_reserve == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let actual_token_fee = fee_floor(self.fee_rate_bps, sell_amount);
        let priced_in = (sell_amount - actual_token_fee) as u128;

        let k = self.token_reserve as u128 * self.currency_reserve as u128;
        let new_tokens = self
            .token_reserve
            .checked_add(sell_amount)
            .ok_or(ExchangeError::BalanceOverflow)? as u128;

        // Gross payout the curve allows for the priced-in portion
        let kept = div_ceil(k, self.token_reserve as u128 + priced_in);
        let gross_payout = (self.currency_reserve as u128 - kept) as u64;

        let (actual_payment, actual_eth_fee) = split(self.fee_rate_bps, gross_payout);

        if actual_payment < min_currency {
            return Err(ExchangeError::SlippageExceeded {
                limit: min_currency,
                actual: actual_payment,
            });
        }

        // The pull performs allowance/balance checks; the payout below is
        // covered by custody. Rule out recipient-side overflow first.
        currency
            .balance_of(caller)
            .checked_add(actual_payment)
            .ok_or(ExchangeError::BalanceOverflow)?;

        token.transfer_from(self.address, caller, self.address, sell_amount)?;
        currency.transfer(self.address, caller, actual_payment)?;

        self.token_reserve = new_tokens as u64;
        self.currency_reserve -= actual_payment;

        let details = FeeBreakdown {
            actual_payment,
            actual_eth_fee,
            actual_token_fee,
        };
        self.events.push(ExchangeEvent::FeeDetails(details));

        debug!(
            exchange = %self.address,
            %caller,
            sell_amount,
            actual_payment,
            actual_eth_fee,
            actual_token_fee,
            "sell executed"
        );
        Ok(details)
    }

    /// Serialize the exchange to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize an exchange from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        postcard::from_bytes(bytes).ok()
    }

    pub(crate) fn ensure_ready(&self, token: &TokenLedger) -> Result<(), ExchangeError> {
        if !self.initialized {
            return Err(ExchangeError::NotInitialized);
        }

        // Reject calls made against a ledger other than the bound one
        let expected = self.token_address.ok_or(ExchangeError::NotInitialized)?;
        if token.ledger_address() != expected {
            return Err(ExchangeError::TokenMismatch {
                expected,
                got: token.ledger_address(),
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_currency(
        &self,
        currency: &CurrencyLedger,
        owner: Address,
        required: u64,
    ) -> Result<(), ExchangeError> {
        let available = currency.balance_of(owner);
        if available < required {
            return Err(ExchangeError::Currency(CurrencyError::InsufficientBalance {
                available,
                required,
            }));
        }
        Ok(())
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
