use crate::currency::CurrencyLedger;
use crate::exchange::fees::div_ceil;
use crate::exchange::pool::{Exchange, ExchangeError, ExchangeEvent, LiquidityDelta};
use crate::identity::Address;
use crate::token::{Fungible, TokenLedger};
use tracing::debug;

impl Exchange {
    /// Mint liquidity shares against a proportional deposit of both legs.
    ///
    /// Deposits round up (the pool never under-collects): against the
    /// pre-mint supply, `num_tok = ceil(token_reserve * shares / supply)`
    /// and likewise for the currency leg. Minting is fee-free.
    pub fn mint_liquidity_tokens(
        &mut self,
        token: &mut TokenLedger,
        currency: &mut CurrencyLedger,
        caller: Address,
        desired_shares: u64,
        max_tokens: u64,
        max_currency: u64,
    ) -> Result<LiquidityDelta, ExchangeError> {
        self.ensure_ready(token)?;

        if self.share_supply == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let supply = self.share_supply as u128;
        let num_tok = div_ceil(
            self.token_reserve as u128 * desired_shares as u128,
            supply,
        );
        let num_eth = div_ceil(
            self.currency_reserve as u128 * desired_shares as u128,
            supply,
        );
        let num_tok = u64::try_from(num_tok).map_err(|_| ExchangeError::BalanceOverflow)?;
        let num_eth = u64::try_from(num_eth).map_err(|_| ExchangeError::BalanceOverflow)?;

        if num_tok > max_tokens {
            return Err(ExchangeError::SlippageExceeded {
                limit: max_tokens,
                actual: num_tok,
            });
        }
        if num_eth > max_currency {
            return Err(ExchangeError::SlippageExceeded {
                limit: max_currency,
                actual: num_eth,
            });
        }

        let new_supply = self
            .share_supply
            .checked_add(desired_shares)
            .ok_or(ExchangeError::BalanceOverflow)?;
        let new_token_reserve = self
            .token_reserve
            .checked_add(num_tok)
            .ok_or(ExchangeError::BalanceOverflow)?;
        let new_currency_reserve = self
            .currency_reserve
            .checked_add(num_eth)
            .ok_or(ExchangeError::BalanceOverflow)?;
        let new_balance = self
            .share_balance_of(caller)
            .checked_add(desired_shares)
            .ok_or(ExchangeError::BalanceOverflow)?;

        self.ensure_currency(currency, caller, num_eth)?;

        // The token pull performs allowance/balance checks; the currency
        // move was validated above.
        token.transfer_from(self.address(), caller, self.address(), num_tok)?;
        currency.transfer(caller, self.address(), num_eth)?;

        self.token_reserve = new_token_reserve;
        self.currency_reserve = new_currency_reserve;
        self.share_supply = new_supply;
        self.share_balances.insert(caller, new_balance);

        let delta = LiquidityDelta { num_tok, num_eth };
        self.events.push(ExchangeEvent::MintBurnDetails(delta));
        self.events.push(ExchangeEvent::Transfer {
            from: Address::ZERO,
            to: caller,
            value: desired_shares,
        });

        debug!(
            exchange = %self.address(),
            %caller,
            desired_shares,
            num_tok,
            num_eth,
            "liquidity minted"
        );
        Ok(delta)
    }

    /// Burn liquidity shares for a proportional payout of both legs.
    ///
    /// Payouts round down against the pre-burn supply (the pool never
    /// over-pays). Burning is fee-free.
    pub fn burn_liquidity_tokens(
        &mut self,
        token: &mut TokenLedger,
        currency: &mut CurrencyLedger,
        caller: Address,
        burn_shares: u64,
        min_tokens: u64,
        min_currency: u64,
    ) -> Result<LiquidityDelta, ExchangeError> {
        self.ensure_ready(token)?;

        // Same guard as mint: a drained pool has no supply to burn against
        if self.share_supply == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let held = self.share_balance_of(caller);
        if held < burn_shares {
            return Err(ExchangeError::InsufficientShares {
                available: held,
                required: burn_shares,
            });
        }

        let supply = self.share_supply as u128;
        let num_tok =
            (self.token_reserve as u128 * burn_shares as u128 / supply) as u64;
        let num_eth =
            (self.currency_reserve as u128 * burn_shares as u128 / supply) as u64;

        if num_tok < min_tokens {
            return Err(ExchangeError::SlippageExceeded {
                limit: min_tokens,
                actual: num_tok,
            });
        }
        if num_eth < min_currency {
            return Err(ExchangeError::SlippageExceeded {
                limit: min_currency,
                actual: num_eth,
            });
        }

        // Both payouts are covered by custody (reserves mirror real
        // balances); rule out recipient-side overflow before moving anything.
        currency
            .balance_of(caller)
            .checked_add(num_eth)
            .ok_or(ExchangeError::BalanceOverflow)?;

        token.transfer(self.address(), caller, num_tok)?;
        currency.transfer(self.address(), caller, num_eth)?;

        self.token_reserve -= num_tok;
        self.currency_reserve -= num_eth;
        self.share_supply -= burn_shares;
        self.share_balances.insert(caller, held - burn_shares);

        let delta = LiquidityDelta { num_tok, num_eth };
        self.events.push(ExchangeEvent::MintBurnDetails(delta));
        self.events.push(ExchangeEvent::Transfer {
            from: caller,
            to: Address::ZERO,
            value: burn_shares,
        });

        debug!(
            exchange = %self.address(),
            %caller,
            burn_shares,
            num_tok,
            num_eth,
            "liquidity burned"
        );
        Ok(delta)
    }
}
