//! Option quote data
//!
//! One quote row per (expiry, type, strike) chain entry, plus the chain
//! container with ATM/nearest-strike lookups and the liquidity and
//! moneyness filters applied before any analytics run.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EvError, EvResult};
use super::option::{strike_key, OptionLeg, OptionType, Side};

/// Option market quote. Immutable, sourced externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub option_type: OptionType,
    pub bid: f64,
    pub ask: f64,
    /// Implied volatility (annualized decimal)
    pub implied_vol: f64,
    pub open_interest: u64,
    pub expiry: NaiveDate,
}

impl OptionQuote {
    pub fn new(
        strike: f64,
        option_type: OptionType,
        bid: f64,
        ask: f64,
        implied_vol: f64,
        open_interest: u64,
        expiry: NaiveDate,
    ) -> Self {
        Self {
            strike,
            option_type,
            bid,
            ask,
            implied_vol,
            open_interest,
            expiry,
        }
    }

    /// Mid price from bid/ask
    pub fn mid(&self) -> f64 {
        0.5 * (self.bid + self.ask)
    }

    /// Bid-ask spread, floored at zero
    pub fn spread(&self) -> f64 {
        (self.ask - self.bid).max(0.0)
    }

    /// Relative spread (spread / mid)
    pub fn relative_spread(&self) -> Option<f64> {
        let mid = self.mid();
        if mid > 0.0 {
            Some(self.spread() / mid)
        } else {
            None
        }
    }
}

/// Chain of quotes for a single expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub expiry: NaiveDate,
    pub quotes: Vec<OptionQuote>,
}

impl OptionChain {
    pub fn new(expiry: NaiveDate, quotes: Vec<OptionQuote>) -> Self {
        Self { expiry, quotes }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Strike closest to target, over all quotes
    pub fn nearest_strike(&self, target: f64) -> Option<f64> {
        self.quotes
            .iter()
            .min_by(|a, b| {
                let da = (a.strike - target).abs();
                let db = (b.strike - target).abs();
                da.partial_cmp(&db).unwrap()
            })
            .map(|q| q.strike)
    }

    /// Strike closest to target among quotes of one type
    pub fn nearest_strike_of(&self, target: f64, option_type: OptionType) -> Option<f64> {
        self.quotes
            .iter()
            .filter(|q| q.option_type == option_type)
            .min_by(|a, b| {
                let da = (a.strike - target).abs();
                let db = (b.strike - target).abs();
                da.partial_cmp(&db).unwrap()
            })
            .map(|q| q.strike)
    }

    /// Sorted strikes of one type
    pub fn strikes_of(&self, option_type: OptionType) -> Vec<f64> {
        let mut strikes: Vec<f64> = self
            .quotes
            .iter()
            .filter(|q| q.option_type == option_type)
            .map(|q| q.strike)
            .collect();
        strikes.sort_by(|a, b| a.partial_cmp(b).unwrap());
        strikes.dedup_by(|a, b| strike_key(*a) == strike_key(*b));
        strikes
    }

    /// Quote for (type, strike), exact strike match
    pub fn quote_at(&self, option_type: OptionType, strike: f64) -> Option<&OptionQuote> {
        let key = strike_key(strike);
        self.quotes
            .iter()
            .find(|q| q.option_type == option_type && strike_key(q.strike) == key)
    }

    /// At-the-money implied vol: find the strike minimizing |K - spot|,
    /// average the implied vols of all quotes at exactly that strike.
    pub fn atm_iv(&self, spot: f64) -> EvResult<f64> {
        let atm_strike = self
            .nearest_strike(spot)
            .ok_or_else(|| EvError::data("ATM IV not available: empty chain"))?;
        let key = strike_key(atm_strike);
        let ivs: Vec<f64> = self
            .quotes
            .iter()
            .filter(|q| strike_key(q.strike) == key && q.implied_vol.is_finite())
            .map(|q| q.implied_vol)
            .collect();
        if ivs.is_empty() {
            return Err(EvError::data("ATM IV not available"));
        }
        Ok(ivs.iter().sum::<f64>() / ivs.len() as f64)
    }

    /// Filter by strike moneyness band around spot
    pub fn filter_by_moneyness(&self, spot: f64, low: f64, high: f64) -> OptionChain {
        let min_strike = spot * low;
        let max_strike = spot * high;
        let quotes = self
            .quotes
            .iter()
            .filter(|q| q.strike >= min_strike && q.strike <= max_strike)
            .cloned()
            .collect();
        OptionChain::new(self.expiry, quotes)
    }

    /// Filter by open interest and spread percentage of mid.
    /// Quotes with a non-positive mid are dropped.
    pub fn filter_by_liquidity(&self, min_oi: u64, max_spread_pct: f64) -> OptionChain {
        let before = self.quotes.len();
        let quotes: Vec<OptionQuote> = self
            .quotes
            .iter()
            .filter(|q| {
                q.open_interest >= min_oi
                    && q.relative_spread()
                        .map(|s| s <= max_spread_pct)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        debug!(
            expiry = %self.expiry,
            kept = quotes.len(),
            dropped = before - quotes.len(),
            "liquidity filter"
        );
        OptionChain::new(self.expiry, quotes)
    }

    /// Fatal when the chain is empty after filtering
    pub fn require_non_empty(self, label: &str) -> EvResult<OptionChain> {
        if self.quotes.is_empty() {
            Err(EvError::data(format!(
                "{label} chain empty after filtering"
            )))
        } else {
            Ok(self)
        }
    }
}

/// Execution price adjusted for slippage: crossing `slippage_pct` of the
/// half-spread, up for buys and down for sells.
pub fn execution_price(mid: f64, spread: f64, side: Side, slippage_pct: f64) -> f64 {
    let adjustment = 0.5 * spread * slippage_pct;
    match side {
        Side::Buy => mid + adjustment,
        Side::Sell => mid - adjustment,
    }
}

/// Vectorized execution price over an array of mids against one spread
pub fn execution_price_vec(
    mids: &ndarray::Array1<f64>,
    spread: f64,
    side: Side,
    slippage_pct: f64,
) -> ndarray::Array1<f64> {
    let adjustment = 0.5 * spread * slippage_pct;
    match side {
        Side::Buy => mids.mapv(|m| m + adjustment),
        Side::Sell => mids.mapv(|m| m - adjustment),
    }
}

/// Per-leg pricing data resolved from a chain
#[derive(Debug, Clone, Copy)]
pub struct LegQuote {
    pub mid: f64,
    pub spread: f64,
    pub iv: f64,
}

/// (expiry, type, strike) -> quote lookup built across one or more chains.
/// Every leg priced by the payoff engine must resolve here exactly once.
#[derive(Debug, Clone)]
pub struct ChainLookup {
    map: HashMap<(NaiveDate, OptionType, u64), LegQuote>,
}

impl ChainLookup {
    pub fn from_chains<'a>(chains: impl IntoIterator<Item = &'a OptionChain>) -> Self {
        let mut map = HashMap::new();
        for chain in chains {
            for q in &chain.quotes {
                map.insert(
                    (q.expiry, q.option_type, strike_key(q.strike)),
                    LegQuote {
                        mid: q.mid(),
                        spread: q.spread(),
                        iv: q.implied_vol,
                    },
                );
            }
        }
        Self { map }
    }

    /// Resolve a leg's quote; missing data during repricing is fatal.
    pub fn leg_quote(&self, leg: &OptionLeg) -> EvResult<LegQuote> {
        self.map.get(&leg.key()).copied().ok_or_else(|| {
            EvError::data(format!(
                "missing option data for leg: {} {} {}",
                leg.option_type, leg.strike, leg.expiry
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
