//! Option and strategy value types
//!
//! Defines the immutable building blocks of a position:
//! - OptionType: Call/Put with intrinsic-value helper
//! - Side: Buy/Sell
//! - OptionLeg: one contract leg (type, strike, quantity, side, expiry)
//! - Strategy: a named, ordered tuple of legs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Execution side of a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Sign applied to leg value: +1 bought, -1 sold
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    /// The side used to close a position opened on this side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Single option leg. Immutable after construction; pricing enrichment
/// produces an [`EnrichedLeg`] companion record rather than mutating legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub option_type: OptionType,
    pub strike: f64,
    pub qty: u32,
    pub side: Side,
    pub expiry: NaiveDate,
}

impl OptionLeg {
    pub fn new(
        option_type: OptionType,
        strike: f64,
        qty: u32,
        side: Side,
        expiry: NaiveDate,
    ) -> Self {
        Self {
            option_type,
            strike,
            qty,
            side,
            expiry,
        }
    }

    /// Chain lookup key for this leg
    pub fn key(&self) -> (NaiveDate, OptionType, u64) {
        (self.expiry, self.option_type, strike_key(self.strike))
    }
}

/// Leg with per-leg pricing data attached after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedLeg {
    pub leg: OptionLeg,
    /// Execution-adjusted entry price per contract
    pub entry_price: f64,
    /// Implied volatility used for the leg
    pub iv: f64,
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
}

/// Strategy: a named, ordered set of legs. Owns no chain data; legs
/// reference strikes/expiries that must resolve in the chain at pricing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub legs: Vec<OptionLeg>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, legs: Vec<OptionLeg>) -> Self {
        Self {
            name: name.into(),
            legs,
        }
    }

    /// All legs of a given type and side
    pub fn legs_of(&self, option_type: OptionType, side: Side) -> impl Iterator<Item = &OptionLeg> {
        self.legs
            .iter()
            .filter(move |l| l.option_type == option_type && l.side == side)
    }
}

/// Fixed-point strike key so strikes can be used in hash maps.
/// Strikes are quoted in cents at most, so 1e-4 resolution is enough.
pub fn strike_key(strike: f64) -> u64 {
    (strike * 10_000.0).round() as u64
}
