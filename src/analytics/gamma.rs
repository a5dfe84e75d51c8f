//! Dealer gamma exposure (GEX)
//!
//! Aggregates open-interest-weighted option gamma over a strike band
//! around spot. Sign convention: calls contribute negative GEX (dealers
//! short calls), puts contribute positive GEX (dealers short puts), so
//! put-heavy positioning can flip net GEX positive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{strike_key, OptionChain, OptionType};
use crate::models::black_scholes;

/// Net/absolute GEX and strike-level diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GexSummary {
    pub net_gex: f64,
    pub abs_gex: f64,
    /// Strike where cumulative GEX crosses zero, linearly interpolated
    pub gamma_flip: Option<f64>,
    /// Flip distance from spot in percent
    pub flip_distance_pct: Option<f64>,
    /// Top strikes by |GEX|, descending
    pub top_gamma_strikes: Vec<(f64, f64)>,
}

/// Compute the GEX summary over strikes within `gex_range_pct` of spot.
#[allow(clippy::too_many_arguments)]
pub fn gex_summary(
    chain: &OptionChain,
    spot: f64,
    t: f64,
    r: f64,
    q: f64,
    contract_multiplier: f64,
    gex_range_pct: f64,
) -> GexSummary {
    let (lower, upper) = if gex_range_pct > 0.0 {
        (spot * (1.0 - gex_range_pct), spot * (1.0 + gex_range_pct))
    } else {
        (f64::MIN, f64::MAX)
    };

    let mut gex_by_strike: BTreeMap<u64, (f64, f64)> = BTreeMap::new();
    let mut net_gex = 0.0;
    let mut abs_gex = 0.0;

    for quote in &chain.quotes {
        if quote.strike < lower || quote.strike > upper {
            continue;
        }
        let gamma = black_scholes::gamma(spot, quote.strike, t, r, q, quote.implied_vol);
        let sign = match quote.option_type {
            OptionType::Call => -1.0,
            OptionType::Put => 1.0,
        };
        let gex = sign * gamma * quote.open_interest as f64 * contract_multiplier * spot * spot;

        net_gex += gex;
        abs_gex += gex.abs();
        let entry = gex_by_strike
            .entry(strike_key(quote.strike))
            .or_insert((quote.strike, 0.0));
        entry.1 += gex;
    }

    let per_strike: Vec<(f64, f64)> = gex_by_strike.values().copied().collect();
    let gamma_flip = find_gamma_flip(&per_strike);
    let flip_distance_pct = gamma_flip.map(|flip| (flip - spot) / spot * 100.0);

    GexSummary {
        net_gex,
        abs_gex,
        gamma_flip,
        flip_distance_pct,
        top_gamma_strikes: top_gamma_strikes(&per_strike, 3),
    }
}

/// Strike where cumulative GEX crosses zero, or None without a crossing.
/// Input must be sorted ascending by strike.
pub fn find_gamma_flip(gex_by_strike: &[(f64, f64)]) -> Option<f64> {
    let mut cumulative = Vec::with_capacity(gex_by_strike.len());
    let mut running = 0.0;
    for &(strike, gex) in gex_by_strike {
        running += gex;
        cumulative.push((strike, running));
    }

    for window in cumulative.windows(2) {
        let (k0, g0) = window[0];
        let (k1, g1) = window[1];
        if g0 * g1 < 0.0 {
            let flip = k0 + (k1 - k0) * g0.abs() / (g0.abs() + g1.abs());
            return Some((flip * 100.0).round() / 100.0);
        }
    }
    None
}

/// Top N strikes by absolute GEX, descending
pub fn top_gamma_strikes(gex_by_strike: &[(f64, f64)], n: usize) -> Vec<(f64, f64)> {
    let mut entries: Vec<(f64, f64)> = gex_by_strike.to_vec();
    entries.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap());
    entries.truncate(n);
    entries
}
