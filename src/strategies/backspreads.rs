//! Ratio backspread builders
//!
//! A backspread is a 1x2 ratio spread: SELL 1 near-ATM option, BUY 2 OTM
//! options of the same type. It profits from a large directional move
//! while capping losses near the short strike.
//!
//! Entry conditions (all must hold):
//! - iv_ratio (front_iv / back_iv) >= 1.40
//! - event_variance_ratio >= 0.50
//! - implied_move <= historical_p75 * 0.90
//! - short_delta >= 0.08
//! - back_dte in [21, 45]

use tracing::{debug, warn};

use crate::core::{
    GateConfig, MarketSnapshot, OptionChain, OptionLeg, OptionType, Side, Strategy,
};

/// Entry gate shared by call and put backspreads.
pub fn backspread_conditions_met(snapshot: &MarketSnapshot, gates: &GateConfig) -> bool {
    let iv_ok = snapshot.iv_ratio >= gates.backspread_min_iv_ratio;
    let event_ok = snapshot.event_variance_ratio >= gates.backspread_min_event_var_ratio;
    let pricing_ok =
        snapshot.implied_move <= snapshot.historical_p75 * gates.backspread_max_implied_over_p75;
    let delta_ok = snapshot.short_delta >= gates.backspread_min_short_delta;
    let dte_ok = (gates.backspread_dte_min..=gates.backspread_dte_max)
        .contains(&snapshot.back_dte);

    if !iv_ok {
        debug!(
            iv_ratio = snapshot.iv_ratio,
            min = gates.backspread_min_iv_ratio,
            "backspread gate: iv_ratio below minimum"
        );
    }
    if !event_ok {
        debug!(
            event_variance_ratio = snapshot.event_variance_ratio,
            min = gates.backspread_min_event_var_ratio,
            "backspread gate: event variance ratio below minimum"
        );
    }
    if !pricing_ok {
        debug!(
            implied_move = snapshot.implied_move,
            p75 = snapshot.historical_p75,
            "backspread gate: implied move overpriced vs P75"
        );
    }
    if !delta_ok {
        debug!(
            short_delta = snapshot.short_delta,
            min = gates.backspread_min_short_delta,
            "backspread gate: short delta below minimum"
        );
    }
    if !dte_ok {
        debug!(
            back_dte = snapshot.back_dte,
            "backspread gate: back DTE outside window"
        );
    }

    iv_ok && event_ok && pricing_ok && delta_ok && dte_ok
}

/// Human-readable reasons a backspread was not admitted
pub fn backspread_rejection_reason(snapshot: &MarketSnapshot, gates: &GateConfig) -> String {
    let mut reasons = Vec::new();
    if snapshot.iv_ratio < gates.backspread_min_iv_ratio {
        reasons.push(format!(
            "IV ratio {:.2} < {:.2} required",
            snapshot.iv_ratio, gates.backspread_min_iv_ratio
        ));
    }
    if snapshot.event_variance_ratio < gates.backspread_min_event_var_ratio {
        reasons.push(format!(
            "event var ratio {:.2} < {:.2} required",
            snapshot.event_variance_ratio, gates.backspread_min_event_var_ratio
        ));
    }
    if snapshot.implied_move > snapshot.historical_p75 * gates.backspread_max_implied_over_p75 {
        reasons.push(format!(
            "implied move {:.3} > P75x{:.2} (overpriced)",
            snapshot.implied_move, gates.backspread_max_implied_over_p75
        ));
    }
    if snapshot.short_delta < gates.backspread_min_short_delta {
        reasons.push(format!(
            "short delta {:.3} < {:.2} required",
            snapshot.short_delta, gates.backspread_min_short_delta
        ));
    }
    if !(gates.backspread_dte_min..=gates.backspread_dte_max).contains(&snapshot.back_dte) {
        reasons.push(format!(
            "back DTE {}d outside [{}, {}]",
            snapshot.back_dte, gates.backspread_dte_min, gates.backspread_dte_max
        ));
    }
    if reasons.is_empty() {
        "conditions not met".to_string()
    } else {
        reasons.join("; ")
    }
}

/// Build a 1x2 call backspread: SELL ATM call, BUY 2 OTM calls.
/// Returns None when no long strike satisfies the wing-width constraint.
pub fn build_call_backspread(
    front_chain: &OptionChain,
    spot: f64,
    gates: &GateConfig,
) -> Option<Strategy> {
    build_backspread(front_chain, spot, OptionType::Call, "call_backspread", gates)
}

/// Build a 1x2 put backspread: SELL ATM put, BUY 2 OTM puts.
pub fn build_put_backspread(
    front_chain: &OptionChain,
    spot: f64,
    gates: &GateConfig,
) -> Option<Strategy> {
    build_backspread(front_chain, spot, OptionType::Put, "put_backspread", gates)
}

fn build_backspread(
    chain: &OptionChain,
    spot: f64,
    option_type: OptionType,
    name: &str,
    gates: &GateConfig,
) -> Option<Strategy> {
    let (short_strike, long_strike) = select_backspread_strikes(chain, spot, option_type, gates)?;
    let (sell_qty, buy_qty) = gates.backspread_ratio;

    Some(Strategy::new(
        name,
        vec![
            OptionLeg::new(option_type, short_strike, sell_qty, Side::Sell, chain.expiry),
            OptionLeg::new(option_type, long_strike, buy_qty, Side::Buy, chain.expiry),
        ],
    ))
}

/// Short strike is the nearest strike to spot of the given type; long
/// strike is the first strike at least the minimum wing width beyond it
/// in the OTM direction (above for calls, below for puts).
fn select_backspread_strikes(
    chain: &OptionChain,
    spot: f64,
    option_type: OptionType,
    gates: &GateConfig,
) -> Option<(f64, f64)> {
    let short_strike = chain.nearest_strike_of(spot, option_type)?;
    let strikes = chain.strikes_of(option_type);

    let long_strike = match option_type {
        OptionType::Call => strikes
            .iter()
            .copied()
            .find(|&k| k >= short_strike + gates.backspread_min_wing_width),
        OptionType::Put => strikes
            .iter()
            .rev()
            .copied()
            .find(|&k| k <= short_strike - gates.backspread_min_wing_width),
    };

    match long_strike {
        Some(long) => Some((short_strike, long)),
        None => {
            warn!(
                %option_type,
                short_strike,
                "backspread: no OTM strike beyond minimum wing width"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::test_snapshot;
    use crate::core::OptionQuote;
    use chrono::NaiveDate;

    fn chain_with_strikes(strikes: &[f64]) -> OptionChain {
        let expiry = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
        let quotes = strikes
            .iter()
            .flat_map(|&k| {
                [OptionType::Call, OptionType::Put].map(|option_type| {
                    OptionQuote::new(k, option_type, 2.0, 2.4, 0.6, 1000, expiry)
                })
            })
            .collect();
        OptionChain::new(expiry, quotes)
    }

    fn passing_snapshot() -> MarketSnapshot {
        // test_snapshot passes every backspread condition:
        // iv_ratio 1.6, evr 0.6, implied 0.06 <= 0.08*0.9, delta 0.52, dte 33
        test_snapshot()
    }

    #[test]
    fn test_gate_passes() {
        assert!(backspread_conditions_met(
            &passing_snapshot(),
            &GateConfig::default()
        ));
    }

    #[test]
    fn test_short_delta_boundary() {
        let gates = GateConfig::default();

        let mut at_boundary = passing_snapshot();
        at_boundary.short_delta = 0.08;
        assert!(backspread_conditions_met(&at_boundary, &gates));

        let mut below = passing_snapshot();
        below.short_delta = 0.079;
        assert!(!backspread_conditions_met(&below, &gates));
        assert!(backspread_rejection_reason(&below, &gates).contains("short delta"));
    }

    #[test]
    fn test_dte_window() {
        let gates = GateConfig::default();
        for (dte, expected) in [(20, false), (21, true), (45, true), (46, false)] {
            let mut snap = passing_snapshot();
            snap.back_dte = dte;
            assert_eq!(backspread_conditions_met(&snap, &gates), expected);
        }
    }

    #[test]
    fn test_strike_selection() {
        let gates = GateConfig::default();
        let chain = chain_with_strikes(&[90.0, 95.0, 100.0, 102.5, 105.0, 110.0]);

        let call_bs = build_call_backspread(&chain, 100.0, &gates).unwrap();
        assert_eq!(call_bs.legs[0].strike, 100.0);
        // first strike >= 100 + 5
        assert_eq!(call_bs.legs[1].strike, 105.0);
        assert_eq!(call_bs.legs[1].qty, 2);

        let put_bs = build_put_backspread(&chain, 100.0, &gates).unwrap();
        assert_eq!(put_bs.legs[0].strike, 100.0);
        assert_eq!(put_bs.legs[1].strike, 95.0);
    }

    #[test]
    fn test_no_wing_returns_none() {
        let gates = GateConfig::default();
        // no strike 5 points above the ATM short
        let chain = chain_with_strikes(&[98.0, 100.0, 102.0]);
        assert!(build_call_backspread(&chain, 100.0, &gates).is_none());
    }
}
