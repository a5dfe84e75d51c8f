//! Baseline option structures
//!
//! The always-built catalog: single options, straddle, strangle, debit
//! spreads, iron condor, and a front-short/back-long calendar. Strikes
//! come from nearest-strike lookups around spot.

use crate::core::{EvError, EvResult, OptionChain, OptionLeg, OptionType, Side, Strategy};

/// Build the baseline strategy set from the front and back chains.
///
/// `strangle_offset_pct` is the wing offset as a fraction of spot and
/// must lie in (0, 0.5); anything else is a construction failure.
pub fn build_strategies(
    front_chain: &OptionChain,
    back_chain: &OptionChain,
    spot: f64,
    strangle_offset_pct: f64,
) -> EvResult<Vec<Strategy>> {
    if !(strangle_offset_pct > 0.0 && strangle_offset_pct < 0.5) {
        return Err(EvError::invalid_input(format!(
            "strangle offset {strangle_offset_pct} outside (0, 0.5)"
        )));
    }

    let atm = nearest(front_chain, spot)?;
    let offset = spot * strangle_offset_pct;
    let otm_call = nearest(front_chain, spot + offset)?;
    let otm_put = nearest(front_chain, spot - offset)?;
    let wing_call = nearest(front_chain, otm_call * 1.05)?;
    let wing_put = nearest(front_chain, otm_put * 0.95)?;

    let front = front_chain.expiry;
    let back = back_chain.expiry;

    Ok(vec![
        Strategy::new(
            "long_call",
            vec![OptionLeg::new(OptionType::Call, atm, 1, Side::Buy, front)],
        ),
        Strategy::new(
            "long_put",
            vec![OptionLeg::new(OptionType::Put, atm, 1, Side::Buy, front)],
        ),
        Strategy::new(
            "long_straddle",
            vec![
                OptionLeg::new(OptionType::Call, atm, 1, Side::Buy, front),
                OptionLeg::new(OptionType::Put, atm, 1, Side::Buy, front),
            ],
        ),
        Strategy::new(
            "long_strangle",
            vec![
                OptionLeg::new(OptionType::Call, otm_call, 1, Side::Buy, front),
                OptionLeg::new(OptionType::Put, otm_put, 1, Side::Buy, front),
            ],
        ),
        Strategy::new(
            "call_spread",
            vec![
                OptionLeg::new(OptionType::Call, atm, 1, Side::Buy, front),
                OptionLeg::new(OptionType::Call, otm_call, 1, Side::Sell, front),
            ],
        ),
        Strategy::new(
            "put_spread",
            vec![
                OptionLeg::new(OptionType::Put, atm, 1, Side::Buy, front),
                OptionLeg::new(OptionType::Put, otm_put, 1, Side::Sell, front),
            ],
        ),
        Strategy::new(
            "iron_condor",
            vec![
                OptionLeg::new(OptionType::Call, otm_call, 1, Side::Sell, front),
                OptionLeg::new(OptionType::Call, wing_call, 1, Side::Buy, front),
                OptionLeg::new(OptionType::Put, otm_put, 1, Side::Sell, front),
                OptionLeg::new(OptionType::Put, wing_put, 1, Side::Buy, front),
            ],
        ),
        Strategy::new(
            "calendar",
            vec![
                OptionLeg::new(OptionType::Call, atm, 1, Side::Sell, front),
                OptionLeg::new(OptionType::Call, atm, 1, Side::Buy, back),
            ],
        ),
    ])
}

fn nearest(chain: &OptionChain, target: f64) -> EvResult<f64> {
    chain
        .nearest_strike(target)
        .ok_or_else(|| EvError::data("no candidate strikes in chain"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionQuote;
    use chrono::NaiveDate;

    pub(crate) fn dense_chain(expiry: NaiveDate) -> OptionChain {
        let mut quotes = Vec::new();
        let mut strike = 70.0;
        while strike <= 130.0 {
            for option_type in [OptionType::Call, OptionType::Put] {
                quotes.push(OptionQuote::new(
                    strike,
                    option_type,
                    2.0,
                    2.4,
                    0.55,
                    1000,
                    expiry,
                ));
            }
            strike += 2.5;
        }
        OptionChain::new(expiry, quotes)
    }

    #[test]
    fn test_baseline_catalog() {
        let front = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
        let back = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
        let strategies =
            build_strategies(&dense_chain(front), &dense_chain(back), 100.0, 0.05).unwrap();

        assert_eq!(strategies.len(), 8);

        let condor = strategies.iter().find(|s| s.name == "iron_condor").unwrap();
        assert_eq!(condor.legs.len(), 4);

        let calendar = strategies.iter().find(|s| s.name == "calendar").unwrap();
        assert_eq!(calendar.legs[0].side, Side::Sell);
        assert_eq!(calendar.legs[0].expiry, front);
        assert_eq!(calendar.legs[1].side, Side::Buy);
        assert_eq!(calendar.legs[1].expiry, back);

        let strangle = strategies.iter().find(|s| s.name == "long_strangle").unwrap();
        assert!(strangle.legs[0].strike > strangle.legs[1].strike);
    }

    #[test]
    fn test_strangle_offset_validation() {
        let front = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
        let back = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
        let fc = dense_chain(front);
        let bc = dense_chain(back);

        assert!(build_strategies(&fc, &bc, 100.0, 0.0).is_err());
        assert!(build_strategies(&fc, &bc, 100.0, 0.5).is_err());
        assert!(build_strategies(&fc, &bc, 100.0, -0.1).is_err());
        assert!(build_strategies(&fc, &bc, 100.0, 0.49).is_ok());
    }

    #[test]
    fn test_empty_chain_fails() {
        let front = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
        let back = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
        let empty = OptionChain::new(front, vec![]);
        assert!(build_strategies(&empty, &dense_chain(back), 100.0, 0.05).is_err());
    }
}
