//! Implied move from the ATM straddle
//!
//! The implied move is the execution-adjusted cost of buying the ATM
//! straddle, expressed as a fraction of spot.

use tracing::warn;

use crate::core::{execution_price, EvError, EvResult, OptionChain, OptionType, Side};

/// Execution-adjusted ATM straddle price / spot.
///
/// Fatal when either side of the straddle is missing from the chain.
/// A wide ATM spread relative to mid is a non-fatal diagnostic.
pub fn implied_move_from_chain(
    chain: &OptionChain,
    spot: f64,
    slippage_pct: f64,
    max_spread_pct: f64,
) -> EvResult<f64> {
    let atm_strike = chain
        .nearest_strike(spot)
        .ok_or_else(|| EvError::data("ATM straddle not found: empty chain"))?;

    let call = chain
        .quote_at(OptionType::Call, atm_strike)
        .ok_or_else(|| EvError::data("ATM straddle not found: missing call"))?;
    let put = chain
        .quote_at(OptionType::Put, atm_strike)
        .ok_or_else(|| EvError::data("ATM straddle not found: missing put"))?;

    for quote in [call, put] {
        match quote.relative_spread() {
            Some(pct) if pct > max_spread_pct => {
                warn!(
                    option_type = %quote.option_type,
                    strike = quote.strike,
                    spread_pct = pct,
                    "ATM spread exceeds {:.0}% of mid",
                    max_spread_pct * 100.0
                );
            }
            None => {
                warn!(
                    option_type = %quote.option_type,
                    strike = quote.strike,
                    "ATM quote has non-positive mid"
                );
            }
            _ => {}
        }
    }

    let call_price = execution_price(call.mid(), call.spread(), Side::Buy, slippage_pct);
    let put_price = execution_price(put.mid(), put.spread(), Side::Buy, slippage_pct);

    Ok((call_price + put_price) / spot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionQuote;
    use chrono::NaiveDate;

    #[test]
    fn test_implied_move_straddle() {
        let expiry = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let chain = OptionChain::new(
            expiry,
            vec![
                // call mid 5.0 spread 1.0, put mid 4.0 spread 1.0
                OptionQuote::new(100.0, OptionType::Call, 4.5, 5.5, 0.6, 1000, expiry),
                OptionQuote::new(100.0, OptionType::Put, 3.5, 4.5, 0.58, 1000, expiry),
            ],
        );
        let implied = implied_move_from_chain(&chain, 100.0, 0.10, 0.10).unwrap();
        // (5.05 + 4.05) / 100
        assert!((implied - 0.091).abs() < 1e-12);
    }

    #[test]
    fn test_missing_put_is_fatal() {
        let expiry = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let chain = OptionChain::new(
            expiry,
            vec![OptionQuote::new(
                100.0,
                OptionType::Call,
                4.5,
                5.5,
                0.6,
                1000,
                expiry,
            )],
        );
        assert!(implied_move_from_chain(&chain, 100.0, 0.10, 0.10).is_err());
    }
}
