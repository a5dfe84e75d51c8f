//! Skew diagnostics from chain IVs
//!
//! 25-delta risk reversal and butterfly, reported alongside the regime
//! classification. Diagnostic only.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{OptionChain, OptionType};
use crate::models::black_scholes;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkewMetrics {
    /// 25d call IV - 25d put IV
    pub rr25: Option<f64>,
    /// 0.5 * (25d call IV + 25d put IV) - ATM IV
    pub bf25: Option<f64>,
}

/// Compute 25-delta risk reversal and butterfly from the chain.
pub fn skew_metrics(chain: &OptionChain, spot: f64, t: f64, r: f64, q: f64) -> SkewMetrics {
    let call_25 = closest_delta_iv(chain, spot, t, r, q, OptionType::Call, 0.25);
    let put_25 = closest_delta_iv(chain, spot, t, r, q, OptionType::Put, -0.25);

    let (Some(call_25), Some(put_25)) = (call_25, put_25) else {
        warn!("25d skew strikes not found");
        return SkewMetrics { rr25: None, bf25: None };
    };

    let atm_iv = chain.atm_iv(spot).unwrap_or(0.0);
    SkewMetrics {
        rr25: Some(call_25 - put_25),
        bf25: Some(0.5 * (call_25 + put_25) - atm_iv),
    }
}

fn closest_delta_iv(
    chain: &OptionChain,
    spot: f64,
    t: f64,
    r: f64,
    q: f64,
    option_type: OptionType,
    target: f64,
) -> Option<f64> {
    chain
        .quotes
        .iter()
        .filter(|quote| quote.option_type == option_type && quote.implied_vol.is_finite())
        .map(|quote| {
            let delta = black_scholes::delta(
                spot,
                quote.strike,
                t,
                r,
                q,
                quote.implied_vol,
                option_type,
            );
            ((delta - target).abs(), quote.implied_vol)
        })
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
        .map(|(_, iv)| iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionQuote;
    use chrono::NaiveDate;

    #[test]
    fn test_skew_metrics() {
        let expiry = NaiveDate::from_ymd_opt(2025, 9, 19).unwrap();
        let mut quotes = Vec::new();
        // put wing priced over the call wing
        for (strike, call_iv, put_iv) in [
            (80.0, 0.52, 0.66),
            (90.0, 0.50, 0.60),
            (100.0, 0.50, 0.50),
            (110.0, 0.48, 0.52),
            (120.0, 0.47, 0.54),
        ] {
            quotes.push(OptionQuote::new(strike, OptionType::Call, 1.0, 1.2, call_iv, 500, expiry));
            quotes.push(OptionQuote::new(strike, OptionType::Put, 1.0, 1.2, put_iv, 500, expiry));
        }
        let chain = OptionChain::new(expiry, quotes);
        let skew = skew_metrics(&chain, 100.0, 0.12, 0.05, 0.0);
        // 25d call sits above spot, 25d put below; put wing richer
        assert!(skew.rr25.unwrap() < 0.0);
        assert!(skew.bf25.is_some());
    }

    #[test]
    fn test_one_sided_chain() {
        let expiry = NaiveDate::from_ymd_opt(2025, 9, 19).unwrap();
        let chain = OptionChain::new(
            expiry,
            vec![OptionQuote::new(110.0, OptionType::Call, 1.0, 1.2, 0.5, 500, expiry)],
        );
        let skew = skew_metrics(&chain, 100.0, 0.12, 0.05, 0.0);
        assert!(skew.rr25.is_none());
        assert!(skew.bf25.is_none());
    }
}
