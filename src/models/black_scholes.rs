//! Black-Scholes-Merton pricing kernel
//!
//! Provides:
//! - European option price and Greeks (delta, gamma, vega, theta)
//! - Vectorized variants over an array of spot prices for the Monte
//!   Carlo repricing hot path
//!
//! The vectorized functions apply the identical formulas elementwise and
//! agree with the scalar path to floating tolerance.

use std::f64::consts::PI;

use ndarray::Array1;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::core::{Greeks, OptionType};

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    normal.cdf(x)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, t: f64, r: f64, q: f64, iv: f64) -> f64 {
    ((spot / strike).ln() + (r - q + 0.5 * iv * iv) * t) / (iv * t.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, t: f64, r: f64, q: f64, iv: f64) -> f64 {
    d1(spot, strike, t, r, q, iv) - iv * t.sqrt()
}

/// European option price.
///
/// At `t <= 0` the price collapses to intrinsic value. At `iv <= 0` the
/// price is the discounted intrinsic of the forward.
pub fn price(
    spot: f64,
    strike: f64,
    t: f64,
    r: f64,
    q: f64,
    iv: f64,
    option_type: OptionType,
) -> f64 {
    if t <= 0.0 {
        return option_type.intrinsic(spot, strike);
    }
    if iv <= 0.0 {
        let forward = spot * ((r - q) * t).exp();
        let df = (-r * t).exp();
        return df * option_type.intrinsic(forward, strike);
    }

    let d1 = d1(spot, strike, t, r, q, iv);
    let d2 = d2(spot, strike, t, r, q, iv);

    match option_type {
        OptionType::Call => {
            spot * (-q * t).exp() * norm_cdf(d1) - strike * (-r * t).exp() * norm_cdf(d2)
        }
        OptionType::Put => {
            strike * (-r * t).exp() * norm_cdf(-d2) - spot * (-q * t).exp() * norm_cdf(-d1)
        }
    }
}

/// Vectorized price over an array of spots against one fixed
/// strike/time/vol.
pub fn price_vec(
    spots: &Array1<f64>,
    strike: f64,
    t: f64,
    r: f64,
    q: f64,
    iv: f64,
    option_type: OptionType,
) -> Array1<f64> {
    if t <= 0.0 {
        return spots.mapv(|s| option_type.intrinsic(s, strike));
    }
    if iv <= 0.0 {
        let df = (-r * t).exp();
        let carry = ((r - q) * t).exp();
        return spots.mapv(|s| df * option_type.intrinsic(s * carry, strike));
    }

    let sqrt_t = t.sqrt();
    let df_q = (-q * t).exp();
    let df_r = (-r * t).exp();
    let drift = (r - q + 0.5 * iv * iv) * t;

    spots.mapv(|s| {
        let d1 = ((s / strike).ln() + drift) / (iv * sqrt_t);
        let d2 = d1 - iv * sqrt_t;
        match option_type {
            OptionType::Call => s * df_q * norm_cdf(d1) - strike * df_r * norm_cdf(d2),
            OptionType::Put => strike * df_r * norm_cdf(-d2) - s * df_q * norm_cdf(-d1),
        }
    })
}

/// Option delta. Collapses to a step function at the strike when `t <= 0`.
pub fn delta(
    spot: f64,
    strike: f64,
    t: f64,
    r: f64,
    q: f64,
    iv: f64,
    option_type: OptionType,
) -> f64 {
    if t <= 0.0 || iv <= 0.0 {
        return match option_type {
            OptionType::Call => {
                if spot > strike {
                    1.0
                } else {
                    0.0
                }
            }
            OptionType::Put => {
                if spot < strike {
                    -1.0
                } else {
                    0.0
                }
            }
        };
    }

    let d1 = d1(spot, strike, t, r, q, iv);
    match option_type {
        OptionType::Call => (-q * t).exp() * norm_cdf(d1),
        OptionType::Put => (-q * t).exp() * (norm_cdf(d1) - 1.0),
    }
}

/// Vectorized delta over an array of spots.
pub fn delta_vec(
    spots: &Array1<f64>,
    strike: f64,
    t: f64,
    r: f64,
    q: f64,
    iv: f64,
    option_type: OptionType,
) -> Array1<f64> {
    if t <= 0.0 || iv <= 0.0 {
        return spots.mapv(|s| match option_type {
            OptionType::Call => {
                if s > strike {
                    1.0
                } else {
                    0.0
                }
            }
            OptionType::Put => {
                if s < strike {
                    -1.0
                } else {
                    0.0
                }
            }
        });
    }

    let sqrt_t = t.sqrt();
    let df_q = (-q * t).exp();
    let drift = (r - q + 0.5 * iv * iv) * t;

    spots.mapv(|s| {
        let d1 = ((s / strike).ln() + drift) / (iv * sqrt_t);
        match option_type {
            OptionType::Call => df_q * norm_cdf(d1),
            OptionType::Put => df_q * (norm_cdf(d1) - 1.0),
        }
    })
}

/// Option gamma; identical for calls and puts. Zero at `t <= 0`.
pub fn gamma(spot: f64, strike: f64, t: f64, r: f64, q: f64, iv: f64) -> f64 {
    if t <= 0.0 || iv <= 0.0 {
        return 0.0;
    }
    let d1 = d1(spot, strike, t, r, q, iv);
    (-q * t).exp() * norm_pdf(d1) / (spot * iv * t.sqrt())
}

/// Vectorized gamma over an array of spots.
pub fn gamma_vec(spots: &Array1<f64>, strike: f64, t: f64, r: f64, q: f64, iv: f64) -> Array1<f64> {
    if t <= 0.0 || iv <= 0.0 {
        return Array1::zeros(spots.len());
    }
    let sqrt_t = t.sqrt();
    let df_q = (-q * t).exp();
    let drift = (r - q + 0.5 * iv * iv) * t;

    spots.mapv(|s| {
        let d1 = ((s / strike).ln() + drift) / (iv * sqrt_t);
        df_q * norm_pdf(d1) / (s * iv * sqrt_t)
    })
}

/// Option vega; identical for calls and puts. Units are dollars per unit
/// IV — divide by 100 for a per-vol-point figure. Zero at `t <= 0`.
pub fn vega(spot: f64, strike: f64, t: f64, r: f64, q: f64, iv: f64) -> f64 {
    if t <= 0.0 || iv <= 0.0 {
        return 0.0;
    }
    let d1 = d1(spot, strike, t, r, q, iv);
    spot * (-q * t).exp() * norm_pdf(d1) * t.sqrt()
}

/// Option theta, per calendar day (annual decay / 365). Zero at `t <= 0`.
pub fn theta(
    spot: f64,
    strike: f64,
    t: f64,
    r: f64,
    q: f64,
    iv: f64,
    option_type: OptionType,
) -> f64 {
    if t <= 0.0 || iv <= 0.0 {
        return 0.0;
    }

    let d1 = d1(spot, strike, t, r, q, iv);
    let d2 = d2(spot, strike, t, r, q, iv);
    let sqrt_t = t.sqrt();
    let df_q = (-q * t).exp();
    let df_r = (-r * t).exp();

    let decay = -spot * df_q * norm_pdf(d1) * iv / (2.0 * sqrt_t);
    let annual = match option_type {
        OptionType::Call => decay - r * strike * df_r * norm_cdf(d2) + q * spot * df_q * norm_cdf(d1),
        OptionType::Put => decay + r * strike * df_r * norm_cdf(-d2) - q * spot * df_q * norm_cdf(-d1),
    };
    annual / 365.0
}

/// All first-order Greeks for one leg
pub fn greeks(
    spot: f64,
    strike: f64,
    t: f64,
    r: f64,
    q: f64,
    iv: f64,
    option_type: OptionType,
) -> Greeks {
    Greeks::new(
        delta(spot, strike, t, r, q, iv, option_type),
        gamma(spot, strike, t, r, q, iv),
        vega(spot, strike, t, r, q, iv),
        theta(spot, strike, t, r, q, iv, option_type),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-10);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_bs_price() {
        // ATM call, 20% vol, 1 year, 5% rate
        let call = price(100.0, 100.0, 1.0, 0.05, 0.0, 0.20, OptionType::Call);
        assert!(call > 10.0 && call < 11.0);
    }

    #[test]
    fn test_put_call_parity() {
        for &(spot, strike, t, r, q, iv) in &[
            (100.0, 100.0, 1.0, 0.05, 0.0, 0.20),
            (100.0, 90.0, 0.25, 0.05, 0.01, 0.35),
            (250.0, 300.0, 0.05, 0.03, 0.0003, 0.80),
        ] {
            let call = price(spot, strike, t, r, q, iv, OptionType::Call);
            let put = price(spot, strike, t, r, q, iv, OptionType::Put);
            let parity = spot * (-q * t).exp() - strike * (-r * t).exp();
            assert!(
                (call - put - parity).abs() < 1e-9,
                "parity violated at strike {strike}"
            );
        }
    }

    #[test]
    fn test_expiry_collapse() {
        assert_eq!(price(110.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call), 10.0);
        assert_eq!(price(90.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Put), 10.0);
        assert_eq!(delta(110.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call), 1.0);
        assert_eq!(delta(90.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Put), -1.0);
        assert_eq!(gamma(110.0, 100.0, 0.0, 0.05, 0.0, 0.2), 0.0);
        assert_eq!(vega(110.0, 100.0, 0.0, 0.05, 0.0, 0.2), 0.0);
    }

    #[test]
    fn test_greek_signs() {
        let g = greeks(100.0, 100.0, 0.25, 0.05, 0.0003, 0.40, OptionType::Call);
        assert!(g.delta > 0.5 && g.delta < 0.7);
        assert!(g.gamma > 0.0);
        assert!(g.vega > 0.0);
        assert!(g.theta < 0.0);

        let p = greeks(100.0, 100.0, 0.25, 0.05, 0.0003, 0.40, OptionType::Put);
        assert!(p.delta < 0.0);
        // gamma and vega identical across types
        assert!((p.gamma - g.gamma).abs() < 1e-12);
        assert!((p.vega - g.vega).abs() < 1e-12);
    }

    #[test]
    fn test_vectorized_matches_scalar() {
        let spots = array![80.0, 95.0, 100.0, 105.0, 130.0];
        let (strike, t, r, q, iv) = (100.0, 0.1, 0.05, 0.0003, 0.55);

        for &option_type in &[OptionType::Call, OptionType::Put] {
            let vec_prices = price_vec(&spots, strike, t, r, q, iv, option_type);
            let vec_deltas = delta_vec(&spots, strike, t, r, q, iv, option_type);
            for (i, &s) in spots.iter().enumerate() {
                let sp = price(s, strike, t, r, q, iv, option_type);
                let sd = delta(s, strike, t, r, q, iv, option_type);
                assert_relative_eq!(vec_prices[i], sp, max_relative = 1e-12);
                assert_relative_eq!(vec_deltas[i], sd, max_relative = 1e-12);
            }
        }

        let vec_gammas = gamma_vec(&spots, strike, t, r, q, iv);
        for (i, &s) in spots.iter().enumerate() {
            assert_relative_eq!(vec_gammas[i], gamma(s, strike, t, r, q, iv), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_vectorized_expiry_collapse() {
        let spots = array![90.0, 100.0, 110.0];
        let prices = price_vec(&spots, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call);
        assert_eq!(prices[0], 0.0);
        assert_eq!(prices[2], 10.0);

        let deltas = delta_vec(&spots, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Put);
        assert_eq!(deltas[0], -1.0);
        assert_eq!(deltas[2], 0.0);
    }
}
