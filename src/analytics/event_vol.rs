//! Event variance extraction from the IV term structure
//!
//! Decomposes the front expiry's total implied variance into a pre-event
//! baseline (interpolated from the back expiries) and a single event
//! component. Negative raw event variance is clamped to zero and reported
//! with a severity tag instead of failing the run.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{EvError, EvResult, OptionChain};

/// Trading days per year used for business-day year fractions
pub const TRADING_DAYS: f64 = 252.0;

/// Business-day count between two dates: weekdays in [start, end]
/// inclusive, minus one; zero when `end <= start`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end <= start {
        return 0;
    }
    let mut count = 0i64;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        day = day.succ_opt().expect("date overflow");
    }
    (count - 1).max(0)
}

/// Business-day year fraction with an epsilon floor
pub fn year_fraction(start: NaiveDate, end: NaiveDate, epsilon: f64) -> f64 {
    (business_days(start, end) as f64 / TRADING_DAYS).max(epsilon)
}

/// Severity of a negative raw event variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningLevel {
    Mild,
    Severe,
}

/// How the pre-event total variance was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpMethod {
    /// Linear interpolation of total variance between two back expiries
    TermStructureInterpolation,
    /// Single back expiry: flat-IV assumption
    SinglePoint,
}

/// Event variance decomposition with diagnostics for the regime classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventVariance {
    pub front_iv: f64,
    pub back_iv: f64,
    pub back2_iv: Option<f64>,
    /// Annualized event variance, clamped at zero
    pub event_var: f64,
    /// Unclamped value; negative indicates the back term structure prices
    /// more variance than the front expiry carries
    pub raw_event_var: f64,
    /// Event share of front-expiry total variance, in [0, 1]
    pub event_variance_ratio: f64,
    pub warning: Option<WarningLevel>,
    pub method: InterpMethod,
    /// Event window year fraction (event date to front expiry)
    pub dt_event: f64,
    pub t_front: f64,
    /// front_iv - back_iv
    pub front_back_spread: f64,
    /// Set when the back IV exceeds the front IV pre-event
    pub inversion_note: Option<String>,
}

impl EventVariance {
    /// Annualized event volatility
    pub fn event_vol(&self) -> f64 {
        self.event_var.sqrt()
    }
}

fn linear_interp(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x2 == x1 {
        return y1;
    }
    y1 + (x - x1) / (x2 - x1) * (y2 - y1)
}

/// Decompose the front expiry's total variance into pre-event and event
/// components using total-variance interpolation.
///
/// `today` anchors all year fractions so the computation is a pure
/// function of its inputs. The expiry ordering `event <= front < back1
/// (< back2)` is validated and non-conforming inputs are fatal.
#[allow(clippy::too_many_arguments)]
pub fn event_variance(
    front_chain: &OptionChain,
    back1_chain: &OptionChain,
    back2_chain: Option<&OptionChain>,
    spot: f64,
    today: NaiveDate,
    event_date: NaiveDate,
    epsilon: f64,
) -> EvResult<EventVariance> {
    let front_expiry = front_chain.expiry;
    let back1_expiry = back1_chain.expiry;

    if event_date > front_expiry {
        return Err(EvError::invalid_input(format!(
            "event date {event_date} after front expiry {front_expiry}"
        )));
    }
    if back1_expiry <= front_expiry {
        return Err(EvError::invalid_input(format!(
            "back expiry {back1_expiry} not after front expiry {front_expiry}"
        )));
    }
    if let Some(b2) = back2_chain {
        if b2.expiry <= back1_expiry {
            return Err(EvError::invalid_input(format!(
                "back2 expiry {} not after back1 expiry {back1_expiry}",
                b2.expiry
            )));
        }
    }

    let front_iv = front_chain.atm_iv(spot)?;
    let back_iv = back1_chain.atm_iv(spot)?;

    let t_front = year_fraction(today, front_expiry, epsilon);
    let t_back1 = year_fraction(today, back1_expiry, epsilon);
    let dt_event = year_fraction(event_date, front_expiry, epsilon);

    let t_pre = (t_front - dt_event).max(epsilon);

    let (tv_pre, method, back2_iv) = match back2_chain {
        Some(b2) => {
            let back2_iv = b2.atm_iv(spot)?;
            let t_back2 = year_fraction(today, b2.expiry, epsilon);
            let tv = linear_interp(
                t_back1,
                t_back1 * back_iv * back_iv,
                t_back2,
                t_back2 * back2_iv * back2_iv,
                t_pre,
            );
            (tv, InterpMethod::TermStructureInterpolation, Some(back2_iv))
        }
        None => (
            t_pre * back_iv * back_iv,
            InterpMethod::SinglePoint,
            None,
        ),
    };

    let raw_event_var = (t_front * front_iv * front_iv - tv_pre) / dt_event;
    let magnitude_ratio = raw_event_var.abs() / (front_iv * front_iv).max(epsilon);

    let warning = if raw_event_var < 0.0 {
        let level = if magnitude_ratio > 0.10 {
            WarningLevel::Severe
        } else {
            WarningLevel::Mild
        };
        warn!(
            raw_event_var,
            severity = ?level,
            "negative event variance detected"
        );
        Some(level)
    } else {
        None
    };

    let event_var = raw_event_var.max(0.0);

    // Event share of the front expiry's total variance, used by the
    // backspread gate and the regime classifier (annualized convention).
    let total_front_var = (t_front * front_iv * front_iv).max(epsilon);
    let event_variance_ratio = ((event_var * dt_event) / total_front_var).clamp(0.0, 1.0);

    let front_back_spread = front_iv - back_iv;
    let inversion_note = if back_iv > front_iv {
        Some(format!(
            "inverted term structure: back IV {back_iv:.4} above front IV {front_iv:.4}"
        ))
    } else {
        None
    };

    Ok(EventVariance {
        front_iv,
        back_iv,
        back2_iv,
        event_var,
        raw_event_var,
        event_variance_ratio,
        warning,
        method,
        dt_event,
        t_front,
        front_back_spread,
        inversion_note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OptionQuote, OptionType};

    fn flat_chain(expiry: NaiveDate, iv: f64) -> OptionChain {
        let quotes = vec![
            OptionQuote::new(100.0, OptionType::Call, 4.5, 5.5, iv, 1000, expiry),
            OptionQuote::new(100.0, OptionType::Put, 3.5, 4.5, iv, 1000, expiry),
        ];
        OptionChain::new(expiry, quotes)
    }

    fn dates() -> (NaiveDate, NaiveDate, NaiveDate, NaiveDate, NaiveDate) {
        // Mon 2025-08-04 .. Fri 2025-08-08 .. Fri 2025-08-15 .. Fri 2025-08-22
        (
            NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 22).unwrap(),
        )
    }

    #[test]
    fn test_business_days() {
        let (monday, _, friday, next_friday, _) = dates();
        assert_eq!(business_days(monday, friday), 4);
        assert_eq!(business_days(monday, next_friday), 9);
        assert_eq!(business_days(friday, monday), 0);
        assert_eq!(business_days(monday, monday), 0);
    }

    #[test]
    fn test_flat_term_structure() {
        let (today, event, front, back1, back2) = dates();
        let info = event_variance(
            &flat_chain(front, 0.5),
            &flat_chain(back1, 0.5),
            Some(&flat_chain(back2, 0.5)),
            100.0,
            today,
            event,
            1e-6,
        )
        .unwrap();

        // flat 50% IV everywhere: the event window carries exactly the
        // annualized variance 0.25
        assert!((info.raw_event_var - 0.25).abs() < 1e-9);
        assert!((info.event_var - 0.25).abs() < 1e-9);
        assert!(info.warning.is_none());
        assert_eq!(info.method, InterpMethod::TermStructureInterpolation);
    }

    #[test]
    fn test_negative_event_variance_clamped() {
        let (today, event, front, back1, _) = dates();
        let info = event_variance(
            &flat_chain(front, 0.2),
            &flat_chain(back1, 0.4),
            None,
            100.0,
            today,
            event,
            1e-6,
        )
        .unwrap();

        assert_eq!(info.event_var, 0.0);
        assert!(info.raw_event_var < 0.0);
        assert_eq!(info.warning, Some(WarningLevel::Severe));
        assert_eq!(info.method, InterpMethod::SinglePoint);
        assert!(info.inversion_note.is_some());
        assert_eq!(info.event_variance_ratio, 0.0);
    }

    #[test]
    fn test_event_variance_ratio_in_unit_interval() {
        let (today, event, front, back1, back2) = dates();
        let info = event_variance(
            &flat_chain(front, 0.9),
            &flat_chain(back1, 0.4),
            Some(&flat_chain(back2, 0.38)),
            100.0,
            today,
            event,
            1e-6,
        )
        .unwrap();
        assert!(info.event_variance_ratio > 0.0 && info.event_variance_ratio <= 1.0);
        assert!(info.front_back_spread > 0.0);
        assert!(info.inversion_note.is_none());
    }

    #[test]
    fn test_misordered_expiries_fail() {
        let (today, event, front, back1, _) = dates();
        // back before front
        assert!(event_variance(
            &flat_chain(back1, 0.5),
            &flat_chain(front, 0.5),
            None,
            100.0,
            today,
            event,
            1e-6,
        )
        .is_err());
    }
}
