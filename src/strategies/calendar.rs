//! Calendar spread builder
//!
//! Sells the front ATM call and buys a longer-dated ATM call. The
//! preferred back leg is the 21-45 DTE expiry; the first back expiry is
//! the fallback. The term-spread gate uses abs() so an inverted term
//! structure (back leg closer than the front) still qualifies.

use tracing::{debug, info};

use crate::core::{
    GateConfig, MarketSnapshot, OptionChain, OptionLeg, OptionType, Side, Strategy,
};

/// Which back chain a calendar was built against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackLeg {
    /// 21-45 DTE expiry
    Back3,
    /// First back expiry fallback
    Back1,
}

impl BackLeg {
    pub fn label(&self) -> &'static str {
        match self {
            BackLeg::Back3 => "back3",
            BackLeg::Back1 => "back1",
        }
    }
}

/// Entry gate: pre-event only, with a minimum absolute DTE spread
/// between the front and back legs.
pub fn calendar_conditions_met(snapshot: &MarketSnapshot, gates: &GateConfig) -> bool {
    if snapshot.days_after_event != 0 {
        return false;
    }

    let term_spread_days = (snapshot.back_dte - snapshot.front_dte).abs();
    if term_spread_days < gates.calendar_min_term_spread_days {
        debug!(
            term_spread_days,
            min = gates.calendar_min_term_spread_days,
            "calendar gate: term spread below minimum"
        );
        return false;
    }

    true
}

/// Why the calendar gate rejected the snapshot
pub fn calendar_rejection_reason(snapshot: &MarketSnapshot, gates: &GateConfig) -> String {
    if snapshot.days_after_event != 0 {
        return format!(
            "{}d after event (calendars are pre-event structures)",
            snapshot.days_after_event
        );
    }
    let term_spread_days = (snapshot.back_dte - snapshot.front_dte).abs();
    if term_spread_days < gates.calendar_min_term_spread_days {
        return format!(
            "term spread {}d < {}d minimum",
            term_spread_days, gates.calendar_min_term_spread_days
        );
    }
    "conditions not met".to_string()
}

/// Build a calendar: SELL 1 front ATM call, BUY 1 back ATM call.
/// The back-leg label feeds the strategy name.
pub fn build_calendar(
    front_chain: &OptionChain,
    back_chain: &OptionChain,
    spot: f64,
    back_leg: BackLeg,
) -> Option<Strategy> {
    let atm_strike = front_chain.nearest_strike(spot)?;

    Some(Strategy::new(
        format!("calendar_{}", back_leg.label()),
        vec![
            OptionLeg::new(OptionType::Call, atm_strike, 1, Side::Sell, front_chain.expiry),
            OptionLeg::new(OptionType::Call, atm_strike, 1, Side::Buy, back_chain.expiry),
        ],
    ))
}

/// Pick the preferred back chain: back3 (21-45 DTE) when present and
/// non-empty, back1 otherwise. None only when neither is usable.
pub fn select_back_chain<'a>(
    back1_chain: Option<&'a OptionChain>,
    back3_chain: Option<&'a OptionChain>,
) -> Option<(&'a OptionChain, BackLeg)> {
    if let Some(b3) = back3_chain {
        if !b3.is_empty() {
            return Some((b3, BackLeg::Back3));
        }
    }
    if let Some(b1) = back1_chain {
        if !b1.is_empty() {
            info!("calendar: back3 unavailable, falling back to back1");
            return Some((b1, BackLeg::Back1));
        }
    }
    None
}
