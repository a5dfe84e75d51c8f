//! Strategy registry: entry-condition gates and builder dispatch
//!
//! Every conditional strategy is registered in two parallel tables keyed
//! by name: one maps name -> gate predicate over the market snapshot,
//! the other maps name -> builder. The tables must carry identical key
//! sets; a mismatch is a startup defect and fails construction, never a
//! silent no-op.

use std::collections::BTreeMap;

use crate::core::{EvError, EvResult, GateConfig, MarketSnapshot, OptionChain, Strategy};

use super::backspreads::{build_call_backspread, build_put_backspread, backspread_conditions_met};
use super::calendar::{build_calendar, calendar_conditions_met, BackLeg};
use super::post_event::post_event_calendar_conditions_met;

/// Gate predicate: pure function of the snapshot, no side effects
pub type GateFn = fn(&MarketSnapshot, &GateConfig) -> bool;

/// Everything a builder may need to construct its legs
pub struct BuildContext<'a> {
    pub front_chain: &'a OptionChain,
    /// Selected back chain (back3 preferred, back1 fallback)
    pub back_chain: &'a OptionChain,
    pub back_leg: BackLeg,
    pub spot: f64,
    pub gates: &'a GateConfig,
}

/// Builder: returns None ("no structure") when no valid strikes exist
pub type BuilderFn = fn(&BuildContext) -> Option<Strategy>;

pub const CALL_BACKSPREAD: &str = "CALL_BACKSPREAD";
pub const PUT_BACKSPREAD: &str = "PUT_BACKSPREAD";
pub const CALENDAR: &str = "CALENDAR";
pub const POST_EVENT_CALENDAR: &str = "POST_EVENT_CALENDAR";

fn build_call_backspread_entry(ctx: &BuildContext) -> Option<Strategy> {
    build_call_backspread(ctx.front_chain, ctx.spot, ctx.gates)
}

fn build_put_backspread_entry(ctx: &BuildContext) -> Option<Strategy> {
    build_put_backspread(ctx.front_chain, ctx.spot, ctx.gates)
}

fn build_calendar_entry(ctx: &BuildContext) -> Option<Strategy> {
    build_calendar(ctx.front_chain, ctx.back_chain, ctx.spot, ctx.back_leg)
}

fn build_post_event_calendar_entry(ctx: &BuildContext) -> Option<Strategy> {
    // Same leg construction as a calendar; the post-event pricing detail
    // is computed by the engine from the chains' ATM IVs.
    build_calendar(ctx.front_chain, ctx.back_chain, ctx.spot, ctx.back_leg)
        .map(|s| Strategy::new("post_event_calendar", s.legs))
}

/// Registry of conditionally-gated strategies
pub struct StrategyRegistry {
    conditions: BTreeMap<&'static str, GateFn>,
    builders: BTreeMap<&'static str, BuilderFn>,
}

impl StrategyRegistry {
    /// Standard registry: backspreads, calendar, post-event calendar.
    pub fn standard() -> EvResult<Self> {
        let mut conditions: BTreeMap<&'static str, GateFn> = BTreeMap::new();
        conditions.insert(CALL_BACKSPREAD, backspread_conditions_met);
        conditions.insert(PUT_BACKSPREAD, backspread_conditions_met);
        conditions.insert(CALENDAR, calendar_conditions_met);
        conditions.insert(POST_EVENT_CALENDAR, post_event_calendar_conditions_met);

        let mut builders: BTreeMap<&'static str, BuilderFn> = BTreeMap::new();
        builders.insert(CALL_BACKSPREAD, build_call_backspread_entry);
        builders.insert(PUT_BACKSPREAD, build_put_backspread_entry);
        builders.insert(CALENDAR, build_calendar_entry);
        builders.insert(POST_EVENT_CALENDAR, build_post_event_calendar_entry);

        Self::from_tables(conditions, builders)
    }

    /// Validate that the two tables are registered together. A name in
    /// one table but not the other fails construction.
    pub fn from_tables(
        conditions: BTreeMap<&'static str, GateFn>,
        builders: BTreeMap<&'static str, BuilderFn>,
    ) -> EvResult<Self> {
        let condition_keys: Vec<&str> = conditions.keys().copied().collect();
        let builder_keys: Vec<&str> = builders.keys().copied().collect();

        if condition_keys != builder_keys {
            let only_conditions: Vec<&str> = condition_keys
                .iter()
                .filter(|k| !builders.contains_key(**k))
                .copied()
                .collect();
            let only_builders: Vec<&str> = builder_keys
                .iter()
                .filter(|k| !conditions.contains_key(**k))
                .copied()
                .collect();
            return Err(EvError::registry(format!(
                "gate/builder tables have mismatched keys; \
                 gates only: {only_conditions:?}, builders only: {only_builders:?}"
            )));
        }

        Ok(Self {
            conditions,
            builders,
        })
    }

    /// Check a named strategy's entry conditions. Unknown names are a
    /// registry error.
    pub fn should_build(
        &self,
        name: &str,
        snapshot: &MarketSnapshot,
        gates: &GateConfig,
    ) -> EvResult<bool> {
        let gate = self
            .conditions
            .get(name)
            .ok_or_else(|| EvError::registry(format!("unregistered strategy: {name}")))?;
        Ok(gate(snapshot, gates))
    }

    /// Build a named strategy. Ok(None) means the builder found no valid
    /// strikes; unknown names are a registry error.
    pub fn build(&self, name: &str, ctx: &BuildContext) -> EvResult<Option<Strategy>> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| EvError::registry(format!("unregistered strategy: {name}")))?;
        Ok(builder(ctx))
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.conditions.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::test_snapshot;

    #[test]
    fn test_standard_registry_in_sync() {
        let registry = StrategyRegistry::standard().unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![CALENDAR, CALL_BACKSPREAD, POST_EVENT_CALENDAR, PUT_BACKSPREAD]
        );
    }

    #[test]
    fn test_mismatched_tables_fail_startup() {
        let mut conditions: BTreeMap<&'static str, GateFn> = BTreeMap::new();
        conditions.insert(CALL_BACKSPREAD, backspread_conditions_met);
        conditions.insert(CALENDAR, calendar_conditions_met);

        let mut builders: BTreeMap<&'static str, BuilderFn> = BTreeMap::new();
        builders.insert(CALL_BACKSPREAD, build_call_backspread_entry);
        // CALENDAR builder missing, PUT_BACKSPREAD gate missing
        builders.insert(PUT_BACKSPREAD, build_put_backspread_entry);

        let err = StrategyRegistry::from_tables(conditions, builders).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("mismatched keys"));
        assert!(msg.contains(CALENDAR));
        assert!(msg.contains(PUT_BACKSPREAD));
    }

    #[test]
    fn test_unknown_name_is_registry_error() {
        let registry = StrategyRegistry::standard().unwrap();
        let snapshot = test_snapshot();
        assert!(registry
            .should_build("IRON_BUTTERFLY", &snapshot, &GateConfig::default())
            .is_err());
    }

    #[test]
    fn test_should_build_dispatches() {
        let registry = StrategyRegistry::standard().unwrap();
        let gates = GateConfig::default();
        let snapshot = test_snapshot();

        // test_snapshot passes the backspread and calendar gates pre-event
        assert!(registry.should_build(CALL_BACKSPREAD, &snapshot, &gates).unwrap());
        assert!(registry.should_build(CALENDAR, &snapshot, &gates).unwrap());
        // post-event calendar requires days_after_event >= 1
        assert!(!registry
            .should_build(POST_EVENT_CALENDAR, &snapshot, &gates)
            .unwrap());
    }
}
