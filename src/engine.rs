//! Analysis engine
//!
//! Single-threaded, purely functional orchestration of the pipeline:
//! chains -> snapshot -> simulated move batches -> structure catalog ->
//! scenario repricing -> scoring -> regime -> alignment. Given identical
//! inputs and seed, every output is bit-reproducible.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alignment::{compute_all_alignments, AlignmentScore, StrategyExposures};
use crate::analytics::event_vol::{event_variance, year_fraction, EventVariance};
use crate::analytics::gamma::gex_summary;
use crate::analytics::historical::{
    distribution_shape, event_move_percentile, extract_event_moves, DailyClose,
};
use crate::analytics::implied_move::implied_move_from_chain;
use crate::analytics::skew::{skew_metrics, SkewMetrics};
use crate::core::{
    execution_price, ChainLookup, EngineConfig, EnrichedLeg, EvError, EvResult, MarketSnapshot,
    NetGreeks, OptionChain, OptionType, Strategy,
};
use crate::models::black_scholes;
use crate::regime::{classify_regime, RegimeClassification};
use crate::simulation::monte_carlo::SimulatedMoveSet;
use crate::strategies::backspreads::backspread_rejection_reason;
use crate::strategies::calendar::{calendar_rejection_reason, select_back_chain, BackLeg};
use crate::strategies::payoff::{entry_cost, expiry_atm_iv, strategy_pnl, RepriceContext};
use crate::strategies::post_event::{
    build_post_event_calendar, compute_post_event_scenarios, post_event_rejection_reason,
};
use crate::strategies::registry::{
    BuildContext, StrategyRegistry, CALENDAR, CALL_BACKSPREAD, POST_EVENT_CALENDAR,
    PUT_BACKSPREAD,
};
use crate::strategies::scoring::{
    compute_metrics, score_and_rank, RiskClass, StrategyMetrics,
};
use crate::strategies::structures::build_strategies;

/// Fully materialized inputs for one analysis run. No component performs
/// I/O; chains and history arrive complete.
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub spot: f64,
    pub today: NaiveDate,
    pub event_date: NaiveDate,
    pub front_chain: OptionChain,
    pub back1_chain: OptionChain,
    /// Second back expiry, for total-variance interpolation
    pub back2_chain: Option<OptionChain>,
    /// 21-45 DTE expiry, preferred calendar back leg
    pub back3_chain: Option<OptionChain>,
    pub history: Vec<DailyClose>,
    /// Past event dates for the realized-move distribution
    pub past_event_dates: Vec<NaiveDate>,
    /// Simulation seed; batches for each shock level derive their own
    pub seed: Option<u64>,
}

/// One ranked structure with every derived metric attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub name: String,
    pub rank: usize,
    pub score: f64,
    pub risk_penalty_applied: bool,
    pub ev: f64,
    pub cvar: f64,
    pub convexity: f64,
    pub robustness: f64,
    pub max_loss: f64,
    pub capital_ratio: f64,
    pub risk: RiskClass,
    pub entry_cost: f64,
    pub scenario_evs: BTreeMap<String, f64>,
    pub legs: Vec<EnrichedLeg>,
    pub net_greeks: NetGreeks,
    pub alignment: AlignmentScore,
    pub strategy: Strategy,
}

/// A conditional structure that did not qualify, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedStrategy {
    pub name: String,
    pub reason: String,
}

/// Full output of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub snapshot: MarketSnapshot,
    pub event_variance: EventVariance,
    pub regime: RegimeClassification,
    /// Ranked results, descending by score
    pub results: Vec<ScoringResult>,
    pub skipped: Vec<SkippedStrategy>,
    pub skew: SkewMetrics,
    /// Spot-move scenario P&L for the post-event calendar, when admitted
    pub post_event_scenarios: Option<BTreeMap<String, f64>>,
}

/// Run the full analysis pipeline.
pub fn run_analysis(inputs: &AnalysisInputs, config: &EngineConfig) -> EvResult<AnalysisReport> {
    let registry = StrategyRegistry::standard()?;
    let spot = inputs.spot;
    let epsilon = config.time_epsilon;

    if inputs.front_chain.expiry < inputs.event_date {
        return Err(EvError::invalid_input(format!(
            "front expiry {} before event date {}",
            inputs.front_chain.expiry, inputs.event_date
        )));
    }

    // Chain filtering. Front and back1 must survive; back2/back3 are
    // optional and quietly dropped when they don't.
    let filters = &config.filters;
    let filter = |chain: &OptionChain| -> OptionChain {
        chain
            .filter_by_moneyness(spot, filters.moneyness_low, filters.moneyness_high)
            .filter_by_liquidity(filters.min_open_interest, filters.max_spread_pct)
    };
    let front_chain = filter(&inputs.front_chain).require_non_empty("front")?;
    let back1_chain = filter(&inputs.back1_chain).require_non_empty("back1")?;
    let back2_chain = inputs
        .back2_chain
        .as_ref()
        .map(filter)
        .filter(|c| !c.is_empty());
    let back3_chain = inputs
        .back3_chain
        .as_ref()
        .map(filter)
        .filter(|c| !c.is_empty());

    // Analytics
    let implied_move = implied_move_from_chain(
        &front_chain,
        spot,
        config.slippage_pct,
        filters.implied_move_max_spread_pct,
    )?;
    let historical_p75 =
        event_move_percentile(&inputs.history, &inputs.past_event_dates, 75.0)?;
    let historical_p90 =
        event_move_percentile(&inputs.history, &inputs.past_event_dates, 90.0).ok();
    let signed_moves = extract_event_moves(&inputs.history, &inputs.past_event_dates);
    let shape = distribution_shape(&signed_moves);

    let event_info = event_variance(
        &front_chain,
        &back1_chain,
        back2_chain.as_ref(),
        spot,
        inputs.today,
        inputs.event_date,
        epsilon,
    )?;
    let event_vol = event_info.event_vol();

    let t_front = year_fraction(inputs.today, front_chain.expiry, epsilon);
    let gex = gex_summary(
        &front_chain,
        spot,
        t_front,
        config.risk_free_rate,
        config.dividend_yield,
        config.contract_multiplier,
        config.gex_range_pct,
    );
    let skew = skew_metrics(
        &front_chain,
        spot,
        t_front,
        config.risk_free_rate,
        config.dividend_yield,
    );

    // Snapshot assembly
    let atm_strike = front_chain
        .nearest_strike(spot)
        .ok_or_else(|| EvError::data("front chain has no strikes"))?;
    let short_delta = black_scholes::delta(
        spot,
        atm_strike,
        t_front,
        config.risk_free_rate,
        config.dividend_yield,
        event_info.front_iv,
        OptionType::Call,
    )
    .abs();

    let snapshot = MarketSnapshot {
        spot,
        implied_move,
        historical_p75,
        historical_p90,
        front_iv: event_info.front_iv,
        back_iv: event_info.back_iv,
        back2_iv: event_info.back2_iv,
        event_variance_ratio: event_info.event_variance_ratio,
        iv_ratio: event_info.front_iv / event_info.back_iv.max(epsilon),
        short_delta,
        days_after_event: (inputs.today - inputs.event_date).num_days().max(0),
        front_dte: (front_chain.expiry - inputs.today).num_days(),
        back_dte: (back1_chain.expiry - inputs.today).num_days(),
        gex_net: gex.net_gex,
        gex_abs: gex.abs_gex,
        mean_abs_move: shape.mean_abs_move,
        median_abs_move: shape.median_abs_move,
        skewness: shape.skewness,
        kurtosis: shape.kurtosis,
    };

    // Seeded move batches, one generator per shock level. N is constant
    // across the grid so EV dispersion is comparable cell to cell.
    let shock_levels = config.shock_levels();
    let mut moves_by_shock: BTreeMap<i32, SimulatedMoveSet> = BTreeMap::new();
    for &shock in &shock_levels {
        let shock_vol = (event_vol * (1.0 + shock as f64 / 100.0)).max(0.0);
        let seed = inputs
            .seed
            .map(|s| (s as i64 + 1000 + shock as i64) as u64);
        moves_by_shock.insert(
            shock,
            SimulatedMoveSet::generate(shock_vol, shock, config.mc_simulations, seed),
        );
    }

    // Structure catalog
    let strangle_offset = implied_move * config.strangle_offset_mult;
    let mut strategies = build_strategies(&front_chain, &back1_chain, spot, strangle_offset)?;

    let (calendar_back, calendar_leg) =
        select_back_chain(Some(&back1_chain), back3_chain.as_ref())
            .ok_or_else(|| EvError::data("no back chain available"))?;

    let ctx_gates = &config.gates;
    let build_ctx = BuildContext {
        front_chain: &front_chain,
        back_chain: calendar_back,
        back_leg: calendar_leg,
        spot,
        gates: ctx_gates,
    };

    let mut skipped = Vec::new();
    let mut post_event_scenarios = None;

    for name in [CALL_BACKSPREAD, PUT_BACKSPREAD, CALENDAR, POST_EVENT_CALENDAR] {
        if registry.should_build(name, &snapshot, ctx_gates)? {
            match name {
                // the baseline catalog already carries the back1 calendar;
                // only a distinct back3 leg adds a new structure
                CALENDAR if calendar_leg == BackLeg::Back1 => continue,
                POST_EVENT_CALENDAR => {
                    let t_long = year_fraction(inputs.today, calendar_back.expiry, epsilon);
                    let pe = build_post_event_calendar(
                        &front_chain,
                        calendar_back,
                        spot,
                        t_front,
                        t_long,
                        config.risk_free_rate,
                        config.dividend_yield,
                        epsilon,
                    )?;
                    post_event_scenarios = Some(compute_post_event_scenarios(
                        &pe,
                        spot,
                        t_front,
                        t_long,
                        config.risk_free_rate,
                        config.dividend_yield,
                        ctx_gates.post_event_long_iv_compression,
                        epsilon,
                    ));
                    strategies.push(pe.strategy);
                    info!(name, "added conditional strategy to pool");
                }
                _ => {
                    if let Some(strategy) = registry.build(name, &build_ctx)? {
                        info!(name = %strategy.name, "added conditional strategy to pool");
                        strategies.push(strategy);
                    } else {
                        skipped.push(SkippedStrategy {
                            name: name.to_string(),
                            reason: "no valid strikes".to_string(),
                        });
                    }
                }
            }
        } else {
            skipped.push(SkippedStrategy {
                name: name.to_string(),
                reason: rejection_reason(name, &snapshot, config),
            });
        }
    }

    // Repricing context over every chain a leg can reference
    let mut all_chains: Vec<&OptionChain> = vec![&front_chain, &back1_chain];
    if let Some(b2) = back2_chain.as_ref() {
        all_chains.push(b2);
    }
    if let Some(b3) = back3_chain.as_ref() {
        all_chains.push(b3);
    }
    let lookup = ChainLookup::from_chains(all_chains.iter().copied());
    let atm_ivs = expiry_atm_iv(&all_chains, spot);
    let reprice_ctx = RepriceContext {
        lookup: &lookup,
        spot,
        front_expiry: front_chain.expiry,
        event_date: inputs.event_date,
        front_iv: event_info.front_iv,
        back_iv: event_info.back_iv,
        expiry_atm_iv: &atm_ivs,
        config,
    };

    // Per-strategy metrics over the scenario x shock grid
    let base_scenario = config.base_scenario().clone();
    let base_moves = &moves_by_shock[&0];
    let mut metrics: Vec<StrategyMetrics> = Vec::with_capacity(strategies.len());
    let mut costs: Vec<f64> = Vec::with_capacity(strategies.len());

    for strategy in &strategies {
        let base_pnls = strategy_pnl(strategy, &base_moves.moves, &base_scenario, &reprice_ctx)?;

        let mut scenario_evs = BTreeMap::new();
        let mut grid_evs = Vec::with_capacity(config.iv_scenarios.len() * shock_levels.len());
        for scenario in &config.iv_scenarios {
            for &shock in &shock_levels {
                let pnls = strategy_pnl(
                    strategy,
                    &moves_by_shock[&shock].moves,
                    scenario,
                    &reprice_ctx,
                )?;
                let ev = mean(&pnls);
                if shock == 0 {
                    scenario_evs.insert(scenario.name.clone(), ev);
                }
                grid_evs.push(ev);
            }
        }

        metrics.push(compute_metrics(
            strategy,
            &base_pnls,
            &grid_evs,
            scenario_evs,
            implied_move,
            historical_p75,
            spot,
            config.contract_multiplier,
            config.convexity_cap,
            config.convexity_eps,
        )?);
        costs.push(entry_cost(strategy, &reprice_ctx)?);
    }

    let cost_by_name: BTreeMap<String, f64> = strategies
        .iter()
        .zip(&costs)
        .map(|(s, &c)| (s.name.clone(), c))
        .collect();

    let ranked = score_and_rank(metrics, &config.scoring);

    // Regime classification and alignment over the ranked population
    let regime = classify_regime(&snapshot);

    let t_back = year_fraction(inputs.today, back1_chain.expiry, epsilon);
    let mut enriched: Vec<(Vec<EnrichedLeg>, NetGreeks)> = Vec::with_capacity(ranked.len());
    for entry in &ranked {
        enriched.push(enrich_legs(
            &entry.metrics.strategy,
            &reprice_ctx,
            t_front,
            t_back,
            front_chain.expiry,
        )?);
    }

    let exposures: Vec<StrategyExposures> = ranked
        .iter()
        .zip(&enriched)
        .map(|(entry, (_, net))| StrategyExposures {
            net_gamma: net.gamma,
            net_vega: net.vega,
            convexity: entry.metrics.convexity,
            cvar: entry.metrics.cvar,
        })
        .collect();
    let alignments = compute_all_alignments(&exposures, &regime);

    let results: Vec<ScoringResult> = ranked
        .into_iter()
        .zip(enriched)
        .zip(alignments)
        .map(|((entry, (legs, net_greeks)), alignment)| {
            let m = entry.metrics;
            ScoringResult {
                name: m.strategy.name.clone(),
                rank: entry.rank,
                score: entry.score,
                risk_penalty_applied: entry.risk_penalty_applied,
                ev: m.ev,
                cvar: m.cvar,
                convexity: m.convexity,
                robustness: m.robustness,
                max_loss: m.max_loss,
                capital_ratio: m.capital_ratio,
                risk: m.risk,
                entry_cost: cost_by_name.get(&m.strategy.name).copied().unwrap_or(0.0),
                scenario_evs: m.scenario_evs,
                legs,
                net_greeks,
                alignment,
                strategy: m.strategy,
            }
        })
        .collect();

    Ok(AnalysisReport {
        snapshot,
        event_variance: event_info,
        regime,
        results,
        skipped,
        skew,
        post_event_scenarios,
    })
}

fn mean(values: &Array1<f64>) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.sum() / values.len() as f64
    }
}

fn rejection_reason(name: &str, snapshot: &MarketSnapshot, config: &EngineConfig) -> String {
    match name {
        CALL_BACKSPREAD | PUT_BACKSPREAD => {
            backspread_rejection_reason(snapshot, &config.gates)
        }
        CALENDAR => calendar_rejection_reason(snapshot, &config.gates),
        POST_EVENT_CALENDAR => post_event_rejection_reason(snapshot, &config.gates),
        _ => "conditions not met".to_string(),
    }
}

/// Per-leg Greeks at entry plus signed net Greeks for the position
fn enrich_legs(
    strategy: &Strategy,
    ctx: &RepriceContext,
    t_front: f64,
    t_back: f64,
    front_expiry: NaiveDate,
) -> EvResult<(Vec<EnrichedLeg>, NetGreeks)> {
    let cfg = ctx.config;
    let mut legs = Vec::with_capacity(strategy.legs.len());
    let mut net = NetGreeks::new();

    for leg in &strategy.legs {
        let data = ctx.lookup.leg_quote(leg)?;
        let t = if leg.expiry == front_expiry { t_front } else { t_back };
        let greeks = black_scholes::greeks(
            ctx.spot,
            leg.strike,
            t,
            cfg.risk_free_rate,
            cfg.dividend_yield,
            data.iv,
            leg.option_type,
        );
        net.add_leg(&greeks, leg.side.sign() * leg.qty as f64);
        legs.push(EnrichedLeg {
            leg: leg.clone(),
            entry_price: execution_price(data.mid, data.spread, leg.side, cfg.slippage_pct),
            iv: data.iv,
            delta: greeks.delta,
            gamma: greeks.gamma,
            vega: greeks.vega,
            theta: greeks.theta,
        });
    }

    Ok((legs, net))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionQuote;

    fn chain(expiry: NaiveDate, atm_iv: f64, spot: f64) -> OptionChain {
        let mut quotes = Vec::new();
        let mut strike = spot * 0.82;
        while strike <= spot * 1.18 {
            // gentle smile around the ATM vol
            let moneyness = ((strike - spot) / spot).abs();
            let iv = atm_iv + 0.2 * moneyness;
            for option_type in [OptionType::Call, OptionType::Put] {
                let price = (spot * 0.05 * (1.0 - moneyness * 3.0)).max(0.4);
                quotes.push(OptionQuote::new(
                    (strike * 2.0).round() / 2.0,
                    option_type,
                    price - 0.02,
                    price + 0.02,
                    iv,
                    1500,
                    expiry,
                ));
            }
            strike += spot * 0.02;
        }
        OptionChain::new(expiry, quotes)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn inputs() -> AnalysisInputs {
        let spot = 100.0;
        AnalysisInputs {
            spot,
            today: day(2025, 8, 4),
            event_date: day(2025, 8, 6),
            front_chain: chain(day(2025, 8, 8), 0.85, spot),
            back1_chain: chain(day(2025, 8, 15), 0.55, spot),
            back2_chain: Some(chain(day(2025, 8, 22), 0.50, spot)),
            back3_chain: Some(chain(day(2025, 9, 5), 0.45, spot)),
            history: vec![
                DailyClose { date: day(2024, 8, 1), close: 80.0 },
                DailyClose { date: day(2024, 8, 2), close: 85.0 },
                DailyClose { date: day(2024, 11, 1), close: 90.0 },
                DailyClose { date: day(2024, 11, 4), close: 84.0 },
                DailyClose { date: day(2025, 2, 3), close: 95.0 },
                DailyClose { date: day(2025, 2, 4), close: 99.0 },
                DailyClose { date: day(2025, 5, 1), close: 97.0 },
                DailyClose { date: day(2025, 5, 2), close: 103.0 },
            ],
            past_event_dates: vec![
                day(2024, 8, 2),
                day(2024, 11, 4),
                day(2025, 2, 4),
                day(2025, 5, 2),
            ],
            seed: Some(42),
        }
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            mc_simulations: 2_000,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_full_pipeline() {
        let report = run_analysis(&inputs(), &fast_config()).unwrap();

        // baseline catalog always present
        assert!(report.results.len() >= 8);
        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        for expected in ["long_straddle", "iron_condor", "calendar"] {
            assert!(names.contains(&expected), "missing {expected}");
        }

        // descending by score, ranks 1..n
        for window in report.results.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
        for (i, result) in report.results.iter().enumerate() {
            assert_eq!(result.rank, i + 1);
            assert!(!result.legs.is_empty());
            assert!(result.legs.iter().all(|l| l.entry_price > 0.0));
            assert!((0.0..=1.0).contains(&result.alignment.score));
            assert_eq!(result.scenario_evs.len(), 3);
        }

        // iron condor carries short wings but is covered
        let condor = report.results.iter().find(|r| r.name == "iron_condor").unwrap();
        assert_eq!(condor.risk, RiskClass::DefinedRisk);

        // snapshot invariants
        assert!(report.snapshot.implied_move > 0.0);
        assert!(report.snapshot.iv_ratio > 1.0);
        assert_eq!(report.snapshot.days_after_event, 0);

        // the post-event calendar cannot qualify pre-event
        assert!(report
            .skipped
            .iter()
            .any(|s| s.name == POST_EVENT_CALENDAR));
        assert!(report.post_event_scenarios.is_none());
    }

    #[test]
    fn test_pipeline_determinism() {
        let config = fast_config();
        let a = run_analysis(&inputs(), &config).unwrap();
        let b = run_analysis(&inputs(), &config).unwrap();

        assert_eq!(a.results.len(), b.results.len());
        for (ra, rb) in a.results.iter().zip(&b.results) {
            assert_eq!(ra.name, rb.name);
            assert_eq!(ra.rank, rb.rank);
            assert_eq!(ra.ev.to_bits(), rb.ev.to_bits());
            assert_eq!(ra.score.to_bits(), rb.score.to_bits());
            assert_eq!(ra.cvar.to_bits(), rb.cvar.to_bits());
        }
        assert_eq!(a.regime.composite_regime, b.regime.composite_regime);
    }

    #[test]
    fn test_event_after_front_expiry_fails() {
        let mut bad = inputs();
        bad.event_date = day(2025, 8, 11);
        assert!(run_analysis(&bad, &fast_config()).is_err());
    }

    #[test]
    fn test_empty_front_chain_fails() {
        let mut bad = inputs();
        bad.front_chain = OptionChain::new(day(2025, 8, 8), vec![]);
        assert!(run_analysis(&bad, &fast_config()).is_err());
    }

    #[test]
    fn test_illiquid_chain_fails_after_filtering() {
        let mut bad = inputs();
        for quote in &mut bad.front_chain.quotes {
            quote.open_interest = 1;
        }
        assert!(run_analysis(&bad, &fast_config()).is_err());
    }

    #[test]
    fn test_post_event_run_admits_post_event_calendar() {
        let mut post = inputs();
        post.today = day(2025, 8, 8);
        post.event_date = day(2025, 8, 6);
        // move expiries forward so the front leg still has DTE
        post.front_chain = chain(day(2025, 8, 15), 0.60, post.spot);
        post.back1_chain = chain(day(2025, 8, 22), 0.50, post.spot);
        post.back2_chain = Some(chain(day(2025, 8, 29), 0.48, post.spot));
        post.back3_chain = Some(chain(day(2025, 9, 12), 0.45, post.spot));

        let report = run_analysis(&post, &fast_config()).unwrap();
        // days_after_event = 2, iv_ratio 1.2: the entry window is open
        assert!(report
            .results
            .iter()
            .any(|r| r.name == "post_event_calendar"));
        assert!(report.post_event_scenarios.is_some());
    }
}
