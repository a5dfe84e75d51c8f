//! # EV Options - Event Volatility Strategy Analysis
//!
//! A library for decomposing an options-implied volatility term structure
//! around a scheduled price-moving event (earnings, macro prints) into a
//! pre-event baseline and an event-specific variance component, then
//! ranking multi-leg option structures against that decomposition.
//!
//! ## Pipeline
//!
//! 1. **Event variance**: ATM IVs across two or three expiries are
//!    decomposed via total-variance interpolation into pre-event and
//!    event variance.
//! 2. **Simulation**: a seeded ensemble of lognormal terminal-price moves
//!    is calibrated to the event volatility.
//! 3. **Structures**: a baseline catalog (straddle, strangle, spreads,
//!    condor, calendar) plus conditionally-gated structures (ratio
//!    backspreads, back-month calendars, a post-event calendar).
//! 4. **Repricing**: every structure is repriced against the simulated
//!    moves under several IV scenarios and vol-of-vol shocks.
//! 5. **Scoring**: P&L distributions reduce to EV / CVaR / convexity /
//!    robustness, min-max normalized over the batch and ranked.
//! 6. **Regime**: the snapshot is independently classified into named
//!    vol/event/term/gamma regimes and each ranked structure's exposures
//!    are scored for alignment.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ev_options::prelude::*;
//!
//! # fn chains() -> (AnalysisInputs, EngineConfig) { unimplemented!() }
//! let (inputs, config) = chains();
//! let report = run_analysis(&inputs, &config).unwrap();
//!
//! for result in &report.results {
//!     println!("#{} {} score={:.3}", result.rank, result.name, result.score);
//! }
//! println!("regime: {}", report.regime.composite_regime);
//! ```
//!
//! ## What this library does NOT do
//!
//! - Fetch market data (chains and history arrive fully materialized)
//! - Route orders or manage live positions
//! - Model American early exercise or discrete dividends
//! - Guarantee optimal selection: scores are a deterministic,
//!   reproducible ranking of a fixed candidate set, meaningful only
//!   within one run

pub mod alignment;
pub mod analytics;
pub mod core;
pub mod engine;
pub mod models;
pub mod regime;
pub mod simulation;
pub mod strategies;

pub mod prelude {
    pub use crate::alignment::{compute_alignment, AlignmentScore, StrategyExposures};
    pub use crate::analytics::event_vol::{event_variance, EventVariance};
    pub use crate::analytics::historical::DailyClose;
    pub use crate::analytics::implied_move::implied_move_from_chain;
    pub use crate::core::{
        EngineConfig, EvError, EvResult, MarketSnapshot, OptionChain, OptionLeg, OptionQuote,
        OptionType, Side, Strategy,
    };
    pub use crate::engine::{run_analysis, AnalysisInputs, AnalysisReport, ScoringResult};
    pub use crate::models::black_scholes;
    pub use crate::regime::{classify_regime, RegimeClassification};
    pub use crate::simulation::monte_carlo::{simulate_moves, SimulatedMoveSet};
    pub use crate::strategies::registry::StrategyRegistry;
    pub use crate::strategies::scoring::{score_and_rank, RiskClass};
}
