//! Regime-strategy structural alignment
//!
//! Scores how well each ranked structure's Greek and tail exposures match
//! the detected regime. Orthogonal to ranking and fully deterministic.

use serde::{Deserialize, Serialize};

use crate::analytics::historical::percentile;
use crate::regime::{CompositeRegime, GammaRegime, RegimeClassification, VolRegime};

/// Exposures the alignment axes read from one strategy
#[derive(Debug, Clone, Copy)]
pub struct StrategyExposures {
    pub net_gamma: f64,
    pub net_vega: f64,
    pub convexity: f64,
    pub cvar: f64,
}

/// Population statistics shared by every strategy's alignment
#[derive(Debug, Clone)]
pub struct PopulationStats {
    pub median_abs_gamma: f64,
    pub median_abs_vega: f64,
    pub convexities: Vec<f64>,
    pub cvars: Vec<f64>,
}

impl PopulationStats {
    pub fn from_exposures(population: &[StrategyExposures]) -> Self {
        let gammas: Vec<f64> = population.iter().map(|e| e.net_gamma.abs()).collect();
        let vegas: Vec<f64> = population.iter().map(|e| e.net_vega.abs()).collect();
        Self {
            median_abs_gamma: if gammas.is_empty() { 1.0 } else { percentile(&gammas, 50.0) },
            median_abs_vega: if vegas.is_empty() { 1.0 } else { percentile(&vegas, 50.0) },
            convexities: population.iter().map(|e| e.convexity).collect(),
            cvars: population.iter().map(|e| e.cvar).collect(),
        }
    }
}

/// Four-axis alignment with its composite and confidence-weighted scores
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlignmentScore {
    /// Mean of the four axes, in [0, 1]
    pub score: f64,
    /// score x regime confidence
    pub weighted: f64,
    pub gamma_alignment: f64,
    pub vega_alignment: f64,
    pub convexity_alignment: f64,
    pub tail_alignment: f64,
}

/// Map a signed exposure onto [0, 1] relative to the population scale:
/// 1 = fully aligned with the desired sign, 0 = opposed, 0.5 = neutral.
fn scaled_sign(value: f64, desired_positive: bool, scale: f64) -> f64 {
    if scale == 0.0 {
        return 0.5;
    }
    let normalized = (value / scale).clamp(-1.0, 1.0);
    if desired_positive {
        (normalized + 1.0) / 2.0
    } else {
        (1.0 - normalized) / 2.0
    }
}

/// Fraction of the population at or below `value`
fn percentile_rank(value: f64, population: &[f64]) -> f64 {
    if population.is_empty() {
        return 0.5;
    }
    population.iter().filter(|&&x| x <= value).count() as f64 / population.len() as f64
}

/// Compute the structural alignment of one strategy against the regime.
pub fn compute_alignment(
    exposures: &StrategyExposures,
    regime: &RegimeClassification,
    stats: &PopulationStats,
) -> AlignmentScore {
    // Gamma axis: desired sign implied by the gamma regime
    let gamma_alignment = match regime.gamma_regime {
        GammaRegime::NeutralGamma => 0.5,
        GammaRegime::AmplifiedMove => {
            scaled_sign(exposures.net_gamma, true, stats.median_abs_gamma)
        }
        GammaRegime::PinRisk => scaled_sign(exposures.net_gamma, false, stats.median_abs_gamma),
    };

    // Vega axis: long vol favored when the tail is underpriced
    let vega_alignment = match regime.vol_regime {
        VolRegime::TailUnderpriced => scaled_sign(exposures.net_vega, true, stats.median_abs_vega),
        VolRegime::TailOverpriced => scaled_sign(exposures.net_vega, false, stats.median_abs_vega),
        VolRegime::FairlyPriced => 0.5,
    };

    // Convexity axis: rank within the population, direction by composite
    let conv_rank = percentile_rank(exposures.convexity, &stats.convexities);
    let convexity_alignment = match regime.composite_regime {
        CompositeRegime::ConvexBreakoutSetup => conv_rank,
        CompositeRegime::PremiumHarvestSetup => 1.0 - conv_rank,
        CompositeRegime::MixedTransitional => 0.5,
    };

    // Tail axis: CVaR is negative; low rank = least severe tail. Only
    // discriminates when the tail is underpriced.
    let cvar_rank = percentile_rank(exposures.cvar, &stats.cvars);
    let tail_alignment = match regime.vol_regime {
        VolRegime::TailUnderpriced => 1.0 - cvar_rank,
        _ => 0.5,
    };

    let score = (gamma_alignment + vega_alignment + convexity_alignment + tail_alignment) / 4.0;

    AlignmentScore {
        score,
        weighted: score * regime.confidence,
        gamma_alignment,
        vega_alignment,
        convexity_alignment,
        tail_alignment,
    }
}

/// Alignment for every strategy in a population: computes population
/// stats once, then scores each entry.
pub fn compute_all_alignments(
    population: &[StrategyExposures],
    regime: &RegimeClassification,
) -> Vec<AlignmentScore> {
    let stats = PopulationStats::from_exposures(population);
    population
        .iter()
        .map(|exposures| compute_alignment(exposures, regime, &stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::test_snapshot;
    use crate::regime::classify_regime;

    fn breakout_regime() -> RegimeClassification {
        let mut snap = test_snapshot();
        snap.implied_move = 0.05;
        snap.historical_p75 = 0.08;
        snap.gex_net = -9.0e8;
        snap.gex_abs = 1.0e9;
        snap.event_variance_ratio = 0.65;
        classify_regime(&snap)
    }

    fn neutral_regime() -> RegimeClassification {
        let mut snap = test_snapshot();
        snap.implied_move = 0.08;
        snap.historical_p75 = 0.08;
        snap.gex_net = 0.0;
        classify_regime(&snap)
    }

    fn population() -> Vec<StrategyExposures> {
        vec![
            StrategyExposures { net_gamma: 0.08, net_vega: 40.0, convexity: 6.0, cvar: -300.0 },
            StrategyExposures { net_gamma: -0.02, net_vega: -15.0, convexity: 1.2, cvar: -900.0 },
            StrategyExposures { net_gamma: 0.01, net_vega: 5.0, convexity: 2.5, cvar: -500.0 },
        ]
    }

    #[test]
    fn test_scaled_sign() {
        assert_eq!(scaled_sign(1.0, true, 0.0), 0.5);
        assert_eq!(scaled_sign(1.0, true, 1.0), 1.0);
        assert_eq!(scaled_sign(-1.0, true, 1.0), 0.0);
        assert_eq!(scaled_sign(-1.0, false, 1.0), 1.0);
        assert_eq!(scaled_sign(0.0, true, 1.0), 0.5);
        // clamped beyond the population scale
        assert_eq!(scaled_sign(10.0, true, 1.0), 1.0);
    }

    #[test]
    fn test_breakout_favors_long_gamma_convexity() {
        let regime = breakout_regime();
        let scores = compute_all_alignments(&population(), &regime);

        // the long-gamma, high-convexity entry dominates
        assert!(scores[0].score > scores[1].score);
        assert!(scores[0].gamma_alignment > 0.5);
        assert!(scores[1].gamma_alignment < 0.5);
        assert!(scores[0].convexity_alignment > scores[1].convexity_alignment);
        // tail axis is rank-based: the highest CVaR value carries rank 1
        assert_eq!(scores[0].tail_alignment, 0.0);
        assert!(scores[1].tail_alignment > scores[0].tail_alignment);
    }

    #[test]
    fn test_neutral_axes_default_to_half() {
        let regime = neutral_regime();
        let scores = compute_all_alignments(&population(), &regime);
        for s in &scores {
            assert_eq!(s.gamma_alignment, 0.5);
            assert_eq!(s.vega_alignment, 0.5);
            assert_eq!(s.convexity_alignment, 0.5);
            assert_eq!(s.tail_alignment, 0.5);
            assert_eq!(s.score, 0.5);
        }
    }

    #[test]
    fn test_weighted_by_confidence() {
        let regime = breakout_regime();
        let stats = PopulationStats::from_exposures(&population());
        let score = compute_alignment(&population()[0], &regime, &stats);
        assert!((score.weighted - score.score * regime.confidence).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&score.score));
    }

    #[test]
    fn test_empty_population_is_neutral() {
        let regime = breakout_regime();
        let stats = PopulationStats::from_exposures(&[]);
        let exposures = StrategyExposures {
            net_gamma: 0.05,
            net_vega: 10.0,
            convexity: 3.0,
            cvar: -400.0,
        };
        let score = compute_alignment(&exposures, &regime, &stats);
        // percentile ranks fall back to 0.5 with no population
        assert_eq!(score.convexity_alignment, 0.5);
        assert_eq!(score.tail_alignment, 0.5);
    }
}
