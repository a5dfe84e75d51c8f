//! Volatility regime classification
//!
//! Pure function of the market snapshot. Classifies the environment
//! along four axes plus a composite setup, each with a confidence score.

use serde::{Deserialize, Serialize};

use crate::core::MarketSnapshot;

/// How the implied move compares to realized history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolRegime {
    TailUnderpriced,
    FairlyPriced,
    TailOverpriced,
}

impl std::fmt::Display for VolRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolRegime::TailUnderpriced => write!(f, "Tail Underpriced"),
            VolRegime::FairlyPriced => write!(f, "Fairly Priced"),
            VolRegime::TailOverpriced => write!(f, "Tail Overpriced"),
        }
    }
}

/// How much of the front variance the event carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventRegime {
    PureBinaryEvent,
    EventDominant,
    DistributedVolatility,
}

impl std::fmt::Display for EventRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventRegime::PureBinaryEvent => write!(f, "Pure Binary Event"),
            EventRegime::EventDominant => write!(f, "Event-Dominant"),
            EventRegime::DistributedVolatility => write!(f, "Distributed Volatility"),
        }
    }
}

/// Front-back IV spread shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermStructureRegime {
    ExtremeFrontPremium,
    ElevatedFrontPremium,
    NormalStructure,
    InvertedStructure,
}

impl std::fmt::Display for TermStructureRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermStructureRegime::ExtremeFrontPremium => write!(f, "Extreme Front Premium"),
            TermStructureRegime::ElevatedFrontPremium => write!(f, "Elevated Front Premium"),
            TermStructureRegime::NormalStructure => write!(f, "Normal Structure"),
            TermStructureRegime::InvertedStructure => write!(f, "Inverted Structure"),
        }
    }
}

/// Dealer gamma positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GammaRegime {
    /// Dealers short gamma: moves get amplified
    AmplifiedMove,
    /// Dealers long gamma: price pinning
    PinRisk,
    NeutralGamma,
}

impl std::fmt::Display for GammaRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GammaRegime::AmplifiedMove => write!(f, "Amplified Move Regime"),
            GammaRegime::PinRisk => write!(f, "Pin Risk Regime"),
            GammaRegime::NeutralGamma => write!(f, "Neutral Gamma"),
        }
    }
}

/// Composite setup from the vol/gamma/event axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeRegime {
    ConvexBreakoutSetup,
    PremiumHarvestSetup,
    MixedTransitional,
}

impl std::fmt::Display for CompositeRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositeRegime::ConvexBreakoutSetup => write!(f, "Convex Breakout Setup"),
            CompositeRegime::PremiumHarvestSetup => write!(f, "Premium Harvest Setup"),
            CompositeRegime::MixedTransitional => write!(f, "Mixed / Transitional Setup"),
        }
    }
}

/// Full regime classification with per-axis confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeClassification {
    pub vol_regime: VolRegime,
    pub event_regime: EventRegime,
    pub term_structure_regime: TermStructureRegime,
    pub gamma_regime: GammaRegime,
    pub composite_regime: CompositeRegime,
    /// implied_move / historical_p75
    pub vol_ratio: f64,
    /// |gex_net| / gex_abs
    pub gex_ratio: f64,
    pub vol_confidence: f64,
    pub gamma_confidence: f64,
    pub event_confidence: f64,
    /// 0.4 * vol + 0.3 * gamma + 0.3 * event
    pub confidence: f64,
}

/// Classify the market regime from the snapshot.
pub fn classify_regime(snapshot: &MarketSnapshot) -> RegimeClassification {
    let vol_ratio = snapshot.implied_move / snapshot.historical_p75;
    let vol_regime = if vol_ratio < 0.85 {
        VolRegime::TailUnderpriced
    } else if vol_ratio > 1.10 {
        VolRegime::TailOverpriced
    } else {
        VolRegime::FairlyPriced
    };

    let ev_ratio = snapshot.event_variance_ratio;
    let event_regime = if ev_ratio > 0.70 {
        EventRegime::PureBinaryEvent
    } else if ev_ratio > 0.50 {
        EventRegime::EventDominant
    } else {
        EventRegime::DistributedVolatility
    };

    let spread = snapshot.front_iv - snapshot.back_iv;
    let term_structure_regime = if spread > 0.20 {
        TermStructureRegime::ExtremeFrontPremium
    } else if spread > 0.10 {
        TermStructureRegime::ElevatedFrontPremium
    } else if spread < -0.05 {
        TermStructureRegime::InvertedStructure
    } else {
        TermStructureRegime::NormalStructure
    };

    let gex_ratio = snapshot.gex_ratio();
    let gamma_regime = if snapshot.gex_net < 0.0 && gex_ratio > 0.7 {
        GammaRegime::AmplifiedMove
    } else if snapshot.gex_net > 0.0 && gex_ratio > 0.7 {
        GammaRegime::PinRisk
    } else {
        GammaRegime::NeutralGamma
    };

    let composite_regime = if vol_regime == VolRegime::TailUnderpriced
        && gamma_regime == GammaRegime::AmplifiedMove
        && ev_ratio > 0.6
    {
        CompositeRegime::ConvexBreakoutSetup
    } else if vol_regime == VolRegime::TailOverpriced && gamma_regime == GammaRegime::PinRisk {
        CompositeRegime::PremiumHarvestSetup
    } else {
        CompositeRegime::MixedTransitional
    };

    // Each sub-confidence is a clamped linear distance from its neutral
    // threshold.
    let vol_confidence = ((vol_ratio - 1.0).abs() / 0.20).min(1.0);
    let gamma_confidence = gex_ratio.min(1.0);
    let event_confidence = (ev_ratio / 0.8).min(1.0);
    let confidence = 0.4 * vol_confidence + 0.3 * gamma_confidence + 0.3 * event_confidence;

    RegimeClassification {
        vol_regime,
        event_regime,
        term_structure_regime,
        gamma_regime,
        composite_regime,
        vol_ratio,
        gex_ratio,
        vol_confidence,
        gamma_confidence,
        event_confidence,
        confidence,
    }
}
