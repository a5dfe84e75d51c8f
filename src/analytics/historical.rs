//! Historical realized event-move analysis
//!
//! Pairs each past event date with the next trading close and the one
//! before it to extract absolute gap moves, then summarizes the
//! distribution (P75/P90, mean/median, shape) for the snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{EvError, EvResult};

/// One daily close
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Distribution shape of signed event moves
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveDistribution {
    pub mean_abs_move: f64,
    pub median_abs_move: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Signed gap moves over past events: close-over-previous-close around
/// each event date. History must be sorted ascending by date.
pub fn extract_event_moves(history: &[DailyClose], event_dates: &[NaiveDate]) -> Vec<f64> {
    let mut moves = Vec::new();
    for &event in event_dates {
        let Some(idx) = history.iter().position(|d| d.date >= event) else {
            continue;
        };
        if idx == 0 {
            continue;
        }
        let prev = history[idx - 1].close;
        let at = history[idx].close;
        if prev > 0.0 {
            moves.push(at / prev - 1.0);
        }
    }
    moves
}

/// Percentile of absolute event moves with linear interpolation.
/// Fatal with fewer than two observed moves; fewer than eight draws a
/// small-sample diagnostic.
pub fn event_move_percentile(
    history: &[DailyClose],
    event_dates: &[NaiveDate],
    pct: f64,
) -> EvResult<f64> {
    if history.is_empty() {
        return Err(EvError::data("no price history available"));
    }
    if event_dates.is_empty() {
        return Err(EvError::data("no event dates available for historical moves"));
    }

    let abs_moves: Vec<f64> = extract_event_moves(history, event_dates)
        .into_iter()
        .map(f64::abs)
        .collect();

    if abs_moves.len() < 2 {
        return Err(EvError::data("insufficient event moves to compute percentile"));
    }
    if abs_moves.len() < 8 {
        warn!(
            samples = abs_moves.len(),
            "small historical-move sample size"
        );
    }

    Ok(percentile(&abs_moves, pct))
}

/// Distribution shape of signed moves. Zero-filled for empty input.
pub fn distribution_shape(moves: &[f64]) -> MoveDistribution {
    if moves.is_empty() {
        return MoveDistribution {
            mean_abs_move: 0.0,
            median_abs_move: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }

    let n = moves.len() as f64;
    let abs_moves: Vec<f64> = moves.iter().map(|m| m.abs()).collect();
    let mean_abs = abs_moves.iter().sum::<f64>() / n;
    let median_abs = percentile(&abs_moves, 50.0);

    let mean = moves.iter().sum::<f64>() / n;
    let m2 = moves.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n;
    let m3 = moves.iter().map(|m| (m - mean).powi(3)).sum::<f64>() / n;
    let m4 = moves.iter().map(|m| (m - mean).powi(4)).sum::<f64>() / n;

    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2))
    } else {
        (0.0, 0.0)
    };

    MoveDistribution {
        mean_abs_move: mean_abs,
        median_abs_move: median_abs,
        skewness,
        kurtosis,
    }
}

/// Linear-interpolated percentile over an unsorted sample
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}
