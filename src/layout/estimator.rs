//! Automatic body-column count estimation.
//!
//! Peak detection is run over a grid of (threshold, distance) ratios; each
//! candidate is scored by how uniform its peak heights and spacings are, and the
//! most consistent one wins. When the grid finds nothing a single lenient pass
//! is used instead and the result is flagged as a fallback.

use std::ops::RangeInclusive;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::peaks::{PeakCriteria, find_peaks};
use super::projection::SmoothedProfile;

const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Parameter grid and confidence model for [`estimate_column_count`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorGrid {
    /// Peak height floors as fractions of the profile maximum.
    pub threshold_ratios: Vec<f64>,
    /// Peak separation floors as fractions of the image width.
    pub distance_ratios: Vec<f64>,
    /// Prominence floor as a fraction of the height floor.
    pub prominence_factor: f64,
    pub fallback_threshold_ratio: f64,
    pub fallback_distance_divisor: usize,
    /// Column counts considered typical for a score page.
    pub typical_columns: RangeInclusive<usize>,
    /// Estimates below this confidence are reported as low confidence.
    pub low_confidence: f64,
}

impl Default for EstimatorGrid {
    fn default() -> Self {
        Self {
            threshold_ratios: vec![0.15, 0.2, 0.25, 0.3],
            distance_ratios: vec![0.08, 0.10, 0.12],
            prominence_factor: 0.3,
            fallback_threshold_ratio: 0.1,
            fallback_distance_divisor: 10,
            typical_columns: 3..=6,
            low_confidence: 0.5,
        }
    }
}

/// One grid trial. Only lives inside the estimator and in its debug output.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationCandidate {
    pub threshold_ratio: f64,
    pub distance_ratio: f64,
    pub height: f64,
    pub distance: usize,
    pub peaks: Vec<usize>,
    /// Lower is more internally consistent.
    pub score: f64,
}

impl EstimationCandidate {
    pub fn count(&self) -> usize {
        self.peaks.len()
    }
}

/// Result of the estimator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnEstimate {
    pub count: usize,
    pub confidence: f64,
    /// Peak coordinates of the winning candidate (or of the fallback pass).
    pub peaks: Vec<usize>,
    /// Consistency score of the winner; `None` on the fallback path.
    pub score: Option<f64>,
    pub threshold_ratio: f64,
    pub distance_ratio: f64,
    pub fallback: bool,
    #[serde(skip)]
    low_confidence_cutoff: f64,
}

impl ColumnEstimate {
    /// True when the caller should consider asking for a manual line count.
    pub fn is_low_confidence(&self) -> bool {
        self.fallback || self.confidence < self.low_confidence_cutoff
    }
}

/// Estimates the number of body columns from a page's smoothed column profile.
pub fn estimate_column_count(
    profile: &SmoothedProfile,
    image_width: usize,
    grid: &EstimatorGrid,
) -> ColumnEstimate {
    let candidates = grid_candidates(profile, image_width, grid);
    for c in &candidates {
        debug!(
            "estimator: threshold {:.2} distance {:.2} -> {} peaks, score {:.4}",
            c.threshold_ratio,
            c.distance_ratio,
            c.count(),
            c.score
        );
    }

    // First minimum in grid order wins ties.
    let Some(best) = candidates
        .into_iter()
        .min_by(|a, b| a.score.total_cmp(&b.score))
    else {
        return fallback_estimate(profile, image_width, grid);
    };

    let count = best.count();
    let confidence = if grid.typical_columns.contains(&count) {
        (1.0 - best.score).max(0.7)
    } else {
        (0.7 - best.score).max(0.3)
    };

    info!(
        "estimated {count} columns (confidence {confidence:.2}, threshold {:.1})",
        best.height
    );
    if confidence < grid.low_confidence {
        warn!("column estimate has low confidence {confidence:.2}; consider a manual line count");
    }

    ColumnEstimate {
        count,
        confidence,
        peaks: best.peaks,
        score: Some(best.score),
        threshold_ratio: best.threshold_ratio,
        distance_ratio: best.distance_ratio,
        fallback: false,
        low_confidence_cutoff: grid.low_confidence,
    }
}

/// Runs every grid trial and keeps those that found at least one peak.
pub fn grid_candidates(
    profile: &SmoothedProfile,
    image_width: usize,
    grid: &EstimatorGrid,
) -> Vec<EstimationCandidate> {
    let values = profile.values();
    let max = profile.max();
    let mut candidates = Vec::new();

    for &threshold_ratio in &grid.threshold_ratios {
        for &distance_ratio in &grid.distance_ratios {
            let height = max * threshold_ratio;
            let distance = ((image_width as f64 * distance_ratio) as usize).max(1);
            let criteria =
                PeakCriteria::new(height, distance).with_prominence(height * grid.prominence_factor);
            let peaks = find_peaks(values, &criteria);
            if peaks.is_empty() {
                continue;
            }
            let score = consistency_score(values, &peaks);
            candidates.push(EstimationCandidate {
                threshold_ratio,
                distance_ratio,
                height,
                distance,
                peaks,
                score,
            });
        }
    }

    candidates
}

/// Coefficient of variation of the peak heights plus half that of the gaps
/// between neighbouring peaks. Both terms are zero for a single peak.
pub fn consistency_score(values: &[f64], peaks: &[usize]) -> f64 {
    let heights: Vec<f64> = peaks.iter().map(|&p| values[p]).collect();
    let height_cv = if heights.len() > 1 {
        coefficient_of_variation(&heights)
    } else {
        0.0
    };

    let gap_cv = if peaks.len() > 1 {
        let mut sorted = peaks.to_vec();
        sorted.sort_unstable();
        let gaps: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        coefficient_of_variation(&gaps)
    } else {
        0.0
    };

    height_cv + gap_cv * 0.5
}

fn coefficient_of_variation(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return f64::INFINITY;
    }
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    var.sqrt() / mean
}

fn fallback_estimate(profile: &SmoothedProfile, image_width: usize, grid: &EstimatorGrid) -> ColumnEstimate {
    let height = profile.max() * grid.fallback_threshold_ratio;
    let distance = (image_width / grid.fallback_distance_divisor.max(1)).max(1);
    let peaks = find_peaks(profile.values(), &PeakCriteria::new(height, distance));
    let count = peaks.len().max(1);

    warn!("column estimate fell back to lenient peak search: {count} columns (low confidence)");

    ColumnEstimate {
        count,
        confidence: FALLBACK_CONFIDENCE,
        peaks,
        score: None,
        threshold_ratio: grid.fallback_threshold_ratio,
        distance_ratio: 1.0 / grid.fallback_distance_divisor.max(1) as f64,
        fallback: true,
        low_confidence_cutoff: grid.low_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_peak_scores_zero() {
        let values = [0.0, 1.0, 0.0];
        assert_eq!(consistency_score(&values, &[1]), 0.0);
    }

    #[test]
    fn uneven_spacing_raises_score() {
        let values = vec![1.0; 200];
        let even = consistency_score(&values, &[20, 60, 100, 140]);
        // Gaps 10, 70, 90: half their coefficient of variation.
        let uneven = consistency_score(&values, &[20, 30, 100, 190]);
        assert!(even.abs() < 1e-12);
        assert!((uneven - 0.29994).abs() < 1e-4, "score {uneven}");
        assert!(consistency_score(&values, &[20, 25, 100, 190]) > uneven);
    }

    #[test]
    fn smaller_grid_is_injectable() {
        let grid = EstimatorGrid {
            threshold_ratios: vec![0.2],
            distance_ratios: vec![0.1],
            ..EstimatorGrid::default()
        };
        let profile = SmoothedProfile::from_values(vec![0.0; 100]);
        assert!(grid_candidates(&profile, 100, &grid).is_empty());
    }
}
