//! Peak detection over smoothed profiles and expansion of peaks into bands.

use log::debug;
use serde::{Deserialize, Serialize};

use super::projection::{PAGE_SIGMA, SmoothedProfile};

pub const MIN_BAND_WIDTH: usize = 20;
const PAGE_HEIGHT_RATIO: f64 = 0.2;
const PROMINENCE_FACTOR: f64 = 0.3;
const EXPANSION_RATIO: f64 = 0.1;

/// Constraints a sample must satisfy to be reported as a peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum peak value.
    pub height: Option<f64>,
    /// Minimum index separation between reported peaks; values below 1 act as 1.
    pub distance: usize,
    /// Minimum topographic prominence.
    pub prominence: Option<f64>,
}

impl PeakCriteria {
    pub fn new(height: f64, distance: usize) -> Self {
        Self {
            height: Some(height),
            distance,
            prominence: None,
        }
    }

    pub fn with_prominence(mut self, prominence: f64) -> Self {
        self.prominence = Some(prominence);
        self
    }
}

/// Finds peaks in `values`, returned in ascending index order.
///
/// Candidates are strict local maxima (flat tops report their midpoint, array
/// ends never qualify). They are filtered by height, then by distance with the
/// higher peak surviving each conflict, then by prominence.
pub fn find_peaks(values: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    let mut peaks = local_maxima(values);

    if let Some(height) = criteria.height {
        peaks.retain(|&p| values[p] >= height);
    }

    if criteria.distance > 1 && peaks.len() > 1 {
        peaks = select_by_distance(values, &peaks, criteria.distance);
    }

    if let Some(min_prominence) = criteria.prominence {
        peaks.retain(|&p| prominence(values, p) >= min_prominence);
    }

    peaks
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(values: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];

    // Highest first; among equal heights the later peak is visited first.
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| values[peaks[a]].total_cmp(&values[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Height of the peak above the higher of the two minima reached before the
/// signal rises above the peak again (or the array ends) on either side.
fn prominence(x: &[f64], peak: usize) -> f64 {
    let top = x[peak];

    let mut left_min = top;
    for &v in x[..=peak].iter().rev() {
        if v > top {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = top;
    for &v in &x[peak..] {
        if v > top {
            break;
        }
        right_min = right_min.min(v);
    }

    top - left_min.max(right_min)
}

/// Pixel interval `[left, right)` grown around a reference peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    pub left: usize,
    pub right: usize,
    pub peak: usize,
}

impl Band {
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    pub fn contains(&self, x: usize) -> bool {
        (self.left..self.right).contains(&x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandOrder {
    /// Descending peak coordinate, the page reading order.
    RightToLeft,
    /// Ascending peak coordinate.
    Natural,
}

/// Page-level segmentation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub sigma: f64,
    /// Peak height floor as a fraction of the profile maximum.
    pub height_ratio: f64,
    /// Prominence floor as a fraction of the height floor.
    pub prominence_factor: f64,
    /// A band grows while the profile stays above this fraction of its peak.
    pub expansion_ratio: f64,
    /// Bands must be strictly wider than this.
    pub min_band_width: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sigma: PAGE_SIGMA,
            height_ratio: PAGE_HEIGHT_RATIO,
            prominence_factor: PROMINENCE_FACTOR,
            expansion_ratio: EXPANSION_RATIO,
            min_band_width: MIN_BAND_WIDTH,
        }
    }
}

impl SegmenterConfig {
    /// Page criteria for a profile expected to hold `expected_body` columns
    /// plus a possible title column.
    pub fn page_criteria(&self, profile: &SmoothedProfile, expected_body: usize) -> PeakCriteria {
        let height = profile.max() * self.height_ratio;
        let distance = (profile.len() / expected_body.saturating_add(2)).max(1);
        PeakCriteria::new(height, distance).with_prominence(height * self.prominence_factor)
    }
}

/// Walks outwards from `peak` while the profile stays above
/// `expansion_ratio × profile[peak]`.
pub fn expand_band(values: &[f64], peak: usize, expansion_ratio: f64) -> Band {
    let threshold = values[peak] * expansion_ratio;
    let last = values.len().saturating_sub(1);

    let mut left = peak;
    while left > 0 && values[left] > threshold {
        left -= 1;
    }
    let mut right = peak;
    while right < last && values[right] > threshold {
        right += 1;
    }

    Band { left, right, peak }
}

/// Detects peaks and grows each into a band, dropping bands that are too narrow.
///
/// An empty result means no structure was found; it is not an error.
pub fn segment(
    profile: &SmoothedProfile,
    criteria: &PeakCriteria,
    config: &SegmenterConfig,
    order: BandOrder,
) -> Vec<Band> {
    let values = profile.values();
    let peaks = find_peaks(values, criteria);

    let mut bands: Vec<Band> = peaks
        .iter()
        .map(|&p| expand_band(values, p, config.expansion_ratio))
        .filter(|band| band.width() > config.min_band_width)
        .collect();

    debug!(
        "segment: {} peaks -> {} bands (height {:?}, distance {}, prominence {:?})",
        peaks.len(),
        bands.len(),
        criteria.height,
        criteria.distance,
        criteria.prominence
    );

    if order == BandOrder::RightToLeft {
        bands.sort_by(|a, b| b.peak.cmp(&a.peak));
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::projection::gaussian_filter;

    fn bump(len: usize, center: f64, sigma: f64, height: f64) -> Vec<f64> {
        (0..len)
            .map(|i| height * (-0.5 * ((i as f64 - center) / sigma).powi(2)).exp())
            .collect()
    }

    #[test]
    fn plateau_reports_midpoint() {
        let x = [0.0, 1.0, 3.0, 3.0, 3.0, 3.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, &PeakCriteria::new(0.0, 1)), vec![3]);
    }

    #[test]
    fn edges_are_never_peaks() {
        let x = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(find_peaks(&x, &PeakCriteria::new(0.0, 1)).is_empty());
    }

    #[test]
    fn distance_keeps_the_stronger_peak() {
        let mut x = bump(100, 40.0, 3.0, 10.0);
        for (v, w) in x.iter_mut().zip(bump(100, 50.0, 3.0, 6.0)) {
            *v += w;
        }
        let peaks = find_peaks(&x, &PeakCriteria::new(1.0, 20));
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0] as i64 - 40).abs() <= 1);
    }

    #[test]
    fn prominence_filters_shoulders() {
        let x = [0.0, 10.0, 9.0, 9.5, 9.0, 0.0, 0.0];
        let all = find_peaks(&x, &PeakCriteria::new(0.0, 1));
        assert_eq!(all, vec![1, 3]);
        let prominent = find_peaks(&x, &PeakCriteria::new(0.0, 1).with_prominence(2.0));
        assert_eq!(prominent, vec![1]);
    }

    #[test]
    fn single_bump_yields_one_band_containing_peak() {
        let profile = SmoothedProfile::from_values(gaussian_filter(&bump(400, 180.0, 12.0, 50.0), 5.0));
        let criteria = PeakCriteria::new(10.0, 30).with_prominence(3.0);
        let bands = segment(&profile, &criteria, &SegmenterConfig::default(), BandOrder::RightToLeft);
        assert_eq!(bands.len(), 1);
        assert!(bands[0].contains(180));
        assert!(bands[0].width() > MIN_BAND_WIDTH);
    }

    #[test]
    fn narrow_bands_are_dropped() {
        let profile = SmoothedProfile::from_values(bump(200, 100.0, 2.0, 50.0));
        let bands = segment(
            &profile,
            &PeakCriteria::new(10.0, 10),
            &SegmenterConfig::default(),
            BandOrder::Natural,
        );
        assert!(bands.is_empty());
    }

    #[test]
    fn zero_profile_has_no_bands() {
        let profile = SmoothedProfile::from_values(vec![0.0; 300]);
        let bands = segment(
            &profile,
            &PeakCriteria::new(0.0, 10),
            &SegmenterConfig::default(),
            BandOrder::RightToLeft,
        );
        assert!(bands.is_empty());
    }

    #[test]
    fn page_distance_survives_huge_line_counts() {
        let profile = SmoothedProfile::from_values(vec![1.0; 600]);
        let config = SegmenterConfig::default();
        assert_eq!(config.page_criteria(&profile, 3).distance, 120);
        assert_eq!(config.page_criteria(&profile, usize::MAX).distance, 1);
    }
}
