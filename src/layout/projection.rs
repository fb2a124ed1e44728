//! 1-D ink density profiles and Gaussian smoothing.

use std::ops::Range;

use super::error::LayoutError;
use super::raster::BinaryRaster;

/// Page-level smoothing spread used for column detection.
pub const PAGE_SIGMA: f64 = 5.0;
/// Intra-column smoothing spread used for Shoga detection.
pub const COLUMN_SIGMA: f64 = 2.0;

/// Kernel half-width in units of sigma.
const TRUNCATE: f64 = 4.0;

/// Which coordinate the profile is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// One value per x coordinate: ink counted down each pixel column.
    X,
    /// One value per row: ink counted across each pixel row.
    Y,
}

/// Per-coordinate foreground counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionProfile {
    values: Vec<u32>,
}

impl ProjectionProfile {
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|&v| v as f64).sum::<f64>() / self.values.len() as f64
    }

    pub fn std_dev(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        var.sqrt()
    }

    pub fn smooth(&self, sigma: f64) -> SmoothedProfile {
        let values: Vec<f64> = self.values.iter().map(|&v| v as f64).collect();
        SmoothedProfile {
            values: gaussian_filter(&values, sigma),
        }
    }
}

impl From<Vec<u32>> for ProjectionProfile {
    fn from(values: Vec<u32>) -> Self {
        Self { values }
    }
}

/// A profile after Gaussian smoothing; same length as its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedProfile {
    values: Vec<f64>,
}

impl SmoothedProfile {
    /// Wraps already-smoothed values, e.g. a synthetic curve.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Projects the whole raster along `axis`.
pub fn project(raster: &BinaryRaster, axis: Axis) -> Result<ProjectionProfile, LayoutError> {
    project_window(raster, axis, 0..raster.width())
}

/// Projects only the pixel columns in `x_window`, over the full raster height.
///
/// With [`Axis::X`] the result has one value per column of the window; with
/// [`Axis::Y`] it has one value per raster row.
pub fn project_window(
    raster: &BinaryRaster,
    axis: Axis,
    x_window: Range<usize>,
) -> Result<ProjectionProfile, LayoutError> {
    if raster.is_empty() {
        return Err(LayoutError::EmptyRaster);
    }
    let x0 = x_window.start.min(raster.width());
    let x1 = x_window.end.min(raster.width()).max(x0);

    let values = match axis {
        Axis::X => {
            let mut counts = vec![0u32; x1 - x0];
            for y in 0..raster.height() {
                for (count, &ink) in counts.iter_mut().zip(&raster.row(y)[x0..x1]) {
                    *count += ink as u32;
                }
            }
            counts
        }
        Axis::Y => (0..raster.height())
            .map(|y| raster.row(y)[x0..x1].iter().filter(|&&ink| ink).count() as u32)
            .collect(),
    };

    Ok(ProjectionProfile { values })
}

/// Correlates `values` with a normalized Gaussian truncated at 4σ, mirroring
/// the signal at both ends (`d c b a | a b c d | d c b a`).
pub fn gaussian_filter(values: &[f64], sigma: f64) -> Vec<f64> {
    if values.is_empty() || sigma <= 0.0 {
        return values.to_vec();
    }

    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f64 / sigma).powi(2)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= norm;
    }

    let n = values.len();
    (0..n as isize)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, k)| w * values[reflect_index(i + k, n)])
                .sum()
        })
        .collect()
}

fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n { (period - 1 - m) as usize } else { m as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_mirrors_edges() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn smoothing_preserves_mass_and_constants() {
        let flat = vec![7.0; 50];
        let out = gaussian_filter(&flat, 5.0);
        assert!(out.iter().all(|v| (v - 7.0).abs() < 1e-9));

        let mut spike = vec![0.0; 101];
        spike[50] = 10.0;
        let out = gaussian_filter(&spike, 2.0);
        let total: f64 = out.iter().sum();
        assert!((total - 10.0).abs() < 1e-9);
        assert!(out[50] > out[49] && out[50] > out[51]);
    }

    #[test]
    fn window_projection_counts_ink() {
        let raster = BinaryRaster::from_fn(10, 4, |x, y| x >= 5 && y < 3);
        let cols = project_window(&raster, Axis::X, 4..8).unwrap();
        assert_eq!(cols.values(), &[0, 3, 3, 3]);
        let rows = project_window(&raster, Axis::Y, 4..8).unwrap();
        assert_eq!(rows.values(), &[3, 3, 3, 0]);
    }
}
