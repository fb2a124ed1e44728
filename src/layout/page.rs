//! Whole-page pipeline: projection → (estimation) → segmentation → classification → decomposition.

use std::path::Path;

use image::DynamicImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::classifier::{Classification, Column, classify_columns};
use super::error::LayoutError;
use super::estimator::{ColumnEstimate, EstimatorGrid, estimate_column_count};
use super::peaks::{Band, BandOrder, SegmenterConfig, segment};
use super::projection::{Axis, ProjectionProfile, SmoothedProfile, project};
use super::raster::{BinaryRaster, PreprocessConfig, binarize};
use super::subregion::{ColumnDecomposition, DecomposerConfig, GlyphRegion, SubRegionKind, decompose_column};

/// Expected number of body columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCount {
    #[default]
    Auto,
    Fixed(usize),
}

/// Everything tunable about a page analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub lines: LineCount,
    pub include_title: bool,
    pub preprocess: PreprocessConfig,
    pub segmenter: SegmenterConfig,
    pub estimator: EstimatorGrid,
    pub decomposer: DecomposerConfig,
}

/// Recoverable conditions recorded on a page result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// No band survived page-level segmentation.
    NoStructureDetected,
    /// A body column had no Shoga peak; it contributes no glyphs.
    SubPeakMissing { reading_index: usize },
    /// The estimator used its fallback pass or scored below the cutoff.
    LowConfidenceEstimate { confidence: f64, fallback: bool },
}

/// The title column (or title candidate) as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TitleInfo {
    pub detected: bool,
    pub coordinates: Option<(usize, usize)>,
    pub included_in_analysis: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayoutStats {
    pub num_lines: usize,
    pub line_widths: Vec<usize>,
    pub avg_line_width: f64,
    pub num_glyphs: usize,
    pub glyphs_per_line: Vec<usize>,
    pub shoga_per_line: Vec<usize>,
    pub fuji_per_line: Vec<usize>,
    /// Gap between each body column and its left neighbour in reading order.
    pub line_spacing: Vec<i64>,
    pub avg_line_spacing: f64,
}

impl LayoutStats {
    pub fn from_columns(columns: &[ColumnDecomposition]) -> Self {
        let line_widths: Vec<usize> = columns.iter().map(|c| c.column.width()).collect();
        let glyphs_per_line: Vec<usize> = columns.iter().map(|c| c.glyphs.len()).collect();
        let line_spacing: Vec<i64> = columns
            .windows(2)
            .map(|w| w[0].column.left() as i64 - w[1].column.right() as i64)
            .collect();

        Self {
            num_lines: columns.len(),
            avg_line_width: mean(line_widths.iter().map(|&w| w as f64)),
            num_glyphs: glyphs_per_line.iter().sum(),
            shoga_per_line: columns
                .iter()
                .map(|c| c.glyph_count(SubRegionKind::Shoga))
                .collect(),
            fuji_per_line: columns
                .iter()
                .map(|c| c.glyph_count(SubRegionKind::Fuji))
                .collect(),
            avg_line_spacing: mean(line_spacing.iter().map(|&s| s as f64)),
            line_widths,
            glyphs_per_line,
            line_spacing,
        }
    }

    pub fn total_shoga(&self) -> usize {
        self.shoga_per_line.iter().sum()
    }

    pub fn total_fuji(&self) -> usize {
        self.fuji_per_line.iter().sum()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Structural hypothesis for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub width: usize,
    pub height: usize,
    #[serde(skip)]
    pub profile: ProjectionProfile,
    #[serde(skip)]
    pub smoothed: SmoothedProfile,
    /// Present when the line count was estimated.
    pub estimate: Option<ColumnEstimate>,
    pub expected_lines: usize,
    /// Every band found, right to left.
    pub bands: Vec<Band>,
    pub title: Option<Column>,
    pub title_info: TitleInfo,
    /// Body columns in reading order.
    pub columns: Vec<ColumnDecomposition>,
    pub stats: LayoutStats,
    pub warnings: Vec<LayoutWarning>,
}

impl PageLayout {
    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphRegion> {
        self.columns.iter().flat_map(|c| c.glyphs.iter())
    }

    pub fn body_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|c| &c.column)
    }

    pub fn is_low_confidence(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, LayoutWarning::LowConfidenceEstimate { .. }))
    }
}

/// Loads, binarizes and analyzes the page at `path`.
pub fn analyze_path(path: &Path, config: &AnalysisConfig) -> Result<PageLayout, LayoutError> {
    let image = image::open(path).map_err(|source| LayoutError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    info!("loaded {} ({}x{})", path.display(), image.width(), image.height());
    analyze_image(&image, config)
}

pub fn analyze_image(image: &DynamicImage, config: &AnalysisConfig) -> Result<PageLayout, LayoutError> {
    let raster = binarize(image, &config.preprocess)?;
    analyze_raster(&raster, config)
}

/// Runs the layout pipeline on an already binarized page.
pub fn analyze_raster(raster: &BinaryRaster, config: &AnalysisConfig) -> Result<PageLayout, LayoutError> {
    let profile = project(raster, Axis::X)?;
    let smoothed = profile.smooth(config.segmenter.sigma);
    let mut warnings = Vec::new();

    let (expected_lines, estimate) = match config.lines {
        LineCount::Fixed(n) => (n.max(1), None),
        LineCount::Auto => {
            let estimate = estimate_column_count(&smoothed, raster.width(), &config.estimator);
            if estimate.is_low_confidence() {
                warnings.push(LayoutWarning::LowConfidenceEstimate {
                    confidence: estimate.confidence,
                    fallback: estimate.fallback,
                });
            }
            (estimate.count, Some(estimate))
        }
    };

    let criteria = config.segmenter.page_criteria(&smoothed, expected_lines);
    let bands = segment(&smoothed, &criteria, &config.segmenter, BandOrder::RightToLeft);
    if bands.is_empty() {
        warn!("no column structure detected");
        warnings.push(LayoutWarning::NoStructureDetected);
    }
    if let Some(rightmost) = bands.first() {
        debug!("rightmost band (title candidate): x {}-{}", rightmost.left, rightmost.right);
    }

    let Classification {
        title,
        body,
        title_included,
        ..
    } = classify_columns(&bands, expected_lines, config.include_title);

    let mut columns = Vec::with_capacity(body.len());
    for column in &body {
        let decomposition = decompose_column(raster, column, &config.decomposer)?;
        if decomposition.sub_peak_missing() {
            warnings.push(LayoutWarning::SubPeakMissing {
                reading_index: column.reading_index,
            });
        }
        columns.push(decomposition);
    }

    let stats = LayoutStats::from_columns(&columns);
    info!(
        "{} body columns, {} glyph regions (expected {expected_lines})",
        stats.num_lines, stats.num_glyphs
    );

    Ok(PageLayout {
        width: raster.width(),
        height: raster.height(),
        profile,
        smoothed,
        estimate,
        expected_lines,
        bands,
        title,
        title_info: TitleInfo {
            detected: title.is_some(),
            coordinates: title.map(|t| (t.left(), t.right())),
            included_in_analysis: title_included,
        },
        columns,
        stats,
        warnings,
    })
}
