//! Shoga / Fuji / Hyoshi decomposition of a body column and glyph extraction.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::classifier::Column;
use super::error::LayoutError;
use super::peaks::{PeakCriteria, find_peaks};
use super::projection::{Axis, COLUMN_SIGMA, project_window};
use super::raster::BinaryRaster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubRegionKind {
    Shoga,
    Fuji,
    Hyoshi,
}

impl SubRegionKind {
    /// Hyoshi marks are located but never scanned for glyphs.
    pub fn extracts_glyphs(self) -> bool {
        !matches!(self, SubRegionKind::Hyoshi)
    }
}

impl fmt::Display for SubRegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubRegionKind::Shoga => "Shoga",
            SubRegionKind::Fuji => "Fuji",
            SubRegionKind::Hyoshi => "Hyoshi",
        })
    }
}

/// Pixel interval `[left, right)` of one sub-band. May be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubRegion {
    pub kind: SubRegionKind,
    pub left: usize,
    pub right: usize,
}

impl SubRegion {
    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left
    }
}

/// The three sub-bands of a column; together they tile `[column.left, column.right)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnStructure {
    pub shoga_center: usize,
    pub fuji: SubRegion,
    pub shoga: SubRegion,
    pub hyoshi: SubRegion,
}

impl ColumnStructure {
    pub fn regions(&self) -> [SubRegion; 3] {
        [self.fuji, self.shoga, self.hyoshi]
    }
}

/// Bounding box of one glyph candidate. Rows are `[row_start, row_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphRegion {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
    pub label: SubRegionKind,
}

impl GlyphRegion {
    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }
}

/// One body column after decomposition. `structure` is `None` when no Shoga
/// peak was found, in which case `glyphs` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDecomposition {
    pub column: Column,
    pub structure: Option<ColumnStructure>,
    pub glyphs: Vec<GlyphRegion>,
}

impl ColumnDecomposition {
    pub fn sub_peak_missing(&self) -> bool {
        self.structure.is_none()
    }

    pub fn glyph_count(&self, kind: SubRegionKind) -> usize {
        self.glyphs.iter().filter(|g| g.label == kind).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerConfig {
    pub sigma: f64,
    pub peak_distance: usize,
    /// Sub-peak height floor as a fraction of the column profile maximum.
    pub peak_height_ratio: f64,
    /// Shoga spans `column width / shoga_divisor` on each side of its center.
    pub shoga_divisor: usize,
    /// Glyph rows must exceed this fraction of the sub-band's row maximum.
    pub glyph_threshold_ratio: f64,
    /// Glyph runs must be strictly taller than this.
    pub min_glyph_height: usize,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            sigma: COLUMN_SIGMA,
            peak_distance: 10,
            peak_height_ratio: 0.4,
            shoga_divisor: 6,
            glyph_threshold_ratio: 0.15,
            min_glyph_height: 8,
        }
    }
}

/// Locates Shoga inside `column`, derives Fuji and Hyoshi around it and
/// extracts glyph boxes from Shoga and Fuji.
pub fn decompose_column(
    raster: &BinaryRaster,
    column: &Column,
    config: &DecomposerConfig,
) -> Result<ColumnDecomposition, LayoutError> {
    let Some(structure) = locate_structure(raster, column, config)? else {
        warn!(
            "column {} (x {}-{}): no Shoga peak found, skipping glyph extraction",
            column.reading_index,
            column.left(),
            column.right()
        );
        return Ok(ColumnDecomposition {
            column: *column,
            structure: None,
            glyphs: Vec::new(),
        });
    };

    for region in structure.regions() {
        debug!(
            "column {} {}: x {}-{} (width {}px)",
            column.reading_index,
            region.kind,
            region.left,
            region.right,
            region.width()
        );
    }

    let mut glyphs = extract_glyphs(raster, &structure.shoga, config)?;
    glyphs.extend(extract_glyphs(raster, &structure.fuji, config)?);

    Ok(ColumnDecomposition {
        column: *column,
        structure: Some(structure),
        glyphs,
    })
}

/// Finds the strongest sub-peak of the column's fine profile and lays the
/// three sub-bands out around it.
pub fn locate_structure(
    raster: &BinaryRaster,
    column: &Column,
    config: &DecomposerConfig,
) -> Result<Option<ColumnStructure>, LayoutError> {
    let (left, right) = (column.left(), column.right());
    let smoothed = project_window(raster, Axis::X, left..right)?.smooth(config.sigma);
    let values = smoothed.values();

    let criteria = PeakCriteria::new(smoothed.max() * config.peak_height_ratio, config.peak_distance);
    let peaks = find_peaks(values, &criteria);
    let Some(&strongest) = peaks
        .iter()
        .rev()
        .max_by(|&&a, &&b| values[a].total_cmp(&values[b]))
    else {
        return Ok(None);
    };

    let center = left + strongest;
    let half = column.width() / config.shoga_divisor.max(1);
    let shoga_left = center.saturating_sub(half).max(left);
    let shoga_right = (center + half).min(right);

    Ok(Some(ColumnStructure {
        shoga_center: center,
        fuji: SubRegion {
            kind: SubRegionKind::Fuji,
            left,
            right: shoga_left,
        },
        shoga: SubRegion {
            kind: SubRegionKind::Shoga,
            left: shoga_left,
            right: shoga_right,
        },
        hyoshi: SubRegion {
            kind: SubRegionKind::Hyoshi,
            left: shoga_right,
            right,
        },
    }))
}

/// Scans the sub-band's row profile top to bottom for runs above
/// `glyph_threshold_ratio × max`, keeping runs taller than `min_glyph_height`.
pub fn extract_glyphs(
    raster: &BinaryRaster,
    region: &SubRegion,
    config: &DecomposerConfig,
) -> Result<Vec<GlyphRegion>, LayoutError> {
    if region.is_empty() || !region.kind.extracts_glyphs() {
        return Ok(Vec::new());
    }

    let rows = project_window(raster, Axis::Y, region.left..region.right)?;
    let threshold = rows.max() as f64 * config.glyph_threshold_ratio;

    let glyph = |row_start: usize, row_end: usize| GlyphRegion {
        row_start,
        row_end,
        col_start: region.left,
        col_end: region.right,
        label: region.kind,
    };

    let mut glyphs = Vec::new();
    let mut open: Option<usize> = None;
    for (y, &density) in rows.values().iter().enumerate() {
        let inked = density as f64 > threshold;
        match (open, inked) {
            (None, true) => open = Some(y),
            (Some(start), false) => {
                if y - start > config.min_glyph_height {
                    glyphs.push(glyph(start, y));
                }
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open
        && rows.len() - start > config.min_glyph_height
    {
        glyphs.push(glyph(start, rows.len()));
    }

    Ok(glyphs)
}
