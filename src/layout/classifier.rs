//! Title / body role assignment for page-level bands.

use log::debug;
use serde::Serialize;

use super::peaks::Band;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Title,
    Body,
}

/// A band with its role and 1-based right-to-left position among all bands found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    pub reading_index: usize,
    pub role: ColumnRole,
    pub band: Band,
}

impl Column {
    pub fn left(&self) -> usize {
        self.band.left
    }

    pub fn right(&self) -> usize {
        self.band.right
    }

    pub fn width(&self) -> usize {
        self.band.width()
    }
}

/// Outcome of [`classify_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// The title column, or with title modelling off, the rightmost band held
    /// back as a title candidate.
    pub title: Option<Column>,
    /// Body columns in reading order (right to left).
    pub body: Vec<Column>,
    /// Whether title modelling was requested.
    pub title_included: bool,
    pub bands_found: usize,
}

/// Splits bands (already sorted right to left) into an optional title and
/// `expected_body` body columns.
///
/// With `include_title`, the rightmost band is the title only when at least
/// `expected_body + 1` bands exist; otherwise no title is assigned and the
/// first `expected_body` bands are body columns.
///
/// Without it, whenever more bands than `expected_body` were found the
/// rightmost one is still set aside as a title candidate and excluded from the
/// body; otherwise every band found is a body column.
pub fn classify_columns(bands: &[Band], expected_body: usize, include_title: bool) -> Classification {
    let n = bands.len();
    let (title_slot, body_range) = if include_title {
        if n > expected_body {
            (Some(0), 1..expected_body.saturating_add(1))
        } else {
            (None, 0..n.min(expected_body))
        }
    } else if n > expected_body {
        (Some(0), 1..expected_body.saturating_add(1))
    } else {
        (None, 0..n)
    };

    let column = |i: usize, role: ColumnRole| Column {
        reading_index: i + 1,
        role,
        band: bands[i],
    };

    let title = title_slot.map(|i| column(i, ColumnRole::Title));
    let body: Vec<Column> = body_range.map(|i| column(i, ColumnRole::Body)).collect();

    if let Some(t) = &title {
        debug!(
            "title {}: x {}-{} (width {}px)",
            if include_title { "column" } else { "candidate" },
            t.left(),
            t.right(),
            t.width()
        );
    }
    debug!("{n} bands found, {} body columns selected", body.len());

    Classification {
        title,
        body,
        title_included: include_title,
        bands_found: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(peaks: &[usize]) -> Vec<Band> {
        peaks
            .iter()
            .map(|&p| Band {
                left: p - 30,
                right: p + 30,
                peak: p,
            })
            .collect()
    }

    #[test]
    fn title_requested_and_available() {
        let c = classify_columns(&bands(&[900, 700, 500, 300, 100]), 3, true);
        assert_eq!(c.title.map(|t| t.band.peak), Some(900));
        let peaks: Vec<usize> = c.body.iter().map(|col| col.band.peak).collect();
        assert_eq!(peaks, vec![700, 500, 300]);
        assert_eq!(c.body[0].reading_index, 2);
    }

    #[test]
    fn title_requested_but_too_few_bands() {
        let c = classify_columns(&bands(&[500, 300, 100]), 3, true);
        assert!(c.title.is_none());
        assert_eq!(c.body.len(), 3);
    }

    #[test]
    fn candidate_excluded_without_title_modelling() {
        let c = classify_columns(&bands(&[500, 300, 100]), 2, false);
        assert_eq!(c.title.map(|t| t.role), Some(ColumnRole::Title));
        let peaks: Vec<usize> = c.body.iter().map(|col| col.band.peak).collect();
        assert_eq!(peaks, vec![300, 100]);
    }

    #[test]
    fn fewer_bands_than_expected_uses_all() {
        let c = classify_columns(&bands(&[500, 300]), 4, false);
        assert!(c.title.is_none());
        assert_eq!(c.body.len(), 2);
    }

    #[test]
    fn classification_is_deterministic() {
        let b = bands(&[800, 600, 400, 200]);
        assert_eq!(classify_columns(&b, 3, false), classify_columns(&b, 3, false));
    }
}
