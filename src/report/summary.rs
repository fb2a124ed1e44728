//! Human-readable page summaries.

use std::fmt;

use crate::layout::PageLayout;

/// `Display` adapter printing the layout summary of a page.
pub struct LayoutSummary<'a> {
    layout: &'a PageLayout,
}

impl<'a> LayoutSummary<'a> {
    pub fn new(layout: &'a PageLayout) -> Self {
        Self { layout }
    }
}

impl fmt::Display for LayoutSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout;
        let stats = &layout.stats;
        let rule = "=".repeat(60);

        writeln!(f, "{rule}")?;
        writeln!(f, "Score layout analysis")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Expected lines: {}", layout.expected_lines)?;
        if let Some(estimate) = &layout.estimate {
            writeln!(
                f,
                "Estimated lines: {} (confidence {:.2}{})",
                estimate.count,
                estimate.confidence,
                if estimate.fallback { ", fallback" } else { "" }
            )?;
        }
        writeln!(f, "Detected lines (vertical columns): {}", stats.num_lines)?;
        writeln!(f, "Glyph regions: {} (Shoga + Fuji only)", stats.num_glyphs)?;

        if let Some((left, right)) = layout.title_info.coordinates {
            writeln!(
                f,
                "Title {}: x {left}-{right} (width {}px)",
                if layout.title_info.included_in_analysis { "column" } else { "candidate" },
                right - left
            )?;
        }

        if let (Some(max), Some(min)) = (stats.line_widths.iter().max(), stats.line_widths.iter().min()) {
            writeln!(f, "Average line width: {:.2}px", stats.avg_line_width)?;
            writeln!(f, "Widest line: {max}px")?;
            writeln!(f, "Narrowest line: {min}px")?;
        }

        if let (Some(max), Some(min)) = (stats.glyphs_per_line.iter().max(), stats.glyphs_per_line.iter().min()) {
            let avg = stats.num_glyphs as f64 / stats.glyphs_per_line.len() as f64;
            writeln!(f, "Glyphs per line: avg {avg:.1}, max {max}, min {min}")?;
        }

        let (shoga, fuji) = (stats.total_shoga(), stats.total_fuji());
        if shoga + fuji > 0 {
            let total = (shoga + fuji) as f64;
            writeln!(f)?;
            writeln!(f, "Sub-region glyphs:")?;
            writeln!(f, "  Shoga: {shoga}")?;
            writeln!(f, "  Fuji: {fuji}")?;
            writeln!(
                f,
                "  Shoga/Fuji ratio: {:.1}% / {:.1}%",
                shoga as f64 / total * 100.0,
                fuji as f64 / total * 100.0
            )?;
        }

        if !stats.line_spacing.is_empty() {
            writeln!(f, "Average line spacing: {:.2}px", stats.avg_line_spacing)?;
        }

        writeln!(f)?;
        writeln!(f, "Lines:")?;
        for (i, width) in stats.line_widths.iter().enumerate() {
            write!(f, "  Line {}: width={width}px, glyphs={}", i + 1, stats.glyphs_per_line[i])?;
            let (s, fu) = (stats.shoga_per_line[i], stats.fuji_per_line[i]);
            if s > 0 || fu > 0 {
                write!(f, " (Shoga:{s}, Fuji:{fu})")?;
            }
            if layout.columns[i].sub_peak_missing() {
                write!(f, " [no Shoga peak]")?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "Characteristics:")?;
        for remark in remarks(layout) {
            writeln!(f, "  - {remark}")?;
        }

        writeln!(f)?;
        writeln!(f, "{}", verdict(layout))?;
        if layout.is_low_confidence() {
            writeln!(
                f,
                "Warning: the line count estimate has low confidence; consider passing --lines explicitly."
            )?;
        }
        Ok(())
    }
}

/// Qualitative observations about the page layout.
pub fn remarks(layout: &PageLayout) -> Vec<String> {
    let stats = &layout.stats;
    let mut out = Vec::new();

    if stats.num_lines >= 3 {
        out.push("multi-line score".to_string());
    } else {
        out.push("simple layout".to_string());
    }

    if stats.glyphs_per_line.iter().any(|&n| n > 20) {
        out.push("contains long phrases".to_string());
    }

    if !stats.line_spacing.is_empty() {
        if stats.avg_line_spacing > 50.0 {
            out.push("wide line spacing, easy to read".to_string());
        } else if stats.avg_line_spacing < 30.0 {
            out.push("dense layout".to_string());
        }
    }

    let (shoga, fuji) = (stats.total_shoga(), stats.total_fuji());
    out.push(
        match shoga.cmp(&fuji) {
            std::cmp::Ordering::Greater => "Shoga-dominant (lyrics and notation)",
            std::cmp::Ordering::Less => "Fuji-dominant (ornaments and auxiliary marks)",
            std::cmp::Ordering::Equal => "balanced Shoga and Fuji",
        }
        .to_string(),
    );

    out
}

/// One-line assessment comparing the requested (or estimated) and detected line counts.
pub fn verdict(layout: &PageLayout) -> String {
    let detected = layout.stats.num_lines;
    match &layout.estimate {
        Some(estimate) => {
            let diff = estimate.count.abs_diff(detected);
            match diff {
                0 => format!("EXCELLENT: estimated {} lines and detected {detected}", estimate.count),
                1 => format!(
                    "GOOD: estimate of {} lines is within one of the {detected} detected",
                    estimate.count
                ),
                _ => format!(
                    "NOTICE: estimate of {} lines is off by {diff}; try --lines {detected}",
                    estimate.count
                ),
            }
        }
        None if detected == layout.expected_lines => {
            format!("SUCCESS: detected the expected {detected} lines")
        }
        None => format!(
            "NOTICE: detected {detected} lines (expected {}); parameters may need tuning",
            layout.expected_lines
        ),
    }
}

/// Coordinates and profile statistics printed in debug mode.
pub fn debug_details(layout: &PageLayout) -> String {
    let mut out = String::new();
    out.push_str("Detected column coordinates:\n");
    for (i, column) in layout.body_columns().enumerate() {
        out.push_str(&format!(
            "  Line {}: x {}-{} (width {}px)\n",
            i + 1,
            column.left(),
            column.right(),
            column.width()
        ));
    }
    if let Some((left, right)) = layout.title_info.coordinates {
        out.push_str(&format!(
            "  Title: x {left}-{right} (width {}px), {}\n",
            right - left,
            if layout.title_info.included_in_analysis { "included" } else { "excluded" }
        ));
    }
    out.push_str("Column profile:\n");
    out.push_str(&format!("  max: {}\n", layout.profile.max()));
    out.push_str(&format!("  mean: {:.2}\n", layout.profile.mean()));
    out.push_str(&format!("  std: {:.2}\n", layout.profile.std_dev()));
    out
}
