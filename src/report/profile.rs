use plotters::prelude::*;

use super::ReportError;
use crate::layout::PageLayout;

const RAW_COLOR: RGBColor = RGBColor(150, 150, 150);
const SMOOTHED_COLOR: RGBColor = RGBColor(220, 40, 40);
const BAND_COLOR: RGBColor = RGBColor(120, 160, 230);
const ESTIMATE_COLOR: RGBColor = RGBColor(40, 170, 60);
const MARGIN: i32 = 6;

fn plot_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Plot(e.to_string())
}

/// Renders the page's column profile as an RGBA pixel buffer.
///
/// Raw counts in grey, the smoothed curve in red, every detected band as a
/// shaded span, and auto-estimate peaks as green markers. The x axis is the
/// page x axis scaled to `width`.
pub fn render_profile_rgba(width: u32, height: u32, layout: &PageLayout) -> Result<Vec<u8>, ReportError> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| ReportError::Plot("width*height overflow".to_string()))?;

    let mut rgb = vec![255u8; pixel_count * 3];

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let raw: Vec<f64> = layout.profile.values().iter().map(|&v| v as f64).collect();
        let smoothed = layout.smoothed.values();
        let len = raw.len().max(1);
        let top = raw.iter().copied().fold(1.0, f64::max);

        let x_at = |i: usize| ((i as f64 * width as f64 / len as f64) as i32).min(width as i32 - 1);
        let plot_h = (height as i32 - 2 * MARGIN).max(1) as f64;
        let y_at = |v: f64| MARGIN + (plot_h * (1.0 - (v / top).clamp(0.0, 1.0))) as i32;

        for band in &layout.bands {
            root.draw(&Rectangle::new(
                [(x_at(band.left), MARGIN), (x_at(band.right), height as i32 - MARGIN)],
                BAND_COLOR.mix(0.25).filled(),
            ))
            .map_err(plot_err)?;
        }

        let raw_path: Vec<(i32, i32)> = raw.iter().enumerate().map(|(i, &v)| (x_at(i), y_at(v))).collect();
        root.draw(&PathElement::new(raw_path, RAW_COLOR))
            .map_err(plot_err)?;

        let smooth_path: Vec<(i32, i32)> = smoothed
            .iter()
            .enumerate()
            .map(|(i, &v)| (x_at(i), y_at(v)))
            .collect();
        root.draw(&PathElement::new(smooth_path, SMOOTHED_COLOR.stroke_width(2)))
            .map_err(plot_err)?;

        if let Some(estimate) = &layout.estimate {
            for &p in &estimate.peaks {
                let v = smoothed.get(p).copied().unwrap_or(0.0);
                root.draw(&Circle::new((x_at(p), y_at(v)), 5, ESTIMATE_COLOR.filled()))
                    .map_err(plot_err)?;
            }
        }

        root.present().map_err(plot_err)?;
    }

    let mut rgba = vec![255u8; pixel_count * 4];
    for (dst, src) in rgba.chunks_exact_mut(4).zip(rgb.chunks_exact(3)) {
        dst[..3].copy_from_slice(src);
    }

    Ok(rgba)
}
