//! Diagnostic rendering and summaries. Consumes [`PageLayout`] values only.

pub mod overlay;
pub use overlay::render_overlay;
pub mod profile;
pub use profile::render_profile_rgba;
pub mod summary;
pub use summary::{LayoutSummary, debug_details};

use std::fs;
use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage, imageops};

use crate::layout::PageLayout;

const PANEL_MIN_HEIGHT: u32 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("plot rendering failed: {0}")]
    Plot(String),

    #[error("pixel buffer does not match {width}x{height}")]
    Buffer { width: u32, height: u32 },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Overlay of the page with the projection panel stacked underneath.
pub fn render_diagnostic(source: &DynamicImage, layout: &PageLayout) -> Result<RgbaImage, ReportError> {
    let overlay = render_overlay(source, layout);
    let (width, height) = overlay.dimensions();
    let panel_height = (height / 4).max(PANEL_MIN_HEIGHT);

    let pixels = render_profile_rgba(width, panel_height, layout)?;
    let panel = RgbaImage::from_raw(width, panel_height, pixels).ok_or(ReportError::Buffer {
        width,
        height: panel_height,
    })?;

    let mut canvas = RgbaImage::from_pixel(width, height + panel_height, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &overlay, 0, 0);
    imageops::overlay(&mut canvas, &panel, 0, height as i64);
    Ok(canvas)
}

pub fn save_diagnostic(path: &Path, source: &DynamicImage, layout: &PageLayout) -> Result<(), ReportError> {
    let canvas = render_diagnostic(source, layout)?;
    ensure_parent(path)?;
    canvas.save(path)?;
    Ok(())
}

pub fn to_json_string(layout: &PageLayout) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(layout)?)
}

pub fn write_json(path: &Path, layout: &PageLayout) -> Result<(), ReportError> {
    let s = to_json_string(layout)?;
    ensure_parent(path)?;
    fs::write(path, s)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
