use std::path::PathBuf;

use kornia::image::ImageError;

/// Errors that abort the analysis of a single page.
///
/// Everything recoverable (no bands, missing Shoga peak, weak estimate) is
/// reported through [`crate::layout::LayoutWarning`] on the page result instead.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to load image {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("raster has no pixels")]
    EmptyRaster,

    #[error("raster data has {actual} pixels, expected {width}x{height}")]
    RasterSize {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("kornia image error: {0}")]
    Kornia(#[from] ImageError),
}
