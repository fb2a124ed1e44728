#![allow(dead_code)]

use image::{GrayImage, Luma};
use score_layout::layout::{BinaryRaster, SmoothedProfile};

pub const INK: u8 = 20;
pub const PAPER: u8 = 235;

/// Full-height solid ink bands of `band_width` starting at each of `lefts`.
pub fn band_raster(width: usize, height: usize, lefts: &[usize], band_width: usize) -> BinaryRaster {
    let mut raster = BinaryRaster::blank(width, height);
    for &left in lefts {
        raster.fill_rect(left, 0, left + band_width, height);
    }
    raster
}

/// Offsets inside a 90px score column.
pub const FUJI_X: (usize, usize) = (8, 28);
pub const SHOGA_X: (usize, usize) = (35, 55);
pub const HYOSHI_X: (usize, usize) = (62, 82);
pub const SHOGA_GLYPHS: usize = 8;
pub const FUJI_GLYPHS: usize = 4;

/// Draws one score column at `left`: tall Shoga glyph blocks in the middle,
/// shorter Fuji marks to their left and small Hyoshi ticks to their right.
pub fn draw_score_column(raster: &mut BinaryRaster, left: usize) {
    for k in 0..SHOGA_GLYPHS {
        let top = 60 + k * 110;
        raster.fill_rect(left + SHOGA_X.0, top, left + SHOGA_X.1, top + 70);
    }
    for k in 0..FUJI_GLYPHS {
        let top = 80 + k * 220;
        raster.fill_rect(left + FUJI_X.0, top, left + FUJI_X.1, top + 40);
    }
    for k in 0..9 {
        let top = 100 + k * 100;
        raster.fill_rect(left + HYOSHI_X.0, top, left + HYOSHI_X.1, top + 10);
    }
}

/// A 1000px tall page holding one score column per entry of `lefts`.
pub fn score_raster(width: usize, lefts: &[usize]) -> BinaryRaster {
    let mut raster = BinaryRaster::blank(width, 1000);
    for &left in lefts {
        draw_score_column(&mut raster, left);
    }
    raster
}

/// Dark-on-light greyscale rendering of a raster, as a scanner would deliver it.
pub fn to_page_image(raster: &BinaryRaster) -> GrayImage {
    GrayImage::from_fn(raster.width() as u32, raster.height() as u32, |x, y| {
        if raster.get(x as usize, y as usize) {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

/// Sum of equal Gaussian bumps, one per center.
pub fn bump_profile(len: usize, centers: &[f64], sigma: f64, heights: &[f64]) -> SmoothedProfile {
    let values = (0..len)
        .map(|i| {
            centers
                .iter()
                .zip(heights.iter().cycle())
                .map(|(&c, &h)| h * (-0.5 * ((i as f64 - c) / sigma).powi(2)).exp())
                .sum()
        })
        .collect();
    SmoothedProfile::from_values(values)
}
