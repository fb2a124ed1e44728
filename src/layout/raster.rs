//! Binary ink rasters and the greyscale → denoise → binarize stage that produces them.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use kornia::{
    image::{Image, ImageSize, allocator::CpuAllocator},
    imgproc,
};
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::LayoutError;

type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

const DENOISE_RADIUS: u32 = 2;
const ADAPTIVE_BLOCK_SIZE: u32 = 11;
const ADAPTIVE_OFFSET: i16 = 2;

/// Row-major grid of ink flags. `true` marks foreground (ink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRaster {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl BinaryRaster {
    pub fn new(width: usize, height: usize, data: Vec<bool>) -> Result<Self, LayoutError> {
        if data.len() != width * height {
            return Err(LayoutError::RasterSize {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A raster with no ink.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, ink: impl Fn(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(ink(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Builds a raster from an 8-bit mask where any non-zero byte is ink.
    pub fn from_mask(width: usize, height: usize, mask: &[u8]) -> Result<Self, LayoutError> {
        Self::new(width, height, mask.iter().map(|&px| px != 0).collect())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, ink: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = ink;
        }
    }

    /// Fills the half-open rectangle `[x0, x1) × [y0, y1)`, clipped to the raster.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.data[y * self.width + x] = true;
            }
        }
    }

    pub fn row(&self, y: usize) -> &[bool] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn ink_count(&self) -> usize {
        self.data.iter().filter(|&&ink| ink).count()
    }

    /// Ink rendered white on black, for saving the intermediate stage.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            if self.get(x as usize, y as usize) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }
}

/// How the denoised greyscale page is split into ink and paper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Binarization {
    /// Gaussian-weighted local mean over a `block_size` window minus `offset`;
    /// pixels at or below the local threshold are ink.
    Adaptive { block_size: u32, offset: i16 },
    /// Global Otsu threshold; the minority class is taken as ink.
    Otsu,
}

impl Default for Binarization {
    fn default() -> Self {
        Binarization::Adaptive {
            block_size: ADAPTIVE_BLOCK_SIZE,
            offset: ADAPTIVE_OFFSET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Median filter radius used for denoising; 0 disables it.
    pub denoise_radius: u32,
    pub binarization: Binarization,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denoise_radius: DENOISE_RADIUS,
            binarization: Binarization::default(),
        }
    }
}

/// Converts a decoded page into a [`BinaryRaster`] whose dimensions match the source.
pub fn binarize(source: &DynamicImage, config: &PreprocessConfig) -> Result<BinaryRaster, LayoutError> {
    let rgb = source.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(LayoutError::EmptyRaster);
    }
    let size = ImageSize {
        width: width as usize,
        height: height as usize,
    };

    let image = CpuImage::<u8, 3>::new(size, rgb.into_raw(), CpuAllocator)?;
    let mut gray = CpuImage::<u8, 1>::from_size_val(image.size(), 0u8, CpuAllocator)?;
    imgproc::color::gray_from_rgb_u8(&image, &mut gray)?;

    let gray = GrayImage::from_raw(width, height, gray.as_slice().to_vec()).ok_or(
        LayoutError::RasterSize {
            width: size.width,
            height: size.height,
            actual: gray.as_slice().len(),
        },
    )?;
    let denoised = if config.denoise_radius > 0 {
        median_filter(&gray, config.denoise_radius, config.denoise_radius)
    } else {
        gray
    };

    let mask = match config.binarization {
        Binarization::Adaptive { block_size, offset } => adaptive_mask(&denoised, block_size, offset),
        Binarization::Otsu => otsu_mask(denoised, size)?,
    };

    let raster = BinaryRaster::from_mask(size.width, size.height, &mask)?;
    debug!(
        "binarized {}x{} page, {} ink pixels",
        raster.width(),
        raster.height(),
        raster.ink_count()
    );
    Ok(raster)
}

fn adaptive_mask(gray: &GrayImage, block_size: u32, offset: i16) -> Vec<u8> {
    // Same sigma a Gaussian kernel of `block_size` taps gets when none is given.
    let block = block_size.max(3) as f32;
    let sigma = (0.3 * ((block - 1.0) * 0.5 - 1.0) + 0.8).max(0.5);
    let local_mean = gaussian_blur_f32(gray, sigma);

    gray.pixels()
        .zip(local_mean.pixels())
        .map(|(px, mean)| {
            let threshold = mean[0] as i32 - offset as i32;
            if (px[0] as i32) <= threshold { 255u8 } else { 0u8 }
        })
        .collect()
}

fn otsu_mask(gray: GrayImage, size: ImageSize) -> Result<Vec<u8>, LayoutError> {
    let threshold = otsu_threshold(gray.as_raw());
    debug!("otsu threshold {threshold}");

    let gray = CpuImage::<u8, 1>::new(size, gray.into_raw(), CpuAllocator)?;
    let mut binary = CpuImage::<u8, 1>::from_size_val(gray.size(), 0u8, CpuAllocator)?;
    imgproc::threshold::threshold_binary(&gray, &mut binary, threshold, 255)?;

    let mut mask = binary.as_slice().to_vec();
    ensure_foreground_convention(&mut mask);
    Ok(mask)
}

/// Ink is assumed to be the minority class; flip the mask when it is not.
fn ensure_foreground_convention(mask: &mut [u8]) {
    let foreground = mask.iter().filter(|&&px| px != 0).count();
    if foreground * 2 < mask.len() {
        return;
    }
    for px in mask.iter_mut() {
        *px = if *px == 0 { 255 } else { 0 };
    }
}

fn otsu_threshold(pixels: &[u8]) -> u8 {
    let mut histogram = [0u32; 256];
    for &value in pixels {
        histogram[value as usize] += 1;
    }

    let total_pixels = pixels.len() as f64;
    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut sum_background = 0f64;
    let mut weight_background = 0f64;
    let mut max_variance = f64::MIN;
    let mut threshold = 0u8;

    for (value, &count) in histogram.iter().enumerate() {
        weight_background += count as f64;
        if weight_background == 0.0 {
            continue;
        }

        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0.0 {
            break;
        }

        sum_background += value as f64 * count as f64;

        let mean_background = sum_background / weight_background;
        let mean_foreground = (sum_total - sum_background) / weight_foreground;
        let variance =
            weight_background * weight_foreground * (mean_background - mean_foreground).powi(2);

        if variance > max_variance {
            max_variance = variance;
            threshold = value as u8;
        }
    }

    threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let mut pixels = vec![20u8; 100];
        pixels.extend(std::iter::repeat_n(230u8, 300));
        let t = otsu_threshold(&pixels);
        assert!((20..230).contains(&t), "threshold {t}");
    }

    #[test]
    fn foreground_convention_flips_majority() {
        let mut mask = vec![255u8, 255, 255, 0];
        ensure_foreground_convention(&mut mask);
        assert_eq!(mask, vec![0, 0, 0, 255]);
    }

    #[test]
    fn raster_rejects_mismatched_data() {
        let err = BinaryRaster::new(4, 4, vec![false; 15]).unwrap_err();
        assert!(matches!(err, LayoutError::RasterSize { actual: 15, .. }));
    }
}
