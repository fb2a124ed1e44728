//! Draws the detected layout on top of the source page.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::layout::{GlyphRegion, PageLayout, SubRegion, SubRegionKind};

const COLOR_TITLE: Rgba<u8> = Rgba([255, 215, 0, 255]);
const COLOR_FUJI: Rgba<u8> = Rgba([100, 200, 255, 255]);
const COLOR_SHOGA: Rgba<u8> = Rgba([255, 100, 100, 255]);
const COLOR_HYOSHI: Rgba<u8> = Rgba([100, 255, 100, 255]);
const COLOR_SHOGA_GLYPH: Rgba<u8> = Rgba([255, 0, 0, 255]);
const COLOR_FUJI_GLYPH: Rgba<u8> = Rgba([0, 0, 255, 255]);
const LINE_PALETTE: [Rgba<u8>; 6] = [
    Rgba([0, 0, 255, 255]),
    Rgba([0, 255, 0, 255]),
    Rgba([255, 0, 0, 255]),
    Rgba([0, 255, 255, 255]),
    Rgba([255, 0, 255, 255]),
    Rgba([255, 255, 0, 255]),
];

const STRIP_TOP: usize = 10;
const STRIP_BOTTOM: usize = 40;

/// Colour used for the body column at position `line` (0-based) in reading order.
pub fn line_color(line: usize) -> Rgba<u8> {
    LINE_PALETTE[line % LINE_PALETTE.len()]
}

/// Returns a copy of `source` with title/column boxes, sub-region strips and glyph boxes drawn.
pub fn render_overlay(source: &DynamicImage, layout: &PageLayout) -> RgbaImage {
    let mut canvas = source.to_rgba8();
    let bottom = canvas.height() as usize;

    if let Some((left, right)) = layout.title_info.coordinates {
        draw_box(&mut canvas, (left, 0), (right, bottom), 3, COLOR_TITLE);
    }

    for (line, decomposition) in layout.columns.iter().enumerate() {
        let column = &decomposition.column;
        draw_box(&mut canvas, (column.left(), 0), (column.right(), bottom), 2, line_color(line));

        if let Some(structure) = &decomposition.structure {
            for region in structure.regions() {
                draw_strip(&mut canvas, &region);
            }
        }
    }

    for glyph in layout.glyphs() {
        draw_glyph(&mut canvas, glyph);
    }

    canvas
}

fn draw_strip(canvas: &mut RgbaImage, region: &SubRegion) {
    let color = match region.kind {
        SubRegionKind::Fuji => COLOR_FUJI,
        SubRegionKind::Shoga => COLOR_SHOGA,
        SubRegionKind::Hyoshi => COLOR_HYOSHI,
    };
    if let Some(rect) = clipped_rect(canvas, (region.left, STRIP_TOP), (region.right, STRIP_BOTTOM)) {
        draw_filled_rect_mut(canvas, rect, color);
    }
}

fn draw_glyph(canvas: &mut RgbaImage, glyph: &GlyphRegion) {
    let color = match glyph.label {
        SubRegionKind::Shoga => COLOR_SHOGA_GLYPH,
        SubRegionKind::Fuji => COLOR_FUJI_GLYPH,
        SubRegionKind::Hyoshi => return,
    };
    draw_box(
        canvas,
        (glyph.col_start, glyph.row_start),
        (glyph.col_end, glyph.row_end),
        2,
        color,
    );
}

/// Hollow box over the half-open area `[top_left, bottom_right)`, growing inwards.
fn draw_box(
    canvas: &mut RgbaImage,
    top_left: (usize, usize),
    bottom_right: (usize, usize),
    thickness: usize,
    color: Rgba<u8>,
) {
    for t in 0..thickness {
        let inner_tl = (top_left.0 + t, top_left.1 + t);
        let inner_br = (bottom_right.0.saturating_sub(t), bottom_right.1.saturating_sub(t));
        if let Some(rect) = clipped_rect(canvas, inner_tl, inner_br) {
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

fn clipped_rect(canvas: &RgbaImage, top_left: (usize, usize), bottom_right: (usize, usize)) -> Option<Rect> {
    let x1 = bottom_right.0.min(canvas.width() as usize);
    let y1 = bottom_right.1.min(canvas.height() as usize);
    if top_left.0 >= x1 || top_left.1 >= y1 {
        return None;
    }
    Some(
        Rect::at(top_left.0 as i32, top_left.1 as i32)
            .of_size((x1 - top_left.0) as u32, (y1 - top_left.1) as u32),
    )
}
