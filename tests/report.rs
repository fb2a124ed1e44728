mod common;

use common::synthetic_page::{FUJI_GLYPHS, SHOGA_GLYPHS, score_raster, to_page_image};
use image::{DynamicImage, GrayImage, Luma};
use score_layout::config::{ConfigError, load_config};
use score_layout::layout::{
    AnalysisConfig, Binarization, LayoutError, LineCount, PreprocessConfig, SubRegionKind, analyze_image,
    analyze_path, analyze_raster, binarize,
};
use score_layout::report::{LayoutSummary, debug_details, render_diagnostic, save_diagnostic, to_json_string};

const LEFTS: [usize; 4] = [100, 300, 500, 700];

fn otsu_config() -> AnalysisConfig {
    AnalysisConfig {
        preprocess: PreprocessConfig {
            binarization: Binarization::Otsu,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn score_page() -> DynamicImage {
    DynamicImage::ImageLuma8(to_page_image(&score_raster(900, &LEFTS)))
}

#[test]
fn otsu_pipeline_recovers_score_columns() {
    let layout = analyze_image(&score_page(), &otsu_config()).unwrap();
    assert_eq!((layout.width, layout.height), (900, 1000));
    assert_eq!(layout.columns.len(), 4);
    for decomposition in &layout.columns {
        assert_eq!(decomposition.glyph_count(SubRegionKind::Shoga), SHOGA_GLYPHS);
        assert_eq!(decomposition.glyph_count(SubRegionKind::Fuji), FUJI_GLYPHS);
    }
}

#[test]
fn adaptive_binarization_marks_thin_strokes() {
    // Three columns of three 4px strokes each, dark on light.
    let is_ink = |x: u32| {
        [100u32, 300, 500]
            .iter()
            .any(|&left| [0u32, 10, 20].iter().any(|&dx| (left + dx..left + dx + 4).contains(&x)))
    };
    let page = GrayImage::from_fn(600, 400, |x, _| if is_ink(x) { Luma([20]) } else { Luma([235]) });

    let raster = binarize(&DynamicImage::ImageLuma8(page), &PreprocessConfig::default()).unwrap();
    assert_eq!((raster.width(), raster.height()), (600, 400));
    assert_eq!(raster.ink_count(), 3 * 3 * 4 * 400);
    assert!(raster.get(101, 200));
    assert!(!raster.get(106, 200));

    let config = AnalysisConfig {
        lines: LineCount::Fixed(3),
        ..Default::default()
    };
    let layout = analyze_raster(&raster, &config).unwrap();
    let lefts: Vec<usize> = layout.body_columns().map(|c| c.left()).collect();
    assert_eq!(lefts.len(), 3);
    for (left, expected) in lefts.iter().zip([500usize, 300, 100]) {
        assert!(left.abs_diff(expected) <= 15, "left {left}, expected {expected}");
    }
}

#[test]
fn diagnostic_stacks_profile_panel_under_page() {
    let page = score_page();
    let layout = analyze_image(&page, &otsu_config()).unwrap();
    let canvas = render_diagnostic(&page, &layout).unwrap();
    assert_eq!(canvas.dimensions(), (900, 1000 + 250));

    let small = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 100, Luma([235])));
    let layout = analyze_image(&small, &otsu_config()).unwrap();
    let canvas = render_diagnostic(&small, &layout).unwrap();
    assert_eq!(canvas.dimensions(), (200, 100 + 120));
}

#[test]
fn diagnostic_is_written_to_nested_path() {
    let dir = tempfile::tempdir().unwrap();
    let page = score_page();
    let layout = analyze_image(&page, &otsu_config()).unwrap();

    let out = dir.path().join("diagnostics").join("page.png");
    save_diagnostic(&out, &page, &layout).unwrap();
    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (900, 1250));
}

#[test]
fn analyze_path_reads_pages_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.png");
    score_page().save(&path).unwrap();

    let layout = analyze_path(&path, &otsu_config()).unwrap();
    assert_eq!(layout.columns.len(), 4);

    let missing = analyze_path(&dir.path().join("absent.png"), &otsu_config());
    assert!(matches!(missing, Err(LayoutError::Input { .. })));
}

#[test]
fn json_carries_layout_without_profiles() {
    let layout = analyze_image(&score_page(), &otsu_config()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&to_json_string(&layout).unwrap()).unwrap();

    assert_eq!(json["columns"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["estimate"]["count"], 4);
    assert_eq!(json["stats"]["num_lines"], 4);
    assert_eq!(json["title_info"]["detected"], false);
    assert!(json.get("profile").is_none());
    assert!(json.get("smoothed").is_none());
    assert_eq!(json["columns"][0]["glyphs"][0]["label"], "Shoga");
}

#[test]
fn summary_reports_counts_and_verdict() {
    let layout = analyze_image(&score_page(), &otsu_config()).unwrap();
    let text = LayoutSummary::new(&layout).to_string();
    assert!(text.contains("Detected lines (vertical columns): 4"));
    assert!(text.contains(&format!("Glyph regions: {}", 4 * (SHOGA_GLYPHS + FUJI_GLYPHS))));
    assert!(text.contains("EXCELLENT"));
    assert!(!text.contains("low confidence"));

    let fixed = AnalysisConfig {
        lines: LineCount::Fixed(4),
        ..otsu_config()
    };
    let layout = analyze_image(&score_page(), &fixed).unwrap();
    assert!(LayoutSummary::new(&layout).to_string().contains("SUCCESS"));

    let details = debug_details(&layout);
    assert!(details.contains("Line 4: x "));
    assert!(details.contains("max: "));
}

#[test]
fn blank_page_summary_warns() {
    let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 200, Luma([235])));
    let layout = analyze_image(&blank, &AnalysisConfig::default()).unwrap();
    let text = LayoutSummary::new(&layout).to_string();
    assert!(text.contains("Detected lines (vertical columns): 0"));
    assert!(text.contains("low confidence"));
}

#[test]
fn config_files_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.json");
    std::fs::write(&path, r#"{ "lines": { "fixed": 5 }, "decomposer": { "min_glyph_height": 4 } }"#).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.lines, LineCount::Fixed(5));
    assert_eq!(config.decomposer.min_glyph_height, 4);
    assert_eq!(config.decomposer.shoga_divisor, 6);

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    assert!(matches!(
        load_config(&dir.path().join("missing.json")),
        Err(ConfigError::Read { .. })
    ));
}
