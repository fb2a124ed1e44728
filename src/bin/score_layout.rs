use clap::Parser;
use log::{error, info, warn};
use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use score_layout::config::load_config;
use score_layout::layout::{AnalysisConfig, LayoutError, LineCount, PageLayout, analyze_raster, binarize};
use score_layout::report::{LayoutSummary, debug_details, save_diagnostic, write_json};

#[derive(Parser, Debug)]
#[command(
    name = "score_layout",
    about = "Detect vertical columns and Shoga/Fuji/Hyoshi regions in score page images",
    version
)]
struct Cli {
    /// Score page image, or a directory of page images
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Expected number of body lines (estimated automatically when omitted)
    #[arg(short = 'l', long = "lines", value_parser = clap::value_parser!(u32).range(1..))]
    lines: Option<u32>,

    /// Verbose logging, binarized page dump and coordinate listing
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Diagnostic image path
    #[arg(short = 'o', long = "output", default_value = "score_layout_analysis.png")]
    output: PathBuf,

    /// Model the rightmost column as a title column
    #[arg(short = 't', long = "include-title")]
    include_title: bool,

    /// Disable estimation; requires --lines
    #[arg(short = 'm', long = "manual-lines", requires = "lines")]
    manual_lines: bool,

    /// JSON analysis configuration
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Also write the layout as JSON to this path
    #[arg(short = 'j', long = "json")]
    json: Option<PathBuf>,
}

fn is_image_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" | "webp"
    )
}

/// `out.png` + page `p3.jpg` -> `out_p3.png` when more than one page is processed.
fn per_page_path(base: &Path, page: &Path, batch: bool) -> PathBuf {
    if !batch {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(OsStr::to_str).unwrap_or("out");
    let page_stem = page.file_stem().and_then(OsStr::to_str).unwrap_or("page");
    let name = match base.extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{stem}_{page_stem}.{ext}"),
        None => format!("{stem}_{page_stem}"),
    };
    base.with_file_name(name)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or("out");
    path.with_file_name(format!("{stem}_{suffix}.png"))
}

fn analysis_config(cli: &Cli) -> Result<AnalysisConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    // --manual-lines cannot be given without --lines, so an explicit count always wins.
    if let Some(n) = cli.lines {
        config.lines = LineCount::Fixed(n as usize);
    }
    if cli.manual_lines {
        info!("automatic line estimation disabled");
    }
    if cli.include_title {
        config.include_title = true;
    }
    Ok(config)
}

fn process_page(cli: &Cli, config: &AnalysisConfig, page: &Path, batch: bool) -> Result<PageLayout, Box<dyn Error>> {
    let source = image::open(page).map_err(|source| LayoutError::Input {
        path: page.to_path_buf(),
        source,
    })?;
    info!("analyzing {} ({}x{})", page.display(), source.width(), source.height());

    let raster = binarize(&source, &config.preprocess)?;
    let layout = analyze_raster(&raster, config)?;

    let out_image = per_page_path(&cli.output, page, batch);
    save_diagnostic(&out_image, &source, &layout)?;
    info!("wrote {}", out_image.display());

    if cli.debug {
        let out_binary = with_suffix(&out_image, "binary");
        raster.to_luma().save(&out_binary)?;
        info!("wrote {}", out_binary.display());
    }

    if let Some(json) = &cli.json {
        let out_json = per_page_path(json, page, batch);
        write_json(&out_json, &layout)?;
        info!("wrote {}", out_json.display());
    }

    Ok(layout)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.debug {
        "debug"
    } else {
        "info"
    }))
    .init();

    let config = analysis_config(&cli)?;
    match config.lines {
        LineCount::Auto => info!("line count: automatic"),
        LineCount::Fixed(n) => info!("line count: {n}"),
    }
    info!("title column modelling: {}", if config.include_title { "on" } else { "off" });

    let pages: Vec<PathBuf> = if cli.image.is_dir() {
        let mut images: Vec<PathBuf> = fs::read_dir(&cli.image)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        images.sort();
        images
    } else {
        vec![cli.image.clone()]
    };

    if pages.is_empty() {
        warn!("No images found in {}", cli.image.display());
        return Ok(());
    }

    let batch = pages.len() > 1;
    let mut failures = 0usize;
    for page in &pages {
        match process_page(&cli, &config, page, batch) {
            Ok(layout) => {
                println!("{}", LayoutSummary::new(&layout));
                if cli.debug {
                    println!("{}", debug_details(&layout));
                }
            }
            Err(e) => {
                error!("{}: {e}", page.display());
                failures += 1;
            }
        }
    }

    if failures == pages.len() {
        return Err(format!("all {failures} page(s) failed").into());
    }
    Ok(())
}
