//! Column and glyph-region layout recovery for vertically written Japanese
//! traditional-music score pages.
//!
//! ```no_run
//! use score_layout::layout::{AnalysisConfig, analyze_path};
//! use score_layout::report::LayoutSummary;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = analyze_path("page.png".as_ref(), &AnalysisConfig::default())?;
//! println!("{}", LayoutSummary::new(&layout));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod layout;
pub mod report;

pub use layout::{AnalysisConfig, LayoutError, LineCount, PageLayout};
