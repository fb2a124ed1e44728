pub mod error;
pub use error::LayoutError;
pub mod raster;
pub use raster::{Binarization, BinaryRaster, PreprocessConfig, binarize};
pub mod projection;
pub use projection::{Axis, ProjectionProfile, SmoothedProfile, project, project_window};
pub mod peaks;
pub use peaks::{Band, BandOrder, PeakCriteria, SegmenterConfig, find_peaks, segment};
pub mod estimator;
pub use estimator::{ColumnEstimate, EstimatorGrid, estimate_column_count};
pub mod classifier;
pub use classifier::{Classification, Column, ColumnRole, classify_columns};
pub mod subregion;
pub use subregion::{
    ColumnDecomposition, ColumnStructure, DecomposerConfig, GlyphRegion, SubRegion, SubRegionKind,
    decompose_column,
};
pub mod page;
pub use page::{
    AnalysisConfig, LayoutStats, LayoutWarning, LineCount, PageLayout, TitleInfo, analyze_image,
    analyze_path, analyze_raster,
};
