//! JSON configuration files for the analysis pipeline.
//!
//! Every section is optional; missing keys keep their defaults.
//!
//! ```json
//! {
//!   "lines": { "fixed": 4 },
//!   "include_title": true,
//!   "preprocess": { "binarization": { "mode": "otsu" } },
//!   "estimator": { "threshold_ratios": [0.2, 0.3] }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::AnalysisConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(json: &str) -> Result<AnalysisConfig, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Binarization, LineCount};

    #[test]
    fn empty_object_is_default() {
        assert_eq!(parse_config("{}").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg = parse_config(
            r#"{
                "lines": { "fixed": 4 },
                "include_title": true,
                "preprocess": { "binarization": { "mode": "otsu" } },
                "estimator": { "threshold_ratios": [0.2, 0.3] }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.lines, LineCount::Fixed(4));
        assert!(cfg.include_title);
        assert_eq!(cfg.preprocess.binarization, Binarization::Otsu);
        assert_eq!(cfg.preprocess.denoise_radius, 2);
        assert_eq!(cfg.estimator.threshold_ratios, vec![0.2, 0.3]);
        assert_eq!(cfg.estimator.distance_ratios, vec![0.08, 0.10, 0.12]);
    }
}
