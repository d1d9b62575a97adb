use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::plots::{EmbeddingStyle, GifOptions, NetworkStyle, RadarStyle, SaveOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "ExportConfig::default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub png: SaveOptions,
    #[serde(default)]
    pub gif: GifOptions,
}

impl ExportConfig {
    fn default_output_dir() -> String {
        "target/plots/gallery".to_string()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
            png: SaveOptions::default(),
            gif: GifOptions::default(),
        }
    }
}

/// Styling defaults for every chart type plus export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VizConfig {
    #[serde(default)]
    pub network: NetworkStyle,
    #[serde(default)]
    pub radar: RadarStyle,
    #[serde(default)]
    pub embedding: EmbeddingStyle,
    #[serde(default)]
    pub export: ExportConfig,
}

impl VizConfig {
    /// Read `path`; fall back to defaults when it cannot be read or parsed.
    /// A missing file is created with every default commented out.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, comment_out(&text)) {
                    warn!("Failed to write default config to {path}: {err}");
                } else {
                    info!("Wrote default config to {path}");
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}; continuing with defaults"),
        }
        default_cfg
    }
}

/// Prefix every key line with `# `, leaving table headers active so the file
/// documents the defaults without pinning them.
fn comment_out(text: &str) -> String {
    let mut commented = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            commented.push('\n');
        } else if trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains('=') {
            commented.push_str(line);
            commented.push('\n');
        } else {
            commented.push_str("# ");
            commented.push_str(line);
            commented.push('\n');
        }
    }
    commented
}
