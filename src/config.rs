use config::ConfigError;
use serde::Deserialize;

/// URL prefix the heatmap output directory is mounted under.
pub const HEATMAP_ROUTE: &str = "/heatmaps";

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Executable invoked as `<predict_bin> <image_path>`.
    pub predict_bin: String,
    /// Executable invoked as `<heatmap_bin> <image_path> <output_path>`.
    pub heatmap_bin: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapConfig {
    /// Directory the heatmap renderer writes overlays into; served read-only
    /// under `HEATMAP_ROUTE`.
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub classifier: ClassifierConfig,
    pub heatmap: HeatmapConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(AppConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("APP_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Message("Invalid APP_PORT".into()))?,
            classifier: ClassifierConfig {
                predict_bin: std::env::var("APP_CLASSIFIER__PREDICT_BIN")
                    .unwrap_or_else(|_| "./predict.py".to_string()),
                heatmap_bin: std::env::var("APP_CLASSIFIER__HEATMAP_BIN")
                    .unwrap_or_else(|_| "./gradcam.py".to_string()),
                timeout_secs: std::env::var("APP_CLASSIFIER__TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::Message("Invalid APP_CLASSIFIER__TIMEOUT_SECS".into())
                    })?,
            },
            heatmap: HeatmapConfig {
                dir: std::env::var("APP_HEATMAP__DIR").unwrap_or_else(|_| "./heatmaps".to_string()),
            },
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            classifier: ClassifierConfig {
                predict_bin: "./predict.py".to_string(),
                heatmap_bin: "./gradcam.py".to_string(),
                timeout_secs: 60,
            },
            heatmap: HeatmapConfig {
                dir: "./heatmaps".to_string(),
            },
        }
    }
}
