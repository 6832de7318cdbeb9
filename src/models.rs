use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An uploaded file staged on disk for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub path: PathBuf,
    pub original_name: String,
    pub mime_type: String,
}

/// One classifier result entry as written to stdout by the external process.
/// The service passes these through as-is; ordering and confidence ranges are
/// whatever the classifier produced.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Prediction {
    pub class: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeatmapResponse {
    pub heatmap: String,
}
