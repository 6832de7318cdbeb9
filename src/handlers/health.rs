use std::path::Path;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::AppConfig;

/// GET /health — always 200; reports whether the configured external
/// executables are present on disk.
pub async fn health(config: web::Data<AppConfig>) -> HttpResponse {
    let classifier = presence(&config.classifier.predict_bin);
    let renderer = presence(&config.classifier.heatmap_bin);

    let status = if classifier == "available" && renderer == "available" {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(json!({
        "status": status,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "classifier": classifier,
            "heatmap_renderer": renderer,
        }
    }))
}

fn presence(bin: &str) -> &'static str {
    if Path::new(bin).exists() {
        "available"
    } else {
        "missing"
    }
}
