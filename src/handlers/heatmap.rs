use std::path::PathBuf;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use tokio::fs;

use crate::config::{AppConfig, HEATMAP_ROUTE};
use crate::error::{RelayError, RelayResult};
use crate::models::HeatmapResponse;
use crate::services::{classifier::Classifier, upload};

/// POST /heatmap — relay the uploaded image to the overlay renderer and
/// return a URL to the generated file, served under `HEATMAP_ROUTE`.
pub async fn heatmap(
    req: HttpRequest,
    mut payload: Multipart,
    classifier: web::Data<Classifier>,
    config: web::Data<AppConfig>,
) -> RelayResult<HttpResponse> {
    let stored = upload::receive_image(&mut payload).await?;

    let output_dir = PathBuf::from(&config.heatmap.dir);
    fs::create_dir_all(&output_dir).await?;

    let output_path = upload::heatmap_output_path(stored.path(), &output_dir);
    classifier.render_heatmap(stored.path(), &output_path).await?;

    let file_name = output_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| RelayError::InternalError("heatmap path has no file name".to_string()))?
        .to_string();

    let info = req.connection_info();
    let url = format!(
        "{}://{}{}/{}",
        info.scheme(),
        info.host(),
        HEATMAP_ROUTE,
        file_name
    );
    log::info!("heatmap: {} -> {}", stored.image.original_name, file_name);

    Ok(HttpResponse::Ok().json(HeatmapResponse { heatmap: url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use actix_files::Files;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const BOUNDARY: &str = "leaf-relay-test";

    fn write_script(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("renderer.sh");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn test_config(bin: &str, heatmap_dir: &str) -> AppConfig {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            classifier: ClassifierConfig {
                predict_bin: bin.to_string(),
                heatmap_bin: bin.to_string(),
                timeout_secs: 5,
            },
            heatmap: crate::config::HeatmapConfig {
                dir: heatmap_dir.to_string(),
            },
        }
    }

    fn image_form(bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"leaf.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    #[actix_web::test]
    async fn returns_url_and_serves_generated_overlay() {
        let dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        // Renderer stub: copies the input image to the requested output path.
        let bin = write_script(&dir, "#!/bin/sh\ncp \"$1\" \"$2\"\n");
        let config = test_config(&bin, out_dir.path().to_str().unwrap());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Classifier::from_config(&config.classifier)))
                .app_data(web::Data::new(config.clone()))
                .service(web::resource("/heatmap").route(web::post().to(heatmap)))
                .service(Files::new(HEATMAP_ROUTE, out_dir.path())),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/heatmap")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(image_form(b"overlay bytes"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        let url = body["heatmap"].as_str().unwrap().to_string();
        assert!(url.contains("/heatmaps/"));
        assert!(url.ends_with("_heatmap.jpg"));

        // Round-trip: the URL path must serve the bytes the renderer wrote.
        let path = url.split_once("/heatmaps/").map(|(_, f)| f).unwrap();
        let get = test::TestRequest::get()
            .uri(&format!("/heatmaps/{}", path))
            .to_request();
        let served = test::call_service(&app, get).await;
        assert_eq!(served.status(), 200);
        assert_eq!(test::read_body(served).await.as_ref(), b"overlay bytes".as_ref());
    }

    #[actix_web::test]
    async fn missing_artifact_is_500() {
        let dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let bin = write_script(&dir, "#!/bin/sh\nexit 0\n");
        let config = test_config(&bin, out_dir.path().to_str().unwrap());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Classifier::from_config(&config.classifier)))
                .app_data(web::Data::new(config))
                .service(web::resource("/heatmap").route(web::post().to(heatmap))),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/heatmap")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(image_form(b"x"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Heatmap output file was not produced" }));
    }

    #[actix_web::test]
    async fn missing_file_is_400() {
        let out_dir = TempDir::new().unwrap();
        let config = test_config("/does/not/exist", out_dir.path().to_str().unwrap());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Classifier::from_config(&config.classifier)))
                .app_data(web::Data::new(config))
                .service(web::resource("/heatmap").route(web::post().to(heatmap))),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/heatmap")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(format!("--{}--\r\n", BOUNDARY).into_bytes())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "No image uploaded" }));
    }
}
