use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

use crate::error::RelayResult;
use crate::services::{classifier::Classifier, upload};

/// POST /predict — relay the uploaded image to the external classifier and
/// return its normalized stdout.
pub async fn predict(
    mut payload: Multipart,
    classifier: web::Data<Classifier>,
) -> RelayResult<HttpResponse> {
    let stored = upload::receive_image(&mut payload).await?;
    log::info!(
        "predict: {} ({})",
        stored.image.original_name,
        stored.image.mime_type
    );

    let result = classifier.classify(stored.path()).await?;
    Ok(HttpResponse::Ok().json(result))
}
