use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use futures_util::StreamExt;
use sanitize_filename::sanitize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{RelayError, RelayResult};
use crate::models::UploadedImage;

/// Multipart field the client must put its file under.
pub const IMAGE_FIELD: &str = "image";

/// An uploaded image staged in a per-request temp directory. The directory
/// (and the stored file) is removed when this is dropped, i.e. once the
/// request that received it completes.
#[derive(Debug)]
pub struct StoredUpload {
    staging: tempfile::TempDir,
    pub image: UploadedImage,
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.image.path
    }
}

/// Drain the multipart stream until the first file field named `image` and
/// stream its bytes to disk under a generated unique name. Fails with
/// `MissingFile` when the request carries no such field.
pub async fn receive_image(payload: &mut Multipart) -> RelayResult<StoredUpload> {
    let staging = tempfile::Builder::new()
        .prefix("uploads-")
        .tempdir()
        .map_err(|e| {
            RelayError::InternalError(format!("could not create staging directory: {}", e))
        })?;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        if field.name() != IMAGE_FIELD {
            continue;
        }

        let original_name = match field.content_disposition().get_filename() {
            Some(name) => sanitize(name),
            // A bare form value, not a file upload.
            None => continue,
        };
        let mime_type = field.content_type().to_string();
        let path = staging.path().join(stored_name(&original_name));

        let mut file = File::create(&path).await?;
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            file.write_all(&data).await?;
        }
        file.flush().await?;

        return Ok(StoredUpload {
            staging,
            image: UploadedImage {
                path,
                original_name,
                mime_type,
            },
        });
    }

    Err(RelayError::MissingFile)
}

fn stored_name(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "jpg".to_string());
    format!("{}.{}", Uuid::new_v4(), ext)
}

/// Expected overlay path for a stored upload: `<stem>_heatmap.jpg` inside
/// the output directory, mirroring the renderer's naming convention.
pub fn heatmap_output_path(stored: &Path, output_dir: &Path) -> PathBuf {
    let stem = stored
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    output_dir.join(format!("{}_heatmap.jpg", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_keeps_lowercased_extension() {
        let name = stored_name("Leaf Photo.JPG");
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 36 + 4);
    }

    #[test]
    fn stored_name_defaults_extension() {
        assert!(stored_name("leaf").ends_with(".jpg"));
    }

    #[test]
    fn heatmap_path_follows_renderer_convention() {
        let out = heatmap_output_path(Path::new("/tmp/abc123.png"), Path::new("./heatmaps"));
        assert_eq!(out, PathBuf::from("./heatmaps/abc123_heatmap.jpg"));
    }
}
