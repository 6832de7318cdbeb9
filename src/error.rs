use actix_multipart::MultipartError;
use actix_web::{error::ResponseError, HttpResponse};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub enum RelayError {
    /// Request carried no file under the `image` multipart field.
    MissingFile,
    /// Multipart payload could not be read.
    BadUpload(String),
    /// External process could not be spawned.
    ProcessStart(String),
    /// External process exited non-zero; carries its captured stderr.
    ProcessFailed { details: String },
    /// External process exceeded the configured deadline and was killed.
    ProcessTimeout(u64),
    /// Renderer exited 0 but the expected overlay file was never written.
    MissingHeatmapOutput,
    InternalError(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RelayError::MissingFile => write!(f, "No image uploaded"),
            RelayError::BadUpload(msg) => write!(f, "Malformed upload: {}", msg),
            RelayError::ProcessStart(_) => write!(f, "Failed to start classifier process"),
            RelayError::ProcessFailed { .. } => write!(f, "Classifier process failed"),
            RelayError::ProcessTimeout(secs) => {
                write!(f, "Classifier process timed out after {}s", secs)
            }
            RelayError::MissingHeatmapOutput => {
                write!(f, "Heatmap output file was not produced")
            }
            RelayError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for RelayError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorResponse {
            error: self.to_string(),
            details: match self {
                RelayError::ProcessFailed { details } => Some(details.clone()),
                RelayError::ProcessStart(msg) => Some(msg.clone()),
                _ => None,
            },
        };

        match self {
            RelayError::MissingFile | RelayError::BadUpload(_) => {
                HttpResponse::BadRequest().json(body)
            }
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

impl From<MultipartError> for RelayError {
    fn from(error: MultipartError) -> Self {
        RelayError::BadUpload(error.to_string())
    }
}

impl From<std::io::Error> for RelayError {
    fn from(error: std::io::Error) -> Self {
        RelayError::InternalError(format!("IO error: {}", error))
    }
}
