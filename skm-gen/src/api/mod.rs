//! HTTP API handlers for skm-gen
//!
//! JSON REST endpoints plus one streamed endpoint (`POST /api/generate`).

pub mod course;
pub mod diagnostics;
pub mod episode;
pub mod generate;
pub mod health;
pub mod models;
pub mod parse_csv;
pub mod runs;

pub use course::course_routes;
pub use diagnostics::diagnostics_routes;
pub use episode::episode_routes;
pub use generate::generate_routes;
pub use health::health_routes;
pub use models::model_routes;
pub use parse_csv::parse_csv_routes;
pub use runs::run_routes;

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the CSV upload
pub const CSV_FIELD: &str = "csv";

/// File name reported when the upload has none
const UNNAMED_UPLOAD: &str = "upload.csv";

/// Uploaded CSV file
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Parsed multipart form: the CSV file plus plain text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub csv: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Trimmed text field, `None` when missing or blank
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// The CSV upload, or 400
    pub fn require_csv(&mut self) -> ApiResult<UploadedFile> {
        self.csv
            .take()
            .ok_or_else(|| ApiError::BadRequest("CSV file is required".to_string()))
    }
}

/// Drain a multipart body into an [`UploadForm`]
pub async fn read_upload_form(multipart: &mut Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == CSV_FIELD {
            let file_name = field
                .file_name()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(UNNAMED_UPLOAD)
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read CSV upload: {}", e)))?;
            debug!(file = %file_name, bytes = bytes.len(), "Received CSV upload");
            form.csv = Some(UploadedFile { file_name, bytes });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
