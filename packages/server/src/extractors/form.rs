use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use common::storage::MediaKind;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::reconcile::ChangeSet;
use crate::state::AppState;
use crate::utils::image::image_extension;

/// Name of the multipart part carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// An image part as received, not yet stored.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    /// Validate the file type for `kind` and write it to the media store.
    /// Returns the stored reference.
    pub async fn store(&self, state: &AppState, kind: MediaKind) -> Result<String, AppError> {
        let ext = image_extension(
            kind,
            self.file_name.as_deref(),
            self.content_type.as_deref(),
        )?;
        Ok(state.media.store(kind, &self.bytes, &ext).await?)
    }
}

/// Record fields from a JSON, urlencoded or multipart body, plus the image
/// part when the body is multipart.
///
/// Every scalar arrives as text so the same parsing rules apply whatever the
/// encoding. Oversized images are rejected here with 413, before anything
/// touches storage.
#[derive(Debug, Default)]
pub struct RecordForm {
    pub changes: ChangeSet,
    pub image: Option<ImageUpload>,
}

impl FromRequest<AppState> for RecordForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            read_multipart(multipart, state.config.storage.max_image_size).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            let mut changes = ChangeSet::new();
            for (key, value) in pairs {
                changes.insert_text(key, value);
            }
            Ok(Self {
                changes,
                image: None,
            })
        } else if content_type.starts_with("application/json") {
            let Json(map) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self {
                changes: ChangeSet::from_json(map),
                image: None,
            })
        } else {
            Err(AppError::Validation(
                "Expected a JSON, urlencoded or multipart/form-data body".into(),
            ))
        }
    }
}

async fn read_multipart(mut multipart: Multipart, max_size: u64) -> Result<RecordForm, AppError> {
    let mut form = RecordForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(max_size)
        } else {
            AppError::Validation(format!("Multipart error: {e}"))
        }
    })? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == IMAGE_FIELD && field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    too_large(max_size)
                } else {
                    AppError::Validation(format!("Failed to read image: {e}"))
                }
            })?;
            if bytes.len() as u64 > max_size {
                return Err(too_large(max_size));
            }
            // A file input left empty still sends a part.
            if !bytes.is_empty() {
                form.image = Some(ImageUpload {
                    bytes,
                    file_name,
                    content_type,
                });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
        form.changes.insert_text(name, text);
    }

    Ok(form)
}

fn too_large(limit: u64) -> AppError {
    AppError::PayloadTooLarge(format!("File too large. Maximum size is {limit} bytes"))
}
