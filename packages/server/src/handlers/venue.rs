use axum::{
    Json,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::storage::{MediaKind, MediaStore};
use sea_orm::SqlErr;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::form::RecordForm;
use crate::models::shared::{ApiResponse, missing_fields};
use crate::models::venue::{VenueForm, VenueResponse};
use crate::reconcile::{
    FieldErrors, UpdateRequest, VenuePatch, VenueReconciler, reconcile, venue_keys,
};
use crate::repository::{self, venue::NewVenue};
use crate::state::AppState;

/// Body limit for venue and activity writes: the image cap plus room for the
/// other form fields. Oversized images are still reported as 413.
pub fn upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.storage.max_image_size as usize + 64 * 1024)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Venues",
    operation_id = "listVenues",
    summary = "List venues",
    responses(
        (status = 200, description = "All venues, ordered by name", body = ApiResponse<Vec<VenueResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_venues(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<VenueResponse>>>, AppError> {
    let venues = repository::venue::find_all(&state.db).await?;
    Ok(Json(ApiResponse::list(
        venues.into_iter().map(VenueResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Venues",
    operation_id = "getVenue",
    summary = "Get a venue by ID",
    params(("id" = i32, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Venue details", body = ApiResponse<VenueResponse>),
        (status = 404, description = "Venue not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VenueResponse>>, AppError> {
    let venue = repository::venue::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".into()))?;
    Ok(Json(ApiResponse::new(venue.into())))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Venues",
    operation_id = "createVenue",
    summary = "Create a venue",
    description = "Accepts JSON, urlencoded or multipart bodies. `name`, `city` and `capacity` are required; an image may be attached as the multipart part `image`.",
    request_body(content = VenueForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Venue created", body = ApiResponse<VenueResponse>),
        (status = 400, description = "Missing fields or unsupported image type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Field validation failed (UNPROCESSABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn create_venue(
    State(state): State<AppState>,
    form: RecordForm,
) -> Result<impl IntoResponse, AppError> {
    if let Some(missing) = missing_fields(
        &form.changes,
        &[
            ("name", venue_keys::NAME),
            ("city", venue_keys::CITY),
            ("capacity", venue_keys::CAPACITY),
        ],
    ) {
        return Err(AppError::Validation(format!(
            "Missing required fields: {missing}"
        )));
    }

    let patch = VenuePatch::from_changes(&form.changes).map_err(AppError::invalid_fields)?;
    let (Some(name), Some(city), Some(capacity)) = (patch.name, patch.city, patch.capacity) else {
        return Err(AppError::Validation(
            "Missing required fields: name, city, capacity".into(),
        ));
    };

    if repository::venue::name_taken(&state.db, &name, None).await? {
        return Err(name_taken());
    }

    let image = match form.image {
        Some(ref upload) => Some(upload.store(&state, MediaKind::Venue).await?),
        None => None,
    };

    let new = NewVenue {
        name,
        city,
        capacity,
        description: patch.description.flatten(),
        latitude: patch.latitude.flatten(),
        longitude: patch.longitude.flatten(),
        year_built: patch.year_built.flatten(),
        image: image.clone(),
    };

    let venue = match repository::venue::create(&state.db, new).await {
        Ok(venue) => venue,
        Err(e) => {
            if let Some(ref reference) = image
                && let Err(err) = state.media.delete(reference).await
            {
                warn!(reference, error = %err, "Failed to discard image after insert failure");
            }
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => name_taken(),
                _ => AppError::from(e),
            });
        }
    };

    info!(id = venue.id, name = %venue.name, "Venue created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            VenueResponse::from(venue),
            "Venue created successfully",
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Venues",
    operation_id = "updateVenue",
    summary = "Update a venue",
    description = "Partial update: only the fields present are written. Attaching an image replaces the current one; `remove_image=true`, `image=null` or `image=\"\"` clears it. Superseded images are deleted after the update commits.",
    params(("id" = i32, Path, description = "Venue ID")),
    request_body(content = VenueForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Venue updated", body = ApiResponse<VenueResponse>),
        (status = 400, description = "No valid fields or unsupported image type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Venue not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Field validation failed (UNPROCESSABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form), fields(id))]
pub async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: RecordForm,
) -> Result<Json<ApiResponse<VenueResponse>>, AppError> {
    let upload = match form.image {
        Some(ref image) => Some(image.store(&state, MediaKind::Venue).await?),
        None => None,
    };

    let venue = reconcile(
        &VenueReconciler,
        &state.db,
        state.media.as_ref(),
        id,
        UpdateRequest {
            changes: form.changes,
            upload,
        },
    )
    .await
    .into_result("Venue")?;

    Ok(Json(ApiResponse::with_message(
        VenueResponse::from(venue),
        "Venue updated successfully",
    )))
}

fn name_taken() -> AppError {
    AppError::invalid_fields(FieldErrors::single("name", "This name is already taken"))
}
