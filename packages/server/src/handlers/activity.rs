use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::storage::{MediaKind, MediaStore};
use tracing::{info, instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::form::RecordForm;
use crate::models::activity::{ActivityForm, ActivityResponse};
use crate::models::shared::{ApiResponse, missing_fields};
use crate::reconcile::{
    ActivityPatch, ActivityReconciler, FieldErrors, UpdateRequest, activity_keys, reconcile,
};
use crate::repository::{
    self,
    activity::{ActivityRecord, NewActivity},
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Activities",
    operation_id = "listActivities",
    summary = "List activities",
    description = "Newest first, each with its venue's name and city.",
    responses(
        (status = 200, description = "All activities", body = ApiResponse<Vec<ActivityResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_activities(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ActivityResponse>>>, AppError> {
    let records = repository::activity::find_all(&state.db).await?;
    Ok(Json(ApiResponse::list(
        records.into_iter().map(ActivityResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Activities",
    operation_id = "getActivity",
    summary = "Get an activity by ID",
    params(("id" = i32, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Activity details", body = ApiResponse<ActivityResponse>),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ActivityResponse>>, AppError> {
    let record = repository::activity::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity not found".into()))?;
    Ok(Json(ApiResponse::new(record.into())))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Activities",
    operation_id = "createActivity",
    summary = "Create an activity",
    description = "`name`, `venue_id`, `category`, `price` and `address` are required. The venue must exist.",
    request_body(content = ActivityForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Activity created", body = ApiResponse<ActivityResponse>),
        (status = 400, description = "Missing fields or unsupported image type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Field validation failed or unknown venue (UNPROCESSABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn create_activity(
    State(state): State<AppState>,
    form: RecordForm,
) -> Result<impl IntoResponse, AppError> {
    if let Some(missing) = missing_fields(
        &form.changes,
        &[
            ("name", activity_keys::NAME),
            ("venue_id", activity_keys::VENUE_ID),
            ("category", activity_keys::CATEGORY),
            ("price", activity_keys::PRICE),
            ("address", activity_keys::ADDRESS),
        ],
    ) {
        return Err(AppError::Validation(format!(
            "Missing required fields: {missing}"
        )));
    }

    let patch = ActivityPatch::from_changes(&form.changes).map_err(AppError::invalid_fields)?;
    let (Some(name), Some(venue_id), Some(category), Some(price), Some(address)) = (
        patch.name,
        patch.venue_id,
        patch.category,
        patch.price,
        patch.address,
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: name, venue_id, category, price, address".into(),
        ));
    };

    if !repository::venue::exists(&state.db, venue_id).await? {
        return Err(AppError::Unprocessable {
            message: "Referenced record does not exist".into(),
            errors: FieldErrors::single("venue_id", "Venue does not exist"),
        });
    }

    let image = match form.image {
        Some(ref upload) => Some(upload.store(&state, MediaKind::Activity).await?),
        None => None,
    };

    let new = NewActivity {
        name,
        description: patch.description.flatten(),
        venue_id,
        category,
        price,
        address,
        rating: patch.rating.flatten(),
        image: image.clone(),
    };

    let activity = match repository::activity::create(&state.db, new).await {
        Ok(activity) => activity,
        Err(e) => {
            if let Some(ref reference) = image
                && let Err(err) = state.media.delete(reference).await
            {
                warn!(reference, error = %err, "Failed to discard image after insert failure");
            }
            return Err(e.into());
        }
    };

    info!(id = activity.id, venue_id, "Activity created");
    let record = enriched(&state, activity).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            ActivityResponse::from(record),
            "Activity created successfully",
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Activities",
    operation_id = "updateActivity",
    summary = "Update an activity",
    description = "Partial update with the same image rules as venues. A `venue_id` that does not resolve is rejected before anything is written.",
    params(("id" = i32, Path, description = "Activity ID")),
    request_body(content = ActivityForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Activity updated", body = ApiResponse<ActivityResponse>),
        (status = 400, description = "No valid fields or unsupported image type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Field validation failed or unknown venue (UNPROCESSABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form), fields(id))]
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: RecordForm,
) -> Result<Json<ApiResponse<ActivityResponse>>, AppError> {
    let upload = match form.image {
        Some(ref image) => Some(image.store(&state, MediaKind::Activity).await?),
        None => None,
    };

    let activity = reconcile(
        &ActivityReconciler,
        &state.db,
        state.media.as_ref(),
        id,
        UpdateRequest {
            changes: form.changes,
            upload,
        },
    )
    .await
    .into_result("Activity")?;

    let record = enriched(&state, activity).await?;
    Ok(Json(ApiResponse::with_message(
        ActivityResponse::from(record),
        "Activity updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Activities",
    operation_id = "deleteActivity",
    summary = "Delete an activity",
    description = "Deletes the activity, then its image. The deleted record is returned.",
    params(("id" = i32, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Activity deleted", body = ApiResponse<ActivityResponse>),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ActivityResponse>>, AppError> {
    let record = repository::activity::delete(&state.db, state.media.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity not found".into()))?;

    Ok(Json(ApiResponse::with_message(
        ActivityResponse::from(record),
        "Activity deleted successfully",
    )))
}

/// Re-read with the venue join. Falls back to the bare row if it vanished
/// in between.
async fn enriched(
    state: &AppState,
    activity: crate::entity::activity::Model,
) -> Result<ActivityRecord, AppError> {
    Ok(repository::activity::find_by_id(&state.db, activity.id)
        .await?
        .unwrap_or(ActivityRecord {
            activity,
            venue: None,
        }))
}
