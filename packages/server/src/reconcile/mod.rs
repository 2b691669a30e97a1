//! Partial updates for records that own an uploaded image.
//!
//! The new image (if any) is already in the media store when reconciliation
//! starts. Every step after that either commits the record and retires the
//! superseded file, or discards the new file before returning, so the
//! `image` column and the uploads tree never drift apart.

mod activity;
mod fields;
mod venue;

use async_trait::async_trait;
use common::storage::{MediaKind, MediaStore};
use sea_orm::{DatabaseConnection, DbErr};
use tracing::{debug, info, warn};

use crate::error::AppError;

pub use activity::{ActivityPatch, ActivityReconciler, activity_keys};
pub use fields::{ChangeSet, FieldErrors, FieldReader, MAX_TEXT_LEN, RawValue};
pub use venue::{VenuePatch, VenueReconciler, venue_keys};

/// What happens to the `image` column on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpdate {
    Keep,
    Replace(String),
    Remove,
}

impl ImageUpdate {
    /// Column value to write: `None` leaves the column untouched.
    pub fn column_value(&self) -> Option<Option<String>> {
        match self {
            Self::Keep => None,
            Self::Replace(reference) => Some(Some(reference.clone())),
            Self::Remove => Some(None),
        }
    }
}

/// A partial update as received from the transport layer.
#[derive(Debug, Default)]
pub struct UpdateRequest {
    pub changes: ChangeSet,
    /// Reference of a freshly stored image that the update should adopt.
    pub upload: Option<String>,
}

#[derive(Debug)]
pub enum UpdateOutcome<T> {
    Success(T),
    NotFound,
    NoFieldsProvided,
    ValidationFailed(FieldErrors),
    ReferentialIntegrityFailed(FieldErrors),
    PersistenceFailed(DbErr),
}

impl<T> UpdateOutcome<T> {
    /// Map to the HTTP error taxonomy. `entity` is the display name used in
    /// not-found messages.
    pub fn into_result(self, entity: &str) -> Result<T, AppError> {
        match self {
            Self::Success(record) => Ok(record),
            Self::NotFound => Err(AppError::NotFound(format!("{entity} not found"))),
            Self::NoFieldsProvided => Err(AppError::Validation(
                "No valid fields provided for update".into(),
            )),
            Self::ValidationFailed(errors) => Err(AppError::invalid_fields(errors)),
            Self::ReferentialIntegrityFailed(errors) => Err(AppError::Unprocessable {
                message: "Referenced record does not exist".into(),
                errors,
            }),
            Self::PersistenceFailed(err) => Err(AppError::from(err)),
        }
    }
}

/// Why a change set could not be turned into a patch.
#[derive(Debug)]
pub enum Rejection {
    Invalid(FieldErrors),
    MissingReference(FieldErrors),
    Database(DbErr),
}

impl From<DbErr> for Rejection {
    fn from(err: DbErr) -> Self {
        Self::Database(err)
    }
}

impl From<FieldErrors> for Rejection {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// A typed set of column assignments.
pub trait FieldPatch {
    /// Canonical names of the columns this patch writes.
    fn fields(&self) -> Vec<&'static str>;

    fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Entity-specific half of an update: lookup, validation and the single
/// UPDATE statement.
#[async_trait]
pub trait Reconcile: Send + Sync {
    type Record: Send;
    type Patch: FieldPatch + Send;

    const KIND: MediaKind;

    async fn find(&self, db: &DatabaseConnection, id: i32) -> Result<Option<Self::Record>, DbErr>;

    fn image<'r>(&self, record: &'r Self::Record) -> Option<&'r str>;

    /// Parse and validate the present fields. May read from `db`, never writes.
    async fn prepare(
        &self,
        db: &DatabaseConnection,
        id: i32,
        changes: &ChangeSet,
    ) -> Result<Self::Patch, Rejection>;

    /// Issue exactly one UPDATE. `Ok(None)` if the row no longer exists.
    async fn commit(
        &self,
        db: &DatabaseConnection,
        id: i32,
        patch: Self::Patch,
        image: &ImageUpdate,
    ) -> Result<Option<Self::Record>, DbErr>;
}

/// Apply `request` to record `id`.
///
/// Ordering: lookup, validate, commit, then delete the superseded file. Any
/// failure before the commit succeeds removes `request.upload` from the
/// media store before returning.
pub async fn reconcile<R: Reconcile>(
    reconciler: &R,
    db: &DatabaseConnection,
    media: &dyn MediaStore,
    id: i32,
    request: UpdateRequest,
) -> UpdateOutcome<R::Record> {
    let UpdateRequest { changes, upload } = request;
    let kind = R::KIND;

    if changes.is_empty() && upload.is_none() {
        return UpdateOutcome::NoFieldsProvided;
    }

    let existing = match reconciler.find(db, id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(%kind, id, "Update target not found");
            discard(media, upload.as_deref()).await;
            return UpdateOutcome::NotFound;
        }
        Err(e) => {
            discard(media, upload.as_deref()).await;
            return UpdateOutcome::PersistenceFailed(e);
        }
    };

    let patch = match reconciler.prepare(db, id, &changes).await {
        Ok(patch) => patch,
        Err(rejection) => {
            discard(media, upload.as_deref()).await;
            return match rejection {
                Rejection::Invalid(errors) => {
                    debug!(%kind, id, ?errors, "Update rejected");
                    UpdateOutcome::ValidationFailed(errors)
                }
                Rejection::MissingReference(errors) => {
                    debug!(%kind, id, ?errors, "Update references a missing record");
                    UpdateOutcome::ReferentialIntegrityFailed(errors)
                }
                Rejection::Database(e) => UpdateOutcome::PersistenceFailed(e),
            };
        }
    };

    let image = match &upload {
        Some(reference) => ImageUpdate::Replace(reference.clone()),
        None if changes.removes_image() => ImageUpdate::Remove,
        None => ImageUpdate::Keep,
    };

    if patch.is_empty() && image == ImageUpdate::Keep {
        return UpdateOutcome::NoFieldsProvided;
    }

    let previous = reconciler.image(&existing).map(str::to_owned);
    let fields = patch.fields();

    let record = match reconciler.commit(db, id, patch, &image).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            discard(media, upload.as_deref()).await;
            return UpdateOutcome::NotFound;
        }
        Err(e) => {
            warn!(%kind, id, error = %e, "Update failed, discarding new image");
            discard(media, upload.as_deref()).await;
            return UpdateOutcome::PersistenceFailed(e);
        }
    };

    if image != ImageUpdate::Keep
        && let Some(old) = previous
        && upload.as_deref() != Some(old.as_str())
    {
        retire(media, &old).await;
    }

    info!(%kind, id, ?fields, image = ?image, "Record updated");
    UpdateOutcome::Success(record)
}

/// Remove a freshly stored image that will not be adopted.
async fn discard(media: &dyn MediaStore, upload: Option<&str>) {
    let Some(reference) = upload else {
        return;
    };
    if let Err(e) = media.delete(reference).await {
        warn!(reference, error = %e, "Failed to discard uploaded image");
    }
}

/// Remove an image that is no longer referenced. Failures are logged only;
/// the committed record is authoritative.
pub(crate) async fn retire(media: &dyn MediaStore, reference: &str) {
    match media.delete(reference).await {
        Ok(true) => debug!(reference, "Removed superseded image"),
        Ok(false) => debug!(reference, "Superseded image was already gone"),
        Err(e) => warn!(reference, error = %e, "Failed to remove superseded image"),
    }
}
