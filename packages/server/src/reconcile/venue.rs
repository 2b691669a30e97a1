use async_trait::async_trait;
use chrono::{Datelike, Utc};
use common::storage::MediaKind;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr};

use super::fields::{ChangeSet, FieldErrors, FieldReader};
use super::{FieldPatch, ImageUpdate, Reconcile, Rejection};
use crate::entity::venue;
use crate::repository;

/// Accepted input names per venue column.
pub mod venue_keys {
    pub const NAME: &[&str] = &["name", "nom"];
    pub const CITY: &[&str] = &["city", "ville"];
    pub const CAPACITY: &[&str] = &["capacity", "capacite"];
    pub const DESCRIPTION: &[&str] = &["description"];
    pub const LATITUDE: &[&str] = &["latitude"];
    pub const LONGITUDE: &[&str] = &["longitude"];
    pub const YEAR_BUILT: &[&str] = &["year_built", "yearBuilt", "annee_construction"];
}

pub const MIN_YEAR_BUILT: i64 = 1800;

/// Typed column assignments for a venue.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VenuePatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i32>,
    pub description: Option<Option<String>>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub year_built: Option<Option<i32>>,
}

impl VenuePatch {
    /// Parse and range-check the present fields. Does not check name uniqueness.
    pub fn from_changes(changes: &ChangeSet) -> Result<Self, FieldErrors> {
        let max_year = i64::from(Utc::now().year()) + 1;
        let mut r = FieldReader::new(changes);

        let patch = Self {
            name: r.required_text("name", venue_keys::NAME, "Name"),
            city: r.required_text("city", venue_keys::CITY, "City"),
            capacity: r
                .required_int(
                    "capacity",
                    venue_keys::CAPACITY,
                    "Capacity",
                    1..=i64::from(i32::MAX),
                    "Capacity must be an integer greater than 0",
                )
                .map(|v| v as i32),
            description: r.nullable_text(venue_keys::DESCRIPTION),
            latitude: r.nullable_float(
                "latitude",
                venue_keys::LATITUDE,
                Some(-90.0..=90.0),
                "Latitude must be between -90 and 90",
            ),
            longitude: r.nullable_float(
                "longitude",
                venue_keys::LONGITUDE,
                Some(-180.0..=180.0),
                "Longitude must be between -180 and 180",
            ),
            year_built: r
                .nullable_int(
                    "year_built",
                    venue_keys::YEAR_BUILT,
                    MIN_YEAR_BUILT..=max_year,
                    &format!("Year must be between {MIN_YEAR_BUILT} and {max_year}"),
                )
                .map(|v| v.map(|y| y as i32)),
        };

        r.finish()?;
        Ok(patch)
    }

    pub fn apply(self, active: &mut venue::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(city) = self.city {
            active.city = Set(city);
        }
        if let Some(capacity) = self.capacity {
            active.capacity = Set(capacity);
        }
        if let Some(description) = self.description {
            active.description = Set(description);
        }
        if let Some(latitude) = self.latitude {
            active.latitude = Set(latitude);
        }
        if let Some(longitude) = self.longitude {
            active.longitude = Set(longitude);
        }
        if let Some(year_built) = self.year_built {
            active.year_built = Set(year_built);
        }
    }
}

impl FieldPatch for VenuePatch {
    fn fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("city", self.city.is_some()),
            ("capacity", self.capacity.is_some()),
            ("description", self.description.is_some()),
            ("latitude", self.latitude.is_some()),
            ("longitude", self.longitude.is_some()),
            ("year_built", self.year_built.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }
}

pub struct VenueReconciler;

#[async_trait]
impl Reconcile for VenueReconciler {
    type Record = venue::Model;
    type Patch = VenuePatch;

    const KIND: MediaKind = MediaKind::Venue;

    async fn find(&self, db: &DatabaseConnection, id: i32) -> Result<Option<venue::Model>, DbErr> {
        repository::venue::find_by_id(db, id).await
    }

    fn image<'r>(&self, record: &'r venue::Model) -> Option<&'r str> {
        record.image.as_deref()
    }

    async fn prepare(
        &self,
        db: &DatabaseConnection,
        id: i32,
        changes: &ChangeSet,
    ) -> Result<VenuePatch, Rejection> {
        let patch = VenuePatch::from_changes(changes)?;

        if let Some(ref name) = patch.name
            && repository::venue::name_taken(db, name, Some(id)).await?
        {
            return Err(Rejection::Invalid(FieldErrors::single(
                "name",
                "This name is already taken",
            )));
        }

        Ok(patch)
    }

    async fn commit(
        &self,
        db: &DatabaseConnection,
        id: i32,
        patch: VenuePatch,
        image: &ImageUpdate,
    ) -> Result<Option<venue::Model>, DbErr> {
        let mut active = venue::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        patch.apply(&mut active);
        if let Some(image) = image.column_value() {
            active.image = Set(image);
        }
        active.updated_at = Set(Utc::now());

        match active.update(db).await {
            Ok(model) => Ok(Some(model)),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
