use async_trait::async_trait;
use chrono::Utc;
use common::storage::MediaKind;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr};

use super::fields::{ChangeSet, FieldErrors, FieldReader};
use super::{FieldPatch, ImageUpdate, Reconcile, Rejection};
use crate::entity::activity;
use crate::repository;

pub mod activity_keys {
    pub const NAME: &[&str] = &["name", "nom"];
    pub const DESCRIPTION: &[&str] = &["description"];
    pub const VENUE_ID: &[&str] = &["venue_id", "venueId", "stade_id"];
    pub const CATEGORY: &[&str] = &["category"];
    pub const PRICE: &[&str] = &["price"];
    pub const ADDRESS: &[&str] = &["address"];
    pub const RATING: &[&str] = &["rating"];
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActivityPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub venue_id: Option<i32>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub address: Option<String>,
    pub rating: Option<Option<f64>>,
}

impl ActivityPatch {
    pub fn from_changes(changes: &ChangeSet) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(changes);

        let patch = Self {
            name: r.required_text("name", activity_keys::NAME, "Name"),
            description: r.nullable_text(activity_keys::DESCRIPTION),
            venue_id: r
                .required_int(
                    "venue_id",
                    activity_keys::VENUE_ID,
                    "Venue",
                    1..=i64::from(i32::MAX),
                    "Venue id must be a positive integer",
                )
                .map(|v| v as i32),
            category: r.required_text("category", activity_keys::CATEGORY, "Category"),
            price: r.required_float("price", activity_keys::PRICE, "Price", "Price must be a number"),
            address: r.required_text("address", activity_keys::ADDRESS, "Address"),
            rating: r.nullable_float(
                "rating",
                activity_keys::RATING,
                Some(0.0..=5.0),
                "Rating must be between 0 and 5",
            ),
        };

        let mut errors = r.finish().err().unwrap_or_default();
        if patch.price.is_some_and(|p| p < 0.0) {
            errors.add("price", "Price must be greater than or equal to 0");
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(patch)
    }

    pub fn apply(self, active: &mut activity::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(description) = self.description {
            active.description = Set(description);
        }
        if let Some(venue_id) = self.venue_id {
            active.venue_id = Set(venue_id);
        }
        if let Some(category) = self.category {
            active.category = Set(category);
        }
        if let Some(price) = self.price {
            active.price = Set(price);
        }
        if let Some(address) = self.address {
            active.address = Set(address);
        }
        if let Some(rating) = self.rating {
            active.rating = Set(rating);
        }
    }
}

impl FieldPatch for ActivityPatch {
    fn fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("venue_id", self.venue_id.is_some()),
            ("category", self.category.is_some()),
            ("price", self.price.is_some()),
            ("address", self.address.is_some()),
            ("rating", self.rating.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }
}

/// Activity updates. The venue reference is checked before anything is
/// written.
pub struct ActivityReconciler;

#[async_trait]
impl Reconcile for ActivityReconciler {
    type Record = activity::Model;
    type Patch = ActivityPatch;

    const KIND: MediaKind = MediaKind::Activity;

    async fn find(
        &self,
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<activity::Model>, DbErr> {
        repository::activity::find_model(db, id).await
    }

    fn image<'r>(&self, record: &'r activity::Model) -> Option<&'r str> {
        record.image.as_deref()
    }

    async fn prepare(
        &self,
        db: &DatabaseConnection,
        _id: i32,
        changes: &ChangeSet,
    ) -> Result<ActivityPatch, Rejection> {
        let patch = ActivityPatch::from_changes(changes)?;

        if let Some(venue_id) = patch.venue_id
            && !repository::venue::exists(db, venue_id).await?
        {
            return Err(Rejection::MissingReference(FieldErrors::single(
                "venue_id",
                "Venue does not exist",
            )));
        }

        Ok(patch)
    }

    async fn commit(
        &self,
        db: &DatabaseConnection,
        id: i32,
        patch: ActivityPatch,
        image: &ImageUpdate,
    ) -> Result<Option<activity::Model>, DbErr> {
        let mut active = activity::ActiveModel {
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
