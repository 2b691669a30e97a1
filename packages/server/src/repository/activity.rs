use chrono::Utc;
use common::storage::MediaStore;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryOrder};
use tracing::info;

use crate::entity::{activity, venue};
use crate::reconcile::retire;

/// Venue columns shown alongside an activity.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueSummary {
    pub name: String,
    pub city: String,
}

/// An activity joined with its venue. `venue` is `None` when the referenced
/// row is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub activity: activity::Model,
    pub venue: Option<VenueSummary>,
}

impl From<(activity::Model, Option<venue::Model>)> for ActivityRecord {
    fn from((activity, venue): (activity::Model, Option<venue::Model>)) -> Self {
        Self {
            activity,
            venue: venue.map(|v| VenueSummary {
                name: v.name,
                city: v.city,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub name: String,
    pub description: Option<String>,
    pub venue_id: i32,
    pub category: String,
    pub price: f64,
    pub address: String,
    pub rating: Option<f64>,
    pub image: Option<String>,
}

pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<ActivityRecord>, DbErr> {
    let rows = activity::Entity::find()
        .find_also_related(venue::Entity)
        .order_by_desc(activity::Column::CreatedAt)
        .order_by_desc(activity::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(ActivityRecord::from).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ActivityRecord>, DbErr> {
    let row = activity::Entity::find_by_id(id)
        .find_also_related(venue::Entity)
        .one(db)
        .await?;
    Ok(row.map(ActivityRecord::from))
}

/// The bare row, without the venue join.
pub async fn find_model<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<activity::Model>, DbErr> {
    activity::Entity::find_by_id(id).one(db).await
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewActivity) -> Result<activity::Model, DbErr> {
    let now = Utc::now();
    activity::ActiveModel {
        name: Set(new.name),
        description: Set(new.description),
        image: Set(new.image),
        venue_id: Set(new.venue_id),
        category: Set(new.category),
        price: Set(new.price),
        address: Set(new.address),
        rating: Set(new.rating),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Delete an activity and then its image. Returns the deleted record, or
/// `None` if there was nothing to delete. Image removal never fails the call.
pub async fn delete<C: ConnectionTrait>(
    db: &C,
    media: &dyn MediaStore,
    id: i32,
) -> Result<Option<ActivityRecord>, DbErr> {
    let Some(record) = find_by_id(db, id).await? else {
        return Ok(None);
    };

    record.activity.clone().delete(db).await?;
    info!(id, "Activity deleted");

    if let Some(image) = record.activity.image.as_deref() {
        retire(media, image).await;
    }

    Ok(Some(record))
}
