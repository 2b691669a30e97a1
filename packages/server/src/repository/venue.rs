use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::entity::venue;

/// Column values for a new venue, already validated.
#[derive(Debug, Clone)]
pub struct NewVenue {
    pub name: String,
    pub city: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub year_built: Option<i32>,
    pub image: Option<String>,
}

pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<venue::Model>, sea_orm::DbErr> {
    venue::Entity::find()
        .order_by_asc(venue::Column::Name)
        .all(db)
        .await
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<venue::Model>, sea_orm::DbErr> {
    venue::Entity::find_by_id(id).one(db).await
}

/// Whether another venue already uses `name`. `exclude` skips the venue
/// being updated.
pub async fn name_taken<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude: Option<i32>,
) -> Result<bool, sea_orm::DbErr> {
    let mut query = venue::Entity::find().filter(venue::Column::Name.eq(name));
    if let Some(id) = exclude {
        query = query.filter(venue::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, sea_orm::DbErr> {
    let count = venue::Entity::find()
        .filter(venue::Column::Id.eq(id))
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    new: NewVenue,
) -> Result<venue::Model, sea_orm::DbErr> {
    let now = Utc::now();
    venue::ActiveModel {
        name: Set(new.name),
        city: Set(new.city),
        capacity: Set(new.capacity),
        image: Set(new.image),
        description: Set(new.description),
        latitude: Set(new.latitude),
        longitude: Set(new.longitude),
        year_built: Set(new.year_built),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}
