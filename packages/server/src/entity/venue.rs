use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "venue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub city: String,
    pub capacity: i32,

    /// Root-relative media reference, e.g. `/uploads/stades/<uuid>.jpg`.
    pub image: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub year_built: Option<i32>,

    #[sea_orm(has_many)]
    pub activities: HasMany<super::activity::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
