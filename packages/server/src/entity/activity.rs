use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,
    /// Root-relative media reference, e.g. `/uploads/activities/<uuid>.png`.
    pub image: Option<String>,

    pub venue_id: i32,
    #[sea_orm(belongs_to, from = "venue_id", to = "id")]
    pub venue: HasOne<super::venue::Entity>,

    pub category: String,
    pub price: f64,
    pub address: String,
    pub rating: Option<f64>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
