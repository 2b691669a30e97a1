use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::activity;
use crate::repository::activity::ActivityRecord;

/// An activity with its venue's name and city.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ActivityResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Stadium tour")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "/uploads/activities/5c1d2f0e-3b7a-4d8e-9a61-2f4b8c7d9e10.png")]
    pub image: Option<String>,
    #[schema(example = 5)]
    pub venue_id: i32,
    #[schema(example = "tour")]
    pub category: String,
    #[schema(example = 50.0)]
    pub price: f64,
    #[schema(example = "Bd Ghandi, Casablanca")]
    pub address: String,
    #[schema(example = 4.5)]
    pub rating: Option<f64>,
    /// `null` when the venue row is missing.
    #[schema(example = "Stade Mohammed V")]
    pub venue_name: Option<String>,
    #[schema(example = "Casablanca")]
    pub venue_city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ActivityRecord> for ActivityResponse {
    fn from(record: ActivityRecord) -> Self {
        let (venue_name, venue_city) = match record.venue {
            Some(v) => (Some(v.name), Some(v.city)),
            None => (None, None),
        };
        let a: activity::Model = record.activity;
        Self {
            id: a.id,
            name: a.name,
            description: a.description,
            image: a.image,
            venue_id: a.venue_id,
            category: a.category,
            price: a.price,
            address: a.address,
            rating: a.rating,
            venue_name,
            venue_city,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Fields accepted by activity create and update. Numbers may be sent as
/// strings. `venueId` and `stade_id` are accepted for `venue_id`.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct ActivityForm {
    #[schema(example = "Stadium tour")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(example = 5)]
    pub venue_id: Option<i32>,
    #[schema(example = "tour")]
    pub category: Option<String>,
    #[schema(example = 50.0)]
    pub price: Option<f64>,
    pub address: Option<String>,
    pub rating: Option<f64>,
    #[schema(format = Binary)]
    pub image: Option<String>,
    pub remove_image: Option<bool>,
}
