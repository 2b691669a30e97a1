use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::venue;

/// A venue as returned by the API.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VenueResponse {
    #[schema(example = 5)]
    pub id: i32,
    #[schema(example = "Stade Mohammed V")]
    pub name: String,
    #[schema(example = "Casablanca")]
    pub city: String,
    #[schema(example = 45000)]
    pub capacity: i32,
    /// Media reference, served below `/public`.
    #[schema(example = "/uploads/stades/0b4f9a52-7c1e-4c59-a0a4-5b7f4a8e2d11.jpg")]
    pub image: Option<String>,
    pub description: Option<String>,
    #[schema(example = 33.5822)]
    pub latitude: Option<f64>,
    #[schema(example = json!(-7.6469))]
    pub longitude: Option<f64>,
    #[schema(example = 1955)]
    pub year_built: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<venue::Model> for VenueResponse {
    fn from(v: venue::Model) -> Self {
        Self {
            id: v.id,
            name: v.name,
            city: v.city,
            capacity: v.capacity,
            image: v.image,
            description: v.description,
            latitude: v.latitude,
            longitude: v.longitude,
            year_built: v.year_built,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Fields accepted by venue create and update, as JSON, urlencoded or
/// multipart. Numbers may be sent as strings. Aliases: `nom`, `ville`,
/// `capacite`, `yearBuilt`/`annee_construction`.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct VenueForm {
    #[schema(example = "Stade Mohammed V")]
    pub name: Option<String>,
    #[schema(example = "Casablanca")]
    pub city: Option<String>,
    #[schema(example = 45000)]
    pub capacity: Option<i32>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub year_built: Option<i32>,
    /// Image file (multipart only). Send `null` or `""` to remove the image.
    #[schema(format = Binary)]
    pub image: Option<String>,
    /// `true` to remove the current image.
    pub remove_image: Option<bool>,
}
