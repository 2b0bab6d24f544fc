use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "facility_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    Open,
    Closed,
    Maintenance,
}

impl FacilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityStatus::Open => "open",
            FacilityStatus::Closed => "closed",
            FacilityStatus::Maintenance => "maintenance",
        }
    }
}

/// Facility row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub status: FacilityStatus,
    pub open_time: time::Time,
    pub close_time: time::Time,
    pub created_at: OffsetDateTime,
}

/// Facility as clients see it, with rating aggregates computed in SQL.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FacilityView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub status: FacilityStatus,
    #[serde(with = "crate::models::common::hhmm")]
    pub open_time: time::Time,
    #[serde(with = "crate::models::common::hhmm")]
    pub close_time: time::Time,
    /// Mean of rating stars rounded to 2 decimals; null until first rating.
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FacilityRating {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub resident_id: Uuid,
    pub stars: i32,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRatingRequest {
    #[validate(range(min = 1, max = 5, message = "stars must be between 1 and 5"))]
    pub stars: i32,
    #[validate(length(max = 500, message = "comment must be at most 500 characters"))]
    pub comment: Option<String>,
}
