use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::common::ApiResponse,
    models::facility::{CreateRatingRequest, FacilityRating, FacilityView},
    visibility::{self, FacilityScope},
    AppState,
};

/// Facility columns plus rating aggregates. The optional uuid[] parameter
/// narrows to a staff member's assigned facilities; NULL means unscoped.
const FACILITY_VIEW_SQL: &str = r#"
SELECT f.id, f.name, f.description, f.capacity, f.status,
       f.open_time, f.close_time,
       ROUND(AVG(fr.stars)::numeric, 2)::float8 AS average_rating,
       COUNT(fr.id)::bigint AS rating_count
FROM facilities f
LEFT JOIN facility_ratings fr ON fr.facility_id = f.id
"#;

async fn scope_for(state: &AppState, auth: &AuthUser) -> Result<FacilityScope> {
    if auth.is_staff() {
        visibility::facility_scope(&state.pool, auth).await
    } else {
        Ok(FacilityScope::All)
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FacilityView>>>> {
    let scope = scope_for(&state, &auth).await?;
    if scope.is_empty() {
        return Ok(Json(ApiResponse::ok("Facilities retrieved", vec![])));
    }

    let rows = sqlx::query_as::<_, FacilityView>(&format!(
        "{FACILITY_VIEW_SQL}
         WHERE $1::uuid[] IS NULL OR f.id = ANY($1)
         GROUP BY f.id
         ORDER BY f.name"
    ))
    .bind(scope.id_vec())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::ok("Facilities retrieved", rows)))
}

pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FacilityView>>> {
    let facility = sqlx::query_as::<_, FacilityView>(&format!(
        "{FACILITY_VIEW_SQL}
         WHERE f.id = $1
         GROUP BY f.id"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", id)))?;

    let scope = scope_for(&state, &auth).await?;
    if !scope.allows(id) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(ApiResponse::ok("Facility retrieved", facility)))
}

pub async fn create_rating(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateRatingRequest>,
) -> Result<Json<ApiResponse<FacilityRating>>> {
    auth.require_resident()?;
    req.validate()?;

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM facilities WHERE id = $1)")
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
    if !exists {
        return Err(AppError::NotFound(format!("Facility {} not found", id)));
    }

    // One rating per resident per facility; the unique constraint turns a
    // second submission into a "duplicate rating" rejection.
    let rating = sqlx::query_as::<_, FacilityRating>(
        r#"
        INSERT INTO facility_ratings (id, facility_id, resident_id, stars, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, facility_id, resident_id, stars, comment, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(auth.id)
    .bind(req.stars)
    .bind(req.comment)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::ok("Rating submitted", rating)))
}
