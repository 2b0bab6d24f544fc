use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::common::ApiResponse,
    models::staff::{
        AssignmentListParams, AssignmentView, CreateAssignmentRequest, StaffFacilityAssignment,
    },
    AppState,
};

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<AssignmentListParams>,
) -> Result<Json<ApiResponse<Vec<AssignmentView>>>> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, AssignmentView>(
        r#"
        SELECT sfa.id, sfa.staff_id,
               s.first_name || ' ' || s.last_name AS staff_name,
               sfa.facility_id, f.name AS facility_name, sfa.is_primary
        FROM staff_facility_assignments sfa
        JOIN staff s ON s.id = sfa.staff_id
        JOIN facilities f ON f.id = sfa.facility_id
        WHERE ($1::uuid IS NULL OR sfa.staff_id = $1)
          AND ($2::uuid IS NULL OR sfa.facility_id = $2)
        ORDER BY s.last_name, f.name
        "#,
    )
    .bind(params.staff_id)
    .bind(params.facility_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::ok("Assignments retrieved", rows)))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<Json<ApiResponse<StaffFacilityAssignment>>> {
    auth.require_admin()?;

    let staff_ok = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM staff WHERE id = $1 AND is_active = true)",
    )
    .bind(req.staff_id)
    .fetch_one(&state.pool)
    .await?;
    if !staff_ok {
        return Err(AppError::NotFound(format!(
            "Staff member {} not found",
            req.staff_id
        )));
    }

    let facility_ok =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM facilities WHERE id = $1)")
            .bind(req.facility_id)
            .fetch_one(&state.pool)
            .await?;
    if !facility_ok {
        return Err(AppError::NotFound(format!(
            "Facility {} not found",
            req.facility_id
        )));
    }

    // The (staff_id, facility_id) unique constraint turns a repeat grant
    // into a "duplicate assignment" rejection.
    let assignment = sqlx::query_as::<_, StaffFacilityAssignment>(
        r#"
        INSERT INTO staff_facility_assignments (id, staff_id, facility_id, is_primary)
        VALUES ($1, $2, $3, $4)
        RETURNING id, staff_id, facility_id, is_primary, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.staff_id)
    .bind(req.facility_id)
    .bind(req.is_primary.unwrap_or(false))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::ok("Assignment created", assignment)))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    auth.require_admin()?;

    let affected = sqlx::query("DELETE FROM staff_facility_assignments WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound(format!("Assignment {} not found", id)));
    }

    Ok(Json(ApiResponse::ok(
        "Assignment removed",
        serde_json::json!({ "deleted": true }),
    )))
}
