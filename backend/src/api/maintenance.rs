use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AuthUser, Role},
    error::{AppError, Result},
    models::common::ApiResponse,
    models::maintenance::{
        completion_stamp, CreateMaintenanceRequest, MaintenanceListParams, MaintenancePriority,
        MaintenanceRow, MaintenanceStatus, MaintenanceView, UpdateMaintenanceRequest,
    },
    visibility,
    AppState,
};

const REPORT_SELECT: &str = r#"
SELECT m.id, m.facility_id, f.name AS facility_name,
       m.status, m.priority, m.description,
       m.reported_by_resident,
       rr.first_name AS reporter_resident_first, rr.last_name AS reporter_resident_last,
       rr.unit_number AS reporter_unit,
       m.reported_by_staff,
       rs.first_name AS reporter_staff_first, rs.last_name AS reporter_staff_last,
       m.assigned_to,
       a.first_name AS assignee_first_name, a.last_name AS assignee_last_name,
       m.scheduled_date, m.feedback, m.completion_date, m.created_at, m.updated_at
FROM maintenance_reports m
JOIN facilities f ON f.id = m.facility_id
LEFT JOIN residents rr ON rr.id = m.reported_by_resident
LEFT JOIN staff rs ON rs.id = m.reported_by_staff
LEFT JOIN staff a ON a.id = m.assigned_to
"#;

async fn fetch_row(pool: &PgPool, id: Uuid) -> Result<MaintenanceRow> {
    sqlx::query_as::<_, MaintenanceRow>(&format!("{REPORT_SELECT} WHERE m.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance report {} not found", id)))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceView>>> {
    req.validate()?;

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM facilities WHERE id = $1)")
            .bind(req.facility_id)
            .fetch_one(&state.pool)
            .await?;
    if !exists {
        return Err(AppError::NotFound(format!(
            "Facility {} not found",
            req.facility_id
        )));
    }

    // Exactly one reporter column is set, depending on who filed it.
    let (by_resident, by_staff) = match auth.role {
        Role::Resident => (Some(auth.id), None),
        Role::Staff => (None, Some(auth.id)),
    };

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO maintenance_reports
            (id, facility_id, status, priority, description, reported_by_resident, reported_by_staff)
        VALUES ($1, $2, 'reported', $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(req.facility_id)
    .bind(req.priority.unwrap_or(MaintenancePriority::Medium))
    .bind(&req.description)
    .bind(by_resident)
    .bind(by_staff)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(
        "Maintenance report filed",
        MaintenanceView::from(row),
    )))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<MaintenanceListParams>,
) -> Result<Json<ApiResponse<Vec<MaintenanceView>>>> {
    let rows = match auth.role {
        Role::Resident => {
            sqlx::query_as::<_, MaintenanceRow>(&format!(
                "{REPORT_SELECT}
                 WHERE m.reported_by_resident = $1
                   AND ($2::maintenance_status IS NULL OR m.status = $2)
                   AND ($3::uuid IS NULL OR m.facility_id = $3)
                 ORDER BY m.created_at DESC
                 LIMIT $4 OFFSET $5"
            ))
            .bind(auth.id)
            .bind(params.status)
            .bind(params.facility_id)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&state.pool)
            .await?
        }
        Role::Staff => {
            let scope = visibility::facility_scope(&state.pool, &auth).await?;
            if scope.is_empty() {
                return Ok(Json(ApiResponse::ok("Maintenance reports retrieved", vec![])));
            }

            sqlx::query_as::<_, MaintenanceRow>(&format!(
                "{REPORT_SELECT}
                 WHERE ($1::uuid[] IS NULL OR m.facility_id = ANY($1))
                   AND ($2::maintenance_status IS NULL OR m.status = $2)
                   AND ($3::uuid IS NULL OR m.facility_id = $3)
                 ORDER BY m.priority DESC, m.created_at DESC
                 LIMIT $4 OFFSET $5"
            ))
            .bind(scope.id_vec())
            .bind(params.status)
            .bind(params.facility_id)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&state.pool)
            .await?
        }
    };

    let views = rows.into_iter().map(MaintenanceView::from).collect();
    Ok(Json(ApiResponse::ok("Maintenance reports retrieved", views)))
}

pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceView>>> {
    let row = fetch_row(&state.pool, id).await?;

    match auth.role {
        Role::Resident => {
            if row.reported_by_resident != Some(auth.id) {
                return Err(AppError::Forbidden);
            }
        }
        Role::Staff => {
            let scope = visibility::facility_scope(&state.pool, &auth).await?;
            if !scope.allows(row.facility_id) {
                return Err(AppError::Forbidden);
            }
        }
    }

    Ok(Json(ApiResponse::ok(
        "Maintenance report retrieved",
        MaintenanceView::from(row),
    )))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceView>>> {
    auth.require_staff()?;

    let mut tx = state.pool.begin().await?;

    let (facility_id, current) = sqlx::query_as::<_, (Uuid, MaintenanceStatus)>(
        "SELECT facility_id, status FROM maintenance_reports WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Maintenance report {} not found", id)))?;

    let scope = visibility::facility_scope(&state.pool, &auth).await?;
    if !scope.allows(facility_id) {
        return Err(AppError::Forbidden);
    }

    if let Some(assignee) = req.assigned_to {
        let ok = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM staff WHERE id = $1 AND is_active = true)",
        )
        .bind(assignee)
        .fetch_one(&state.pool)
        .await?;
        if !ok {
            return Err(AppError::NotFound(format!(
                "Staff member {} not found",
                assignee
            )));
        }
    }

    let new_status = req.status.unwrap_or(current);
    let stamp = completion_stamp(current, new_status, time::OffsetDateTime::now_utc());

    sqlx::query(
        r#"
        UPDATE maintenance_reports
        SET status          = $2,
            assigned_to     = COALESCE($3, assigned_to),
            scheduled_date  = COALESCE($4, scheduled_date),
            feedback        = COALESCE($5, feedback),
            completion_date = CASE WHEN $6 THEN $7 ELSE completion_date END,
            updated_at      = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(new_status)
    .bind(req.assigned_to)
    .bind(req.scheduled_date)
    .bind(req.feedback)
    .bind(stamp.is_some())
    .bind(stamp.flatten())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(
        "Maintenance report updated",
        MaintenanceView::from(row),
    )))
}
