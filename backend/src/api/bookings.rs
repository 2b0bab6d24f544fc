use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AuthUser, Role},
    booking_rules::{self, ApprovalEffect, BookingCandidate, BookingRejection, TimeSlot},
    error::{AppError, Result},
    models::booking::{
        BookingListParams, BookingRow, BookingStatus, BookingView, CreateBookingRequest,
        UpdateBookingStatusRequest,
    },
    models::common::ApiResponse,
    models::facility::Facility,
    visibility,
    AppState,
};

const BOOKING_SELECT: &str = r#"
SELECT b.id, b.facility_id, f.name AS facility_name,
       b.resident_id,
       r.first_name AS resident_first_name, r.last_name AS resident_last_name,
       r.unit_number AS resident_unit,
       r.email_enc AS resident_email_enc, r.phone_enc AS resident_phone_enc,
       b.date, b.start_time, b.end_time, b.status, b.attendees, b.purpose,
       b.approved_by,
       s.first_name AS approver_first_name, s.last_name AS approver_last_name,
       b.approval_date, b.created_at, b.updated_at
FROM bookings b
JOIN facilities f ON f.id = b.facility_id
JOIN residents r ON r.id = b.resident_id
LEFT JOIN staff s ON s.id = b.approved_by
"#;

async fn fetch_row(pool: &PgPool, id: Uuid) -> Result<BookingRow> {
    sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_SELECT} WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
}

fn today_utc() -> time::Date {
    time::OffsetDateTime::now_utc().date()
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingView>>> {
    auth.require_resident()?;
    req.validate()?;

    if req.start_time >= req.end_time {
        return Err(BookingRejection::InvalidTimeRange.into());
    }

    let mut tx = state.pool.begin().await?;

    // Lock the facility row so concurrent creates for the same facility
    // serialize; the admission check below sees every committed booking.
    let facility = sqlx::query_as::<_, Facility>(
        r#"
        SELECT id, name, description, capacity, status, open_time, close_time, created_at
        FROM facilities WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(req.facility_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", req.facility_id)))?;

    let occupied = sqlx::query_as::<_, TimeSlot>(
        r#"
        SELECT start_time, end_time FROM bookings
        WHERE facility_id = $1 AND date = $2 AND status IN ('pending', 'approved')
        "#,
    )
    .bind(req.facility_id)
    .bind(req.date)
    .fetch_all(&mut *tx)
    .await?;

    let candidate = BookingCandidate {
        start_time: req.start_time,
        end_time: req.end_time,
        attendees: req.attendees,
    };
    booking_rules::admit(&facility, &occupied, &candidate)?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO bookings
            (id, facility_id, resident_id, date, start_time, end_time, status, attendees, purpose)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)
        "#,
    )
    .bind(id)
    .bind(req.facility_id)
    .bind(auth.id)
    .bind(req.date)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(req.attendees)
    .bind(&req.purpose)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(
        "Booking created",
        BookingView::assemble(row, &state.cipher, &auth),
    )))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<BookingListParams>,
) -> Result<Json<ApiResponse<Vec<BookingView>>>> {
    let rows = match auth.role {
        Role::Resident => {
            sqlx::query_as::<_, BookingRow>(&format!(
                "{BOOKING_SELECT}
                 WHERE b.resident_id = $1
                   AND ($2::uuid IS NULL OR b.facility_id = $2)
                   AND ($3::date IS NULL OR b.date >= $3)
                   AND ($4::date IS NULL OR b.date <= $4)
                 ORDER BY b.date DESC, b.start_time DESC
                 LIMIT $5 OFFSET $6"
            ))
            .bind(auth.id)
            .bind(params.facility_id)
            .bind(params.start_date)
            .bind(params.end_date)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&state.pool)
            .await?
        }
        Role::Staff => {
            let scope = visibility::facility_scope(&state.pool, &auth).await?;
            if scope.is_empty() {
                return Ok(Json(ApiResponse::ok("Bookings retrieved", vec![])));
            }

            // Staff listings default to today onward.
            let from = params.start_date.unwrap_or_else(today_utc);
            sqlx::query_as::<_, BookingRow>(&format!(
                "{BOOKING_SELECT}
                 WHERE ($1::uuid[] IS NULL OR b.facility_id = ANY($1))
                   AND ($2::uuid IS NULL OR b.facility_id = $2)
                   AND b.date >= $3
                   AND ($4::date IS NULL OR b.date <= $4)
                 ORDER BY b.date, b.start_time
                 LIMIT $5 OFFSET $6"
            ))
            .bind(scope.id_vec())
            .bind(params.facility_id)
            .bind(from)
            .bind(params.end_date)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&state.pool)
            .await?
        }
    };

    let views = rows
        .into_iter()
        .map(|r| BookingView::assemble(r, &state.cipher, &auth))
        .collect();

    Ok(Json(ApiResponse::ok("Bookings retrieved", views)))
}

pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingView>>> {
    let row = fetch_row(&state.pool, id).await?;

    match auth.role {
        Role::Resident => {
            if row.resident_id != auth.id {
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
        "Booking retrieved",
        BookingView::assemble(row, &state.cipher, &auth),
    )))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookingStatusRequest>,
) -> Result<Json<ApiResponse<BookingView>>> {
    auth.require_staff()?;

    let mut tx = state.pool.begin().await?;

    let (facility_id, current) = sqlx::query_as::<_, (Uuid, BookingStatus)>(
        "SELECT facility_id, status FROM bookings WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;

    let scope = visibility::facility_scope(&state.pool, &auth).await?;
    if !scope.allows(facility_id) {
        return Err(AppError::Forbidden);
    }

    // Reactivating a rejected booking can re-occupy its slot; the overlap
    // constraint rejects the update if the slot has been taken since.
    match booking_rules::staff_transition(current, req.status)? {
        ApprovalEffect::Stamp => {
            sqlx::query(
                r#"
                UPDATE bookings
                SET status = $2, approved_by = $3, approval_date = NOW(), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(req.status)
            .bind(auth.id)
            .execute(&mut *tx)
            .await?
        }
        ApprovalEffect::Clear => {
            sqlx::query(
                r#"
                UPDATE bookings
                SET status = $2, approved_by = NULL, approval_date = NULL, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(req.status)
            .execute(&mut *tx)
            .await?
        }
        ApprovalEffect::Keep => {
            sqlx::query("UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(req.status)
                .execute(&mut *tx)
                .await?
        }
    };

    tx.commit().await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(
        "Booking status updated",
        BookingView::assemble(row, &state.cipher, &auth),
    )))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingView>>> {
    auth.require_resident()?;

    let mut tx = state.pool.begin().await?;

    let (resident_id, current) = sqlx::query_as::<_, (Uuid, BookingStatus)>(
        "SELECT resident_id, status FROM bookings WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;

    if resident_id != auth.id {
        return Err(AppError::Forbidden);
    }

    booking_rules::resident_cancel(current)?;

    sqlx::query("UPDATE bookings SET status = 'cancelled', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(
        "Booking cancelled",
        BookingView::assemble(row, &state.cipher, &auth),
    )))
}
