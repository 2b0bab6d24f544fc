use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::AuthUser, crypto::FieldCipher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    /// Active bookings are the ones that occupy their time slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }
}

/// Booking joined with facility, resident and approver columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub facility_name: String,
    pub resident_id: Uuid,
    pub resident_first_name: String,
    pub resident_last_name: String,
    pub resident_unit: String,
    pub resident_email_enc: String,
    pub resident_phone_enc: Option<String>,
    pub date: time::Date,
    pub start_time: time::Time,
    pub end_time: time::Time,
    pub status: BookingStatus,
    pub attendees: i32,
    pub purpose: String,
    pub approved_by: Option<Uuid>,
    pub approver_first_name: Option<String>,
    pub approver_last_name: Option<String>,
    pub approval_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Flat client-facing payload. Contact fields are decrypted for staff
/// viewers and omitted for residents; ciphertext never leaves the server.
#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub facility_name: String,
    pub resident_id: Uuid,
    pub resident_name: String,
    pub resident_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resident_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resident_phone: Option<String>,
    pub date: time::Date,
    #[serde(with = "crate::models::common::hhmm")]
    pub start_time: time::Time,
    #[serde(with = "crate::models::common::hhmm")]
    pub end_time: time::Time,
    pub status: BookingStatus,
    pub attendees: i32,
    pub purpose: String,
    pub approved_by: Option<Uuid>,
    pub approver_name: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approval_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BookingView {
    pub fn assemble(row: BookingRow, cipher: &FieldCipher, viewer: &AuthUser) -> Self {
        let (resident_email, resident_phone) = if viewer.is_staff() {
            (
                cipher.decrypt_opt(&row.resident_email_enc, "resident.email"),
                row.resident_phone_enc
                    .as_deref()
                    .and_then(|t| cipher.decrypt_opt(t, "resident.phone")),
            )
        } else {
            (None, None)
        };

        let approver_name = match (&row.approver_first_name, &row.approver_last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        };

        Self {
            id: row.id,
            facility_id: row.facility_id,
            facility_name: row.facility_name,
            resident_id: row.resident_id,
            resident_name: format!("{} {}", row.resident_first_name, row.resident_last_name),
            resident_unit: row.resident_unit,
            resident_email,
            resident_phone,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            attendees: row.attendees,
            purpose: row.purpose,
            approved_by: row.approved_by,
            approver_name,
            approval_date: row.approval_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub facility_id: Uuid,
    pub date: time::Date,
    #[serde(with = "crate::models::common::hhmm")]
    pub start_time: time::Time,
    #[serde(with = "crate::models::common::hhmm")]
    pub end_time: time::Time,
    #[validate(range(min = 1, message = "attendees must be at least 1"))]
    pub attendees: i32,
    #[validate(length(min = 5, max = 200, message = "purpose must be 5-200 characters"))]
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Query params for booking listings. `limit` defaults to 100, capped at
/// 500; `offset` defaults to 0.
#[derive(Debug, Deserialize)]
pub struct BookingListParams {
    pub facility_id: Option<Uuid>,
    pub start_date: Option<time::Date>,
    pub end_date: Option<time::Date>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl BookingListParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
