use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Reported,
    InProgress,
    Scheduled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "maintenance_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Critical,
}

/// What to write to `completion_date` for a status change, if anything.
/// `None` leaves the column untouched; `Some(Some(now))` stamps it on entry
/// into completed; `Some(None)` clears it when a report is reopened.
pub fn completion_stamp(
    current: MaintenanceStatus,
    requested: MaintenanceStatus,
    now: OffsetDateTime,
) -> Option<Option<OffsetDateTime>> {
    match (current, requested) {
        (MaintenanceStatus::Completed, MaintenanceStatus::Completed) => None,
        (_, MaintenanceStatus::Completed) => Some(Some(now)),
        (MaintenanceStatus::Completed, _) => Some(None),
        _ => None,
    }
}

/// Report joined with facility, reporter and assignee columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MaintenanceRow {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub facility_name: String,
    pub status: MaintenanceStatus,
    pub priority: MaintenancePriority,
    pub description: String,
    pub reported_by_resident: Option<Uuid>,
    pub reporter_resident_first: Option<String>,
    pub reporter_resident_last: Option<String>,
    pub reporter_unit: Option<String>,
    pub reported_by_staff: Option<Uuid>,
    pub reporter_staff_first: Option<String>,
    pub reporter_staff_last: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assignee_first_name: Option<String>,
    pub assignee_last_name: Option<String>,
    pub scheduled_date: Option<time::Date>,
    pub feedback: Option<String>,
    pub completion_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceView {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub facility_name: String,
    pub status: MaintenanceStatus,
    pub priority: MaintenancePriority,
    pub description: String,
    pub reported_by_resident: Option<Uuid>,
    pub reported_by_staff: Option<Uuid>,
    pub reporter_name: Option<String>,
    pub reporter_unit: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assignee_name: Option<String>,
    pub scheduled_date: Option<time::Date>,
    pub feedback: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completion_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<MaintenanceRow> for MaintenanceView {
    fn from(row: MaintenanceRow) -> Self {
        let reporter_name = match (
            &row.reporter_resident_first,
            &row.reporter_resident_last,
            &row.reporter_staff_first,
            &row.reporter_staff_last,
        ) {
            (Some(first), Some(last), _, _) => Some(format!("{} {}", first, last)),
            (_, _, Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        };
        let assignee_name = match (&row.assignee_first_name, &row.assignee_last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        };

        Self {
            id: row.id,
            facility_id: row.facility_id,
            facility_name: row.facility_name,
            status: row.status,
            priority: row.priority,
            description: row.description,
            reported_by_resident: row.reported_by_resident,
            reported_by_staff: row.reported_by_staff,
            reporter_name,
            reporter_unit: row.reporter_unit,
            assigned_to: row.assigned_to,
            assignee_name,
            scheduled_date: row.scheduled_date,
            feedback: row.feedback,
            completion_date: row.completion_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaintenanceRequest {
    pub facility_id: Uuid,
    #[validate(length(min = 5, max = 500, message = "description must be 5-500 characters"))]
    pub description: String,
    pub priority: Option<MaintenancePriority>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMaintenanceRequest {
    pub status: Option<MaintenanceStatus>,
    pub assigned_to: Option<Uuid>,
    pub scheduled_date: Option<time::Date>,
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceListParams {
    pub status: Option<MaintenanceStatus>,
    pub facility_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MaintenanceListParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
