use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Staff↔facility grant. A staff member may only see and act on bookings
/// and reports for facilities they hold an assignment to (admins excepted).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StaffFacilityAssignment {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub facility_id: Uuid,
    pub is_primary: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Assignment joined with names for the admin listing.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AssignmentView {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub staff_name: String,
    pub facility_id: Uuid,
    pub facility_name: String,
    pub is_primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub staff_id: Uuid,
    pub facility_id: Uuid,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    pub staff_id: Option<Uuid>,
    pub facility_id: Option<Uuid>,
}
