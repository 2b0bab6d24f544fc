//! Admission and status-transition rules for bookings.
//!
//! These are pure functions over already-loaded rows; the handlers in
//! `api::bookings` run them inside a transaction that holds the facility
//! row lock, so two concurrent requests for the same facility serialize.

use time::Time;

use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::models::facility::{Facility, FacilityStatus};

/// The fields of a proposed booking that admission looks at.
#[derive(Debug, Clone, Copy)]
pub struct BookingCandidate {
    pub start_time: Time,
    pub end_time: Time,
    pub attendees: i32,
}

/// An occupied [start, end) slot from an existing active booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct TimeSlot {
    pub start_time: Time,
    pub end_time: Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRejection {
    FacilityNotOpen(FacilityStatus),
    OutsideOperatingHours,
    CapacityExceeded(i32),
    TimeConflict,
    InvalidTimeRange,
    AlreadyCancelled,
}

impl BookingRejection {
    /// Stable cause string clients and tests assert on.
    pub fn reason(&self) -> &'static str {
        match self {
            BookingRejection::FacilityNotOpen(_) => "facility not open",
            BookingRejection::OutsideOperatingHours => "outside operating hours",
            BookingRejection::CapacityExceeded(_) => "capacity exceeded",
            BookingRejection::TimeConflict => "time conflict",
            BookingRejection::InvalidTimeRange => "invalid time range",
            BookingRejection::AlreadyCancelled => "already cancelled",
        }
    }

    pub fn message(&self) -> String {
        match self {
            BookingRejection::FacilityNotOpen(status) => format!(
                "Facility is not open for bookings (current status: {})",
                status.as_str()
            ),
            BookingRejection::OutsideOperatingHours => {
                "Requested time range is outside the facility's operating hours".into()
            }
            BookingRejection::CapacityExceeded(capacity) => {
                format!("Attendee count exceeds facility capacity of {}", capacity)
            }
            BookingRejection::TimeConflict => {
                "Requested time range conflicts with an existing booking".into()
            }
            BookingRejection::InvalidTimeRange => "start_time must be before end_time".into(),
            BookingRejection::AlreadyCancelled => "Booking is already cancelled".into(),
        }
    }
}

impl From<BookingRejection> for AppError {
    fn from(rejection: BookingRejection) -> Self {
        AppError::rejected(rejection.reason(), rejection.message())
    }
}

/// Half-open overlap test: [a, b) and [c, d) collide iff a < d && c < b.
/// Abutting slots (b == c) do not collide.
pub fn overlaps(slot: &TimeSlot, start: Time, end: Time) -> bool {
    slot.start_time < end && slot.end_time > start
}

/// Admission check for a proposed booking, each step short-circuiting:
/// facility open, inside operating hours, within capacity, no overlap with
/// an active slot. Callers pass only pending/approved slots in `existing`.
pub fn admit(
    facility: &Facility,
    existing: &[TimeSlot],
    candidate: &BookingCandidate,
) -> Result<(), BookingRejection> {
    if facility.status != FacilityStatus::Open {
        return Err(BookingRejection::FacilityNotOpen(facility.status));
    }

    if candidate.start_time < facility.open_time || candidate.end_time > facility.close_time {
        return Err(BookingRejection::OutsideOperatingHours);
    }

    if candidate.attendees > facility.capacity {
        return Err(BookingRejection::CapacityExceeded(facility.capacity));
    }

    if existing
        .iter()
        .any(|slot| overlaps(slot, candidate.start_time, candidate.end_time))
    {
        return Err(BookingRejection::TimeConflict);
    }

    Ok(())
}

/// Effect of a staff status change on the approval columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalEffect {
    /// Write actor + now into approved_by / approval_date.
    Stamp,
    /// Null both columns (booking went back to pending).
    Clear,
    /// Leave both columns as they are.
    Keep,
}

/// Staff may move a booking between any statuses except out of cancelled,
/// which is terminal. Approve/reject stamp the approval columns; a return
/// to pending clears them.
pub fn staff_transition(
    current: BookingStatus,
    requested: BookingStatus,
) -> Result<ApprovalEffect, BookingRejection> {
    if current == BookingStatus::Cancelled {
        return Err(BookingRejection::AlreadyCancelled);
    }

    Ok(match requested {
        BookingStatus::Approved | BookingStatus::Rejected => ApprovalEffect::Stamp,
        BookingStatus::Pending => ApprovalEffect::Clear,
        BookingStatus::Cancelled => ApprovalEffect::Keep,
    })
}

/// Resident-initiated cancellation is one-way; a second cancel is rejected,
/// never a silent success. Ownership is checked by the caller.
pub fn resident_cancel(current: BookingStatus) -> Result<(), BookingRejection> {
    if current == BookingStatus::Cancelled {
        return Err(BookingRejection::AlreadyCancelled);
    }
    Ok(())
}
