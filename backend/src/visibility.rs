//! Facility visibility scoping for staff actors.
//!
//! Non-admin staff only see facilities they hold an assignment to. An empty
//! assignment set is a valid state: listings return an empty collection with
//! a success envelope, not an error. The set is re-read on every request so
//! assignment changes take effect immediately; a lookup failure propagates
//! rather than silently widening the scope.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{auth::AuthUser, error::Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityScope {
    /// Admin: no filtering applied upstream.
    All,
    Ids(HashSet<Uuid>),
}

impl FacilityScope {
    pub fn allows(&self, facility_id: Uuid) -> bool {
        match self {
            FacilityScope::All => true,
            FacilityScope::Ids(ids) => ids.contains(&facility_id),
        }
    }

    /// True when the scope cannot match anything; callers short-circuit to
    /// an empty result set without touching the database.
    pub fn is_empty(&self) -> bool {
        match self {
            FacilityScope::All => false,
            FacilityScope::Ids(ids) => ids.is_empty(),
        }
    }

    /// Bind value for `facility_id = ANY($n)` filters; `None` when unscoped.
    pub fn id_vec(&self) -> Option<Vec<Uuid>> {
        match self {
            FacilityScope::All => None,
            FacilityScope::Ids(ids) => Some(ids.iter().copied().collect()),
        }
    }
}

pub async fn facility_scope(pool: &PgPool, staff: &AuthUser) -> Result<FacilityScope> {
    if staff.is_admin {
        return Ok(FacilityScope::All);
    }

    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT DISTINCT facility_id FROM staff_facility_assignments WHERE staff_id = $1",
    )
    .bind(staff.id)
    .fetch_all(pool)
    .await?;

    Ok(FacilityScope::Ids(ids.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_allows_everything_and_is_never_empty() {
        let scope = FacilityScope::All;
        assert!(scope.allows(Uuid::new_v4()));
        assert!(!scope.is_empty());
        assert!(scope.id_vec().is_none());
    }

    #[test]
    fn ids_scope_allows_only_members() {
        let inside = Uuid::new_v4();
        let scope = FacilityScope::Ids([inside].into_iter().collect());
        assert!(scope.allows(inside));
        assert!(!scope.allows(Uuid::new_v4()));
        assert!(!scope.is_empty());
        assert_eq!(scope.id_vec().unwrap(), vec![inside]);
    }

    #[test]
    fn empty_assignment_set_is_empty_not_an_error() {
        let scope = FacilityScope::Ids(HashSet::new());
        assert!(scope.is_empty());
        assert!(!scope.allows(Uuid::new_v4()));
    }
}
