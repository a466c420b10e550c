//! Role/tenant-scoped visibility decisions.
//!
//! This module is the single source of truth for who may see or mutate a
//! patient-scoped record. It answers the question twice, from the same rule
//! set:
//!
//! - [`check`](VisibilityPolicy::check) decides for one concrete record, used
//!   on the direct mutation paths where a denial must be loud;
//! - [`predicate`](VisibilityPolicy::predicate) produces the equivalent
//!   equality-filter form a store applies to bulk queries, so no row is
//!   fetched that the per-record check would reject.
//!
//! The two must agree: `check(actor, scope)` succeeds exactly when
//! `predicate(actor).matches(scope)` holds. The test suite pins this.
//!
//! Rules, evaluated in order, first match wins:
//! 1. SuperAdmin is denied unconditionally. Platform operators manage
//!    organizations and accounts, never clinical data. This is a dedicated
//!    check, not a fall-through of the role match below.
//! 2. Organization mismatch is denied for every role. Tenant isolation is
//!    absolute.
//! 3. Admin: full access within the own organization.
//! 4. Doctor: only records where the assigned doctor is the actor.
//! 5. Nurse: records of the actor's department. For rows predating the
//!    department migration (no department id), the legacy care-type tag may
//!    grant access instead; the tag never widens access for rows that carry
//!    a department id.
//! 6. Everything else is denied.

use rota_types::{DepartmentId, OrganizationId, Role, UserId};

use crate::error::{ScheduleError, ScheduleResult};

/// The authenticated principal plus its authorisation context.
///
/// Always passed explicitly into engine calls; there is no ambient or
/// thread-local actor state anywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
    /// `None` for SuperAdmin, who belongs to no tenant.
    pub organization: Option<OrganizationId>,
    pub department: Option<DepartmentId>,
    /// Legacy care-type tag assignment, only consulted for pre-migration rows.
    pub care_type: Option<String>,
}

/// The authorisation-relevant fields of a target record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordScope {
    pub organization: OrganizationId,
    pub department: Option<DepartmentId>,
    pub doctor: Option<UserId>,
    pub nurse_owner: Option<UserId>,
    pub care_type: Option<String>,
}

/// The bulk-query form of a visibility decision.
///
/// Every variant is a conjunction of equality/membership filters, so a store
/// can translate it directly into its query language and reject rows early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityPredicate {
    /// No row matches. Produced for SuperAdmin and for actors with no tenant.
    DenyAll,
    /// All rows of one organization (Admin).
    Organization { organization: OrganizationId },
    /// Rows of one organization assigned to one doctor.
    AssignedDoctor {
        organization: OrganizationId,
        doctor: UserId,
    },
    /// Rows of one organization visible to a nurse: the department caseload,
    /// plus legacy rows without a department whose care-type tag matches.
    DepartmentCaseload {
        organization: OrganizationId,
        department: Option<DepartmentId>,
        care_type: Option<String>,
    },
}

impl VisibilityPredicate {
    /// Evaluates the predicate against one record scope.
    ///
    /// This is the reference semantics the store must reproduce; the
    /// in-memory store calls it directly.
    pub fn matches(&self, scope: &RecordScope) -> bool {
        match self {
            VisibilityPredicate::DenyAll => false,
            VisibilityPredicate::Organization { organization } => {
                scope.organization == *organization
            }
            VisibilityPredicate::AssignedDoctor {
                organization,
                doctor,
            } => scope.organization == *organization && scope.doctor == Some(*doctor),
            VisibilityPredicate::DepartmentCaseload {
                organization,
                department,
                care_type,
            } => {
                if scope.organization != *organization {
                    return false;
                }
                match scope.department {
                    Some(dept) => department.is_some_and(|own| own == dept),
                    // Pre-migration row: fall back to the care-type tag.
                    None => {
                        care_type.is_some()
                            && scope.care_type.as_deref() == care_type.as_deref()
                    }
                }
            }
        }
    }

    pub fn is_deny_all(&self) -> bool {
        matches!(self, VisibilityPredicate::DenyAll)
    }
}

/// Centralised visibility rules for patient-scoped records.
pub struct VisibilityPolicy;

impl VisibilityPolicy {
    /// The SuperAdmin lockout, as its own check.
    ///
    /// Hard security invariant: SuperAdmin must never be authorised against
    /// clinical data, even when a constructed record would otherwise satisfy
    /// every later rule.
    pub fn deny_super_admin(actor: &Actor) -> ScheduleResult<()> {
        if actor.role == Role::SuperAdmin {
            tracing::warn!(actor = %actor.id, "super_admin denied access to clinical record");
            return Err(ScheduleError::AccessDenied);
        }
        Ok(())
    }

    /// Decides whether `actor` may see or mutate the record with `scope`.
    pub fn check(actor: &Actor, scope: &RecordScope) -> ScheduleResult<()> {
        Self::deny_super_admin(actor)?;

        // Tenant isolation: absolute, no role overrides it.
        let Some(own_org) = actor.organization else {
            return Err(ScheduleError::AccessDenied);
        };
        if scope.organization != own_org {
            tracing::warn!(
                actor = %actor.id,
                role = %actor.role,
                "cross-tenant access denied"
            );
            return Err(ScheduleError::AccessDenied);
        }

        let allowed = match actor.role {
            // Unreachable after deny_super_admin, kept exhaustive.
            Role::SuperAdmin => false,
            Role::Admin => true,
            Role::Doctor => scope.doctor == Some(actor.id),
            Role::Nurse => match scope.department {
                Some(dept) => actor.department.is_some_and(|own| own == dept),
                None => {
                    actor.care_type.is_some()
                        && scope.care_type.as_deref() == actor.care_type.as_deref()
                }
            },
        };

        if allowed {
            Ok(())
        } else {
            Err(ScheduleError::AccessDenied)
        }
    }

    /// Produces the bulk-query predicate equivalent to [`check`](Self::check).
    pub fn predicate(actor: &Actor) -> VisibilityPredicate {
        if actor.role == Role::SuperAdmin {
            return VisibilityPredicate::DenyAll;
        }
        let Some(organization) = actor.organization else {
            return VisibilityPredicate::DenyAll;
        };
        match actor.role {
            Role::SuperAdmin => VisibilityPredicate::DenyAll,
            Role::Admin => VisibilityPredicate::Organization { organization },
            Role::Doctor => VisibilityPredicate::AssignedDoctor {
                organization,
                doctor: actor.id,
            },
            Role::Nurse => VisibilityPredicate::DepartmentCaseload {
                organization,
                department: actor.department,
                care_type: actor.care_type.clone(),
            },
        }
    }
}
