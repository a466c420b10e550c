//! UUID-backed identifier newtypes.
//!
//! Every domain entity gets its own identifier type so that a schedule id can
//! never be passed where a patient id is expected. Identifiers serialise as
//! plain hyphenated UUID strings.

use uuid::Uuid;

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was not a valid UUID
    #[error("invalid identifier: {0}")]
    Invalid(String),
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses an identifier from its string form.
            pub fn parse(input: &str) -> Result<Self, IdError> {
                Uuid::parse_str(input)
                    .map(Self)
                    .map_err(|_| IdError::Invalid(input.to_owned()))
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a tenant organization.
    OrganizationId
);
id_newtype!(
    /// Identifier of a department within an organization.
    DepartmentId
);
id_newtype!(
    /// Identifier of a patient.
    PatientId
);
id_newtype!(
    /// Identifier of a recurring schedule definition.
    ScheduleId
);
id_newtype!(
    /// Identifier of an execution record.
    ExecutionId
);
id_newtype!(
    /// Identifier of a user account (doctor, nurse, admin).
    UserId
);
id_newtype!(
    /// Identifier of a schedulable procedure item.
    ItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips() {
        let id = ScheduleId::generate();
        let parsed = ScheduleId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            PatientId::parse("not-a-uuid"),
            Err(IdError::Invalid(_))
        ));
    }
}
