//! Index-based identifiers.
//!
//! Objects are created once from input data and addressed by their position.
//! Identifiers display with a one-letter prefix (`o3`, `r0`, `p12`).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! index_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Position of the object in its problem.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_id!(
    /// Operator identifier (shared by both models).
    OperatorId,
    "o"
);
index_id!(
    /// Role identifier.
    RoleId,
    "r"
);
index_id!(
    /// Patient identifier.
    PatientId,
    "p"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        assert_eq!(OperatorId(3).to_string(), "o3");
        assert_eq!(RoleId(0).to_string(), "r0");
        assert_eq!(PatientId(12).to_string(), "p12");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&RoleId(4)).unwrap();
        assert_eq!(json, "4");
        let id: PatientId = serde_json::from_str("7").unwrap();
        assert_eq!(id, PatientId(7));
    }
}
