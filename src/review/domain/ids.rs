//! Identifier types for the task review domain.
//!
//! Persisted rows use positive 64-bit keys. The wrappers keep task, test
//! detail, investigation, remark, and user keys from being mixed up when
//! they travel through the same plan.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw key.
            #[must_use]
            pub const fn from_raw(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw key.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }

            /// Returns `true` for the zero key, which never names a stored row.
            #[must_use]
            pub const fn is_unset(self) -> bool {
                self.0 == 0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a review task.
    TaskId
);
numeric_id!(
    /// Identifier of a test detail owned by a task.
    TestDetailId
);
numeric_id!(
    /// Identifier of an investigation result owned by a test detail.
    InvestigationId
);
numeric_id!(
    /// Identifier of a remark attached to an investigation.
    RemarkId
);
numeric_id!(
    /// Identifier of an internal user.
    UserId
);
numeric_id!(
    /// Identifier of a processing lab.
    LabId
);

/// Visit number assigned by the LIS to a sample collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitId(String);

impl VisitId {
    /// Creates a visit identifier from its LIS representation.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the visit number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the visit number is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
