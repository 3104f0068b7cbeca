//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Commands carry a strongly-typed ID so that completion values produced
//! long after dispatch (deferred step sequences, late sink deliveries) can
//! be correlated with the command that caused them. IDs use UUID v7
//! (time-ordered) so sorted logs read in submission order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an inbound command.
    CommandId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_nonzero_and_distinct() {
        let a = CommandId::new();
        let b = CommandId::new();
        assert_ne!(a.into_inner(), Uuid::nil());
        assert_ne!(a, b);
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = CommandId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<CommandId, _> = serde_json::from_str(
            json.as_deref().unwrap_or(""),
        );
        assert!(restored.is_ok());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = CommandId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
