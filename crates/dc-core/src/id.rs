use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by every id type.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind generated ids. Shared so ids never collide across types.
static COUNTER: AtomicU64 = AtomicU64::new(0);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $sigil:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a unique id with a prefix (e.g. `territory_3`, `rel_7`).
            pub fn with_prefix(prefix: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{prefix}_{n}"))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($sigil, "{}"), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a placed territory (shape or table).
    /// Internally a 4-byte `Spur` index with O(1) `Eq` and `Hash`.
    TerritoryId,
    "#"
);

interned_id!(
    /// Identifier of a table-to-table relationship.
    RelationshipId,
    "~"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = TerritoryId::intern("north");
        let b = TerritoryId::intern("north");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "north");
        assert_eq!(format!("{a:?}"), "#north");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = TerritoryId::with_prefix("territory");
        let b = TerritoryId::with_prefix("territory");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("territory_"));
    }

    #[test]
    fn relationship_ids_serialize_as_strings() {
        let id = RelationshipId::intern("rel_users_orders");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rel_users_orders\"");
        let back: RelationshipId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
