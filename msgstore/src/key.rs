//! Canonicalization of arbitrary application keys into storage keys.
//!
//! Every group key and message id is stored as hyphenated UUID text. Values
//! that already are (or parse as) a UUID are kept; everything else is hashed
//! into a name-based (v5) UUID so that equal keys always land on the same
//! rows. Non-string keys are hashed together with a tag for their kind, so
//! `42`, `"42"` and `b"42"` are three different keys. Implement [StoreKey]
//! for a domain key type to decide for yourself which values count as "the
//! same" key.

use std::{rc::Rc, sync::Arc};

use uuid::Uuid;

/// Namespace for name-based keys derived by this crate.
const KEY_NAMESPACE: Uuid = Uuid::from_bytes([
    0x3f, 0x1c, 0x5e, 0x8a, 0x27, 0x64, 0x5b, 0x0d, 0x9e, 0x41, 0xa2, 0x7c, 0x10, 0xd3, 0x6b,
    0x58,
]);

/// Namespace for keys of a tagged kind, kept apart from string keys.
const TAGGED_KEY_NAMESPACE: Uuid = Uuid::from_bytes([
    0x8b, 0x52, 0x0e, 0x4f, 0xc1, 0x9a, 0x5d, 0x37, 0xa6, 0x13, 0x4e, 0xf0, 0x72, 0x2d, 0x95,
    0xc4,
]);

/// A value which can address rows in a message store.
pub trait StoreKey {
    /// Map this key on to a stable UUID. Equal keys must map to equal UUIDs.
    fn to_store_uuid(&self) -> Uuid;
}

/// Derive a name-based UUID for arbitrary key bytes.
pub fn derive_uuid(bytes: &[u8]) -> Uuid {
    Uuid::new_v5(&KEY_NAMESPACE, bytes)
}

/// Derive a name-based UUID for key bytes of a given kind. Keys of
/// different kinds never share a name, provided `tag` has no `:`.
pub fn derive_tagged_uuid(tag: &str, bytes: &[u8]) -> Uuid {
    let mut name = Vec::with_capacity(tag.len() + 1 + bytes.len());
    name.extend_from_slice(tag.as_bytes());
    name.push(b':');
    name.extend_from_slice(bytes);
    Uuid::new_v5(&TAGGED_KEY_NAMESPACE, &name)
}

/// The text form under which a key is stored.
pub fn canonical_key<K: StoreKey + ?Sized>(key: &K) -> String {
    key.to_store_uuid().hyphenated().to_string()
}

/// As [canonical_key], passing an absent key through.
pub fn canonical_key_opt<K: StoreKey>(key: Option<&K>) -> Option<String> {
    key.map(canonical_key::<K>)
}

impl StoreKey for Uuid {
    fn to_store_uuid(&self) -> Uuid {
        *self
    }
}

impl StoreKey for str {
    fn to_store_uuid(&self) -> Uuid {
        Uuid::parse_str(self).unwrap_or_else(|_| derive_uuid(self.as_bytes()))
    }
}

impl StoreKey for String {
    fn to_store_uuid(&self) -> Uuid {
        self.as_str().to_store_uuid()
    }
}

impl StoreKey for [u8] {
    fn to_store_uuid(&self) -> Uuid {
        derive_tagged_uuid("bytes", self)
    }
}

impl StoreKey for Vec<u8> {
    fn to_store_uuid(&self) -> Uuid {
        self.as_slice().to_store_uuid()
    }
}

// integers share a tag so that equal values of different widths match
macro_rules! display_key {
    ($tag:literal: $($t:ty),*) => {
        $(
            impl StoreKey for $t {
                fn to_store_uuid(&self) -> Uuid {
                    derive_tagged_uuid($tag, self.to_string().as_bytes())
                }
            }
        )*
    };
}

display_key!("int": i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
display_key!("char": char);
display_key!("bool": bool);

impl<T: StoreKey + ?Sized> StoreKey for &T {
    fn to_store_uuid(&self) -> Uuid {
        (**self).to_store_uuid()
    }
}

impl<T: StoreKey + ?Sized> StoreKey for Box<T> {
    fn to_store_uuid(&self) -> Uuid {
        (**self).to_store_uuid()
    }
}

impl<T: StoreKey + ?Sized> StoreKey for Arc<T> {
    fn to_store_uuid(&self) -> Uuid {
        (**self).to_store_uuid()
    }
}

impl<T: StoreKey + ?Sized> StoreKey for Rc<T> {
    fn to_store_uuid(&self) -> Uuid {
        (**self).to_store_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_is_identity() {
        let id = Uuid::new_v4();
        assert_eq!(id.to_store_uuid(), id);
        assert_eq!(canonical_key(&id), id.to_string());
    }

    #[test]
    fn test_uuid_text_is_parsed() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(canonical_key(uuid_str), uuid_str);
        // different representations of the same uuid collapse
        assert_eq!(
            canonical_key("550E8400E29B41D4A716446655440000"),
            uuid_str
        );
    }

    #[test]
    fn test_derived_keys_are_stable() {
        assert_eq!(canonical_key("orders"), canonical_key(&"orders".to_string()));
        assert_eq!(canonical_key("orders"), canonical_key(&Arc::<str>::from("orders")));
        assert_ne!(canonical_key("orders"), canonical_key("trades"));
        assert_eq!(
            "orders".to_store_uuid().get_version(),
            Some(uuid::Version::Sha1)
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(canonical_key(&42_i64), canonical_key(&42_u8));
        assert_eq!(canonical_key(&-1_i8), canonical_key(&-1_i128));
        assert_ne!(canonical_key(&42_i64), canonical_key(&43_i64));
    }

    #[test]
    fn test_kinds_do_not_collide() {
        assert_ne!(canonical_key(&42_i64), canonical_key("42"));
        assert_ne!(canonical_key(&true), canonical_key("true"));
        assert_ne!(canonical_key(&'a'), canonical_key("a"));
        assert_ne!(canonical_key(b"abc".as_slice()), canonical_key("abc"));
        assert_ne!(canonical_key(&'1'), canonical_key(&1_u8));
        // a string spelling out another kind's tagged name stays a string
        assert_ne!(canonical_key("int:42"), canonical_key(&42_i64));
        assert_eq!(
            canonical_key(b"abc".as_slice()),
            canonical_key(&b"abc".to_vec())
        );
    }

    #[test]
    fn test_absent_key() {
        assert_eq!(canonical_key_opt::<String>(None), None);
        assert_eq!(
            canonical_key_opt(Some(&"a".to_string())),
            Some(canonical_key("a"))
        );
    }

    #[test]
    fn test_custom_key() {
        /// Case-insensitive key.
        struct Symbol(&'static str);

        impl StoreKey for Symbol {
            fn to_store_uuid(&self) -> Uuid {
                derive_uuid(self.0.to_ascii_uppercase().as_bytes())
            }
        }

        assert_eq!(canonical_key(&Symbol("aapl")), canonical_key(&Symbol("AAPL")));
    }
}
