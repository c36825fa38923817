//! Identity for entities and "anything that resolves to an id" arguments.

use std::borrow::Cow;
use std::fmt;

/// An entity identified by a server-side id.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Either a bare id or an entity that carries one.
///
/// Every operation that targets a server-side record takes
/// `impl Into<IdRef<'_>>`, so callers can pass `"abc"`, a `String`, or
/// `&image` interchangeably.
#[derive(Clone)]
pub enum IdRef<'a> {
    Raw(Cow<'a, str>),
    Entity(&'a dyn Identifiable),
}

impl IdRef<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            IdRef::Raw(id) => id,
            IdRef::Entity(entity) => entity.id(),
        }
    }
}

impl fmt::Debug for IdRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdRef").field(&self.as_str()).finish()
    }
}

impl fmt::Display for IdRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for IdRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<'a> From<&'a str> for IdRef<'a> {
    fn from(id: &'a str) -> Self {
        IdRef::Raw(Cow::Borrowed(id))
    }
}

impl<'a> From<&'a String> for IdRef<'a> {
    fn from(id: &'a String) -> Self {
        IdRef::Raw(Cow::Borrowed(id))
    }
}

impl From<String> for IdRef<'static> {
    fn from(id: String) -> Self {
        IdRef::Raw(Cow::Owned(id))
    }
}

impl<'a, T: Identifiable> From<&'a T> for IdRef<'a> {
    fn from(entity: &'a T) -> Self {
        IdRef::Entity(entity)
    }
}

/// Implements id-based `PartialEq`, `Eq`, `Hash` and comparison with bare
/// id strings for an `Identifiable` type.
macro_rules! identity_by_id {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::id::Identifiable::id(self) == $crate::id::Identifiable::id(other)
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash($crate::id::Identifiable::id(self), state);
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                $crate::id::Identifiable::id(self) == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                $crate::id::Identifiable::id(self) == *other
            }
        }

        impl PartialEq<String> for $ty {
            fn eq(&self, other: &String) -> bool {
                $crate::id::Identifiable::id(self) == other.as_str()
            }
        }
    };
}

pub(crate) use identity_by_id;
