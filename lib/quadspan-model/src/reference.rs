use crate::hash::ContentHash;
use std::fmt;
use std::hash::Hash;

/// An opaque token identifying a term or a quad inside a particular
/// backend.
///
/// The engine never constructs a [`Ref`] itself except through
/// [`Ref::Hash`], the universal content-hash fallback used when no backend
/// token is available (e.g. a value built purely in memory by the query
/// layer, such as a `Fixed` set literal). Backends hand out
/// [`Ref::Native`] tokens from [`crate::ContentHash`]-independent storage
/// such as a row id or an offset, and guarantee `Key` (this type's
/// `Eq`/`Hash` impl) is unique per receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ref<B> {
    Native(B),
    Hash(ContentHash),
}

impl<B> Ref<B> {
    #[must_use]
    pub fn native(token: B) -> Self {
        Ref::Native(token)
    }

    #[must_use]
    pub fn from_wire_form(wire_form: &str) -> Self {
        Ref::Hash(ContentHash::of_wire_form(wire_form))
    }

    #[must_use]
    pub fn as_native(&self) -> Option<&B> {
        match self {
            Ref::Native(token) => Some(token),
            Ref::Hash(_) => None,
        }
    }
}

impl<B: fmt::Display> fmt::Display for Ref<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Native(token) => write!(f, "{token}"),
            Ref::Hash(hash) => write!(f, "#{hash}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_and_hash_refs_are_distinguishable() {
        let native: Ref<u64> = Ref::native(7);
        let hashed: Ref<u64> = Ref::from_wire_form("<http://example.com>");
        assert_ne!(native, hashed);
        assert_eq!(native, Ref::native(7));
    }
}
