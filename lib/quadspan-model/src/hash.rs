use sha2::{Digest, Sha256};
use std::fmt;

/// A fixed-width, content-addressed digest of a term's or quad's canonical
/// wire form. Used as the universal fallback identity: any two backends
/// that see the same wire form compute the same hash without exchanging
/// tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[must_use]
    pub fn of_wire_form(wire_form: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(wire_form.as_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    #[test]
    fn identical_wire_forms_hash_identically() {
        let a = ContentHash::of_wire_form(&Term::iri("http://example.com").to_wire_form());
        let b = ContentHash::of_wire_form(&Term::iri("http://example.com").to_wire_form());
        assert_eq!(a, b);
    }

    #[test]
    fn different_terms_hash_differently() {
        let a = ContentHash::of_wire_form(&Term::iri("http://example.com/a").to_wire_form());
        let b = ContentHash::of_wire_form(&Term::iri("http://example.com/b").to_wire_form());
        assert_ne!(a, b);
    }
}
