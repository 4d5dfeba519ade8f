use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A typed RDF-style value.
///
/// Equality is structural; two [`Term`]s compare equal iff their kind and
/// lexical content are identical. Ordering between terms of different
/// families (e.g. a string against an integer) is not defined and
/// comparison operators in the query layer treat such pairs as unordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// An internationalized resource identifier.
    Iri(String),
    /// A blank node, identified by an opaque per-store label.
    Blank(String),
    /// A plain string with no language tag or datatype.
    String(String),
    /// A string tagged with a BCP 47 language code.
    LangString { value: String, language: String },
    /// A literal carrying an explicit datatype IRI not otherwise modeled here.
    Typed { value: String, datatype: String },
    Integer(i64),
    Float(OrderedFloat),
    Boolean(bool),
    /// A UTC timestamp at microsecond precision.
    Timestamp(Timestamp),
}

/// A wall-clock instant, stored as microseconds since the Unix epoch so
/// comparisons are exact regardless of the backend's native clock type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    micros_since_epoch: i64,
}

impl Timestamp {
    #[must_use]
    pub fn from_micros(micros_since_epoch: i64) -> Self {
        Self {
            micros_since_epoch,
        }
    }

    #[must_use]
    pub fn as_micros(self) -> i64 {
        self.micros_since_epoch
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.micros_since_epoch)
    }
}

/// A floating point value with a total order and a stable hash, so it can
/// live inside a [`Term`] without violating `Eq`/`Hash` on `NaN`.
///
/// Bit-identical values (including `-0.0` vs `0.0` and the various `NaN`
/// payloads) are the only values considered equal, matching the RDF
/// `sameTerm` notion of literal identity rather than numeric equality.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl From<f64> for OrderedFloat {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Term {
    /// The distinguished zero term used in the `label` position of a quad
    /// that carries no graph label.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Term::String(s) if s.is_empty())
    }

    /// The canonical wire form used both for display and as the input to
    /// [`crate::hash::content_hash`]: `<iri>`, `_:id`, quoted strings,
    /// `"value"@lang`, `"value"^^<datatype>`, and lexical forms for the
    /// remaining scalar kinds.
    #[must_use]
    pub fn to_wire_form(&self) -> String {
        match self {
            Term::Iri(iri) => format!("<{iri}>"),
            Term::Blank(id) => format!("_:{id}"),
            Term::String(value) => format!("{value:?}"),
            Term::LangString { value, language } => format!("{value:?}@{language}"),
            Term::Typed { value, datatype } => format!("{value:?}^^<{datatype}>"),
            Term::Integer(value) => value.to_string(),
            Term::Float(value) => format!("{:e}", value.get()),
            Term::Boolean(value) => value.to_string(),
            Term::Timestamp(value) => value.to_string(),
        }
    }

    #[must_use]
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    #[must_use]
    pub fn blank(value: impl Into<String>) -> Self {
        Term::Blank(value.into())
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Term::String(value.into())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire_form())
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::String(value.to_owned())
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Integer(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_round_trips_structure() {
        let iri = Term::iri("http://example.com/alice");
        assert_eq!(iri.to_wire_form(), "<http://example.com/alice>");

        let lang = Term::LangString {
            value: "bonjour".into(),
            language: "fr".into(),
        };
        assert_eq!(lang.to_wire_form(), "\"bonjour\"@fr");
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(OrderedFloat(0.0), OrderedFloat(0.0));
        assert_ne!(OrderedFloat(0.0), OrderedFloat(-0.0));
        assert_eq!(OrderedFloat(f64::NAN), OrderedFloat(f64::NAN));
    }

    #[test]
    fn integer_boundaries_preserve_precision() {
        assert_eq!(Term::Integer(i64::MAX), Term::Integer(i64::MAX));
        assert_ne!(Term::Integer(i64::MAX), Term::Integer(i64::MAX - 1));
        assert_eq!(Term::Integer(i64::MIN), Term::Integer(i64::MIN));
    }
}
