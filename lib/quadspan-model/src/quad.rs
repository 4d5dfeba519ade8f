use crate::term::Term;
use std::fmt;

/// A position within a [`Quad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Subject,
    Predicate,
    Object,
    Label,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Subject,
        Direction::Predicate,
        Direction::Object,
        Direction::Label,
    ];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Subject => "subject",
            Direction::Predicate => "predicate",
            Direction::Object => "object",
            Direction::Label => "label",
        })
    }
}

/// A four-tuple edge: subject, predicate, object, and an optional label
/// (the "graph" a triple store would call a named graph).
///
/// A quad is only ever constructed with non-zero subject, predicate and
/// object; [`Quad::new`] enforces this, matching the spec's validity rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    subject: Term,
    predicate: Term,
    object: Term,
    label: Option<Term>,
}

/// A quad was built from a subject, predicate or object that was the
/// distinguished zero term.
#[derive(Debug, Clone, thiserror::Error)]
#[error("quad {direction} must not be the zero term")]
pub struct InvalidQuadError {
    pub direction: Direction,
}

impl Quad {
    pub fn new(
        subject: Term,
        predicate: Term,
        object: Term,
        label: Option<Term>,
    ) -> Result<Self, InvalidQuadError> {
        if subject.is_zero() {
            return Err(InvalidQuadError {
                direction: Direction::Subject,
            });
        }
        if predicate.is_zero() {
            return Err(InvalidQuadError {
                direction: Direction::Predicate,
            });
        }
        if object.is_zero() {
            return Err(InvalidQuadError {
                direction: Direction::Object,
            });
        }
        Ok(Self {
            subject,
            predicate,
            object,
            label,
        })
    }

    #[must_use]
    pub fn get(&self, direction: Direction) -> Option<&Term> {
        match direction {
            Direction::Subject => Some(&self.subject),
            Direction::Predicate => Some(&self.predicate),
            Direction::Object => Some(&self.object),
            Direction::Label => self.label.as_ref(),
        }
    }

    #[must_use]
    pub fn subject(&self) -> &Term {
        &self.subject
    }

    #[must_use]
    pub fn predicate(&self) -> &Term {
        &self.predicate
    }

    #[must_use]
    pub fn object(&self) -> &Term {
        &self.object
    }

    #[must_use]
    pub fn label(&self) -> Option<&Term> {
        self.label.as_ref()
    }

    /// The canonical wire form: four whitespace-separated terms followed by
    /// `.`, the label omitted for the unlabeled (default) graph.
    #[must_use]
    pub fn to_wire_form(&self) -> String {
        match &self.label {
            Some(label) => format!(
                "{} {} {} {} .",
                self.subject.to_wire_form(),
                self.predicate.to_wire_form(),
                self.object.to_wire_form(),
                label.to_wire_form()
            ),
            None => format!(
                "{} {} {} .",
                self.subject.to_wire_form(),
                self.predicate.to_wire_form(),
                self.object.to_wire_form()
            ),
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire_form())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_subject() {
        let err = Quad::new(
            Term::String(String::new()),
            Term::iri("p"),
            Term::iri("o"),
            None,
        )
        .unwrap_err();
        assert_eq!(err.direction, Direction::Subject);
    }

    #[test]
    fn wire_form_omits_absent_label() {
        let q = Quad::new(Term::iri("s"), Term::iri("p"), Term::iri("o"), None).unwrap();
        assert_eq!(q.to_wire_form(), "<s> <p> <o> .");
    }

    #[test]
    fn get_projects_each_direction() {
        let q = Quad::new(
            Term::iri("s"),
            Term::iri("p"),
            Term::iri("o"),
            Some(Term::iri("g")),
        )
        .unwrap();
        assert_eq!(q.get(Direction::Subject), Some(&Term::iri("s")));
        assert_eq!(q.get(Direction::Label), Some(&Term::iri("g")));
    }
}
