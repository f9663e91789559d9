//! BIO label parsing

use std::fmt;

/// Label for entity-free tokens
pub const OUTSIDE: &str = "O";

/// Parsed BIO label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// `O`
    Outside,
    /// `B-TYPE`
    Begin(String),
    /// `I-TYPE`, or any other non-`O` label treated as a continuation marker
    Inside(String),
}

impl Label {
    /// Parse a raw classifier label
    ///
    /// Only a `B-` prefix marks a span start. Anything else that is not `O`
    /// is a continuation marker whose type is the label with any `I-`
    /// prefix stripped.
    pub fn parse(raw: &str) -> Self {
        if raw == OUTSIDE {
            return Label::Outside;
        }
        if let Some(entity_type) = raw.strip_prefix("B-") {
            return Label::Begin(entity_type.to_string());
        }
        let entity_type = raw.strip_prefix("I-").unwrap_or(raw);
        Label::Inside(entity_type.to_string())
    }

    /// Entity type, `None` for `O`
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Label::Outside => None,
            Label::Begin(t) | Label::Inside(t) => Some(t),
        }
    }

    pub fn is_begin(&self) -> bool {
        matches!(self, Label::Begin(_))
    }
}

/// Renders the canonical form: a continuation marker always prints with
/// an `I-` prefix, so an unprefixed raw label such as `ORG` prints as `I-ORG`
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Outside => write!(f, "{}", OUTSIDE),
            Label::Begin(t) => write!(f, "B-{}", t),
            Label::Inside(t) => write!(f, "I-{}", t),
        }
    }
}
