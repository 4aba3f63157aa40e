//! Crate-wide error type.

use core::fmt;

/// Classification of an [`Error`].
///
/// Every failure surfaced by this crate carries exactly one of these kinds,
/// so callers can match on the category without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Input construction received an invalid combination of fields
    /// (neither `input` nor `octets`, both at once, or `octets` without
    /// `encoding`).
    InputShape,
    /// Byte decoding failed under the chosen decode strategy, or the
    /// declared encoding label is not recognized.
    DecodeFailed,
    /// The input does not match the bound grammar.
    GrammarRejected,
    /// The bound grammar derives the input in more than one way.
    GrammarAmbiguous,
    /// The base of a resolution has no scheme.
    NotAbsolute,
    /// An operation requiring generic-kind identifiers was invoked on a
    /// common-kind one.
    WrongKind,
    /// A parameterization descriptor is malformed: bad symbol keys,
    /// unknown fields, or fields left unmapped.
    BindingInvalid,
    /// A ladder stage was requested by an unrecognized name or
    /// out-of-range index.
    IndiceUnknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InputShape => "invalid input shape",
            ErrorKind::DecodeFailed => "byte decoding failed",
            ErrorKind::GrammarRejected => "input rejected by grammar",
            ErrorKind::GrammarAmbiguous => "parse is ambiguous",
            ErrorKind::NotAbsolute => "base has no scheme",
            ErrorKind::WrongKind => "operation requires generic identifiers",
            ErrorKind::BindingInvalid => "invalid parameterization",
            ErrorKind::IndiceUnknown => "unknown ladder stage",
        };
        f.write_str(s)
    }
}

/// Resource identifier error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    /// Error category.
    kind: ErrorKind,
    /// Human-readable detail.
    message: String,
}

impl Error {
    /// Creates a new error of the given kind.
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error classification.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detail message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_detail() {
        let e = Error::new(ErrorKind::GrammarRejected, "no rule matched at char 3");
        assert_eq!(e.kind(), ErrorKind::GrammarRejected);
        assert_eq!(
            e.to_string(),
            "input rejected by grammar: no rule matched at char 3"
        );
    }
}
