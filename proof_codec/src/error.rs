//! Error types returned while normalizing proof material.

use std::fmt::{self, Display};

use serde_json::Value;
use thiserror::Error;

use crate::system::ProofSystem;

/// Maximum number of characters of the offending input echoed back in a
/// [`FormatError::Format`].
pub const SNIPPET_LEN: usize = 50;

/// A low-level failure inside a single codec.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CodecError {
    #[error("expected a numeric value, found `{0}`")]
    InvalidNumber(String),

    #[error("value does not fit in {0} bytes")]
    ValueTooLarge(usize),

    #[error("expected a 0x-prefixed hex string, found `{0}`")]
    InvalidHex(String),

    #[error("expected {expected} bytes, found {actual}")]
    InvalidByteLength { expected: usize, actual: usize },

    #[error("length mismatch: expected {expected} {unit}, found {actual}")]
    LengthMismatch {
        expected: usize,
        actual: usize,
        unit: &'static str,
    },

    #[error("unsupported curve `{0}`")]
    UnsupportedCurve(String),

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("unexpected shape: {0}")]
    UnexpectedShape(String),

    #[error("a version is required")]
    MissingVersion,

    #[error("invalid version `{0}`")]
    InvalidVersion(String),
}

/// The three pieces of proof material a codec formats.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InputField {
    Proof,
    PublicSignals,
    VerificationKey,
}

impl InputField {
    /// Sentence-case rendering used at the start of a snippet.
    pub fn title(&self) -> &'static str {
        match self {
            InputField::Proof => "Proof",
            InputField::PublicSignals => "Public signals",
            InputField::VerificationKey => "Verification key",
        }
    }
}

impl Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputField::Proof => "proof",
            InputField::PublicSignals => "public signals",
            InputField::VerificationKey => "verification key",
        })
    }
}

/// Error returned by [`format`](crate::format) and the registry.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FormatError {
    /// One of proof, public signals or verification key was absent or empty.
    #[error("missing {field} for {system} proof: {field} must be provided and non-empty")]
    MissingInput {
        system: ProofSystem,
        field: InputField,
    },

    #[error("Unsupported proof type: {0}")]
    UnsupportedProofType(String),

    /// Companion options (library, curve, version) do not match what the
    /// proof system requires.
    #[error("invalid options for {system}: {reason}")]
    InvalidOptions { system: ProofSystem, reason: String },

    #[error("Failed to format {system} {field}: {cause}. {} snippet: \"{snippet}...\"", .field.title())]
    Format {
        system: ProofSystem,
        field: InputField,
        cause: CodecError,
        snippet: String,
    },
}

impl FormatError {
    pub(crate) fn format(
        system: ProofSystem,
        field: InputField,
        cause: CodecError,
        input: &Value,
    ) -> Self {
        FormatError::Format {
            system,
            field,
            cause,
            snippet: snippet(input),
        }
    }
}

/// First [`SNIPPET_LEN`] characters of the input, with non-string inputs
/// rendered as JSON first.
pub fn snippet(input: &Value) -> String {
    let rendered = match input {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    rendered.chars().take(SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn snippet_truncates_strings() {
        let long = "a".repeat(80);
        assert_eq!(snippet(&json!(long)), "a".repeat(50));
        assert_eq!(snippet(&json!("0x12")), "0x12");
    }

    #[test]
    fn snippet_stringifies_objects() {
        assert_eq!(snippet(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(snippet(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn format_envelope() {
        let err = FormatError::format(
            ProofSystem::Fflonk,
            InputField::PublicSignals,
            CodecError::InvalidNumber("x".into()),
            &json!(["x"]),
        );
        assert_eq!(
            err.to_string(),
            r#"Failed to format fflonk public signals: expected a numeric value, found `x`. Public signals snippet: "["x"]...""#
        );
    }
}
