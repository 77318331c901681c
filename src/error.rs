//! Code generation error types.
//!
//! This is the generator's *own* fatal error channel (distinct from the two
//! error channels spliced into emitted code — see `codegen::members` for
//! those). A `CodegenError` means the input couldn't be turned into a tree
//! the engine can emit at all: an unknown signature character, a missing
//! required XML attribute, or a construct this engine doesn't support.

use std::fmt;

/// Error type for code generation and XML-tree construction.
#[derive(Debug)]
pub enum CodegenError {
    /// A required attribute (`name`, `type`, `interface`, ...) was missing.
    MissingAttribute { element: String, attribute: String },
    /// `direction` was present but neither `in` nor `out`.
    InvalidDirection { member: String, value: String },
    /// A signature character (or whole signature) this engine doesn't know.
    UnknownSignature(String),
    /// `variant`, `struct`, and `dict-entry` are explicitly out of scope.
    UnsupportedContainer { signature: String, kind: &'static str },
    /// An array whose element type needs more than one output variable
    /// (the length field would be lost) — rejected at construction.
    MultiVariableElement { array_signature: String },
    /// Error formatting generated text.
    Format(fmt::Error),
    /// I/O failure while reading the XML document or writing output.
    Io(std::io::Error),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::MissingAttribute { element, attribute } => {
                write!(f, "{element}: missing required attribute `{attribute}`")
            }
            CodegenError::InvalidDirection { member, value } => {
                write!(
                    f,
                    "{member}: direction must be \"in\" or \"out\", got \"{value}\""
                )
            }
            CodegenError::UnknownSignature(sig) => {
                write!(f, "unknown or unhandled type signature `{sig}`")
            }
            CodegenError::UnsupportedContainer { signature, kind } => {
                write!(f, "`{signature}`: {kind} containers are not supported")
            }
            CodegenError::MultiVariableElement { array_signature } => {
                write!(
                    f,
                    "array `{array_signature}`: element type needs more than one \
                     variable, its length field would be lost"
                )
            }
            CodegenError::Format(e) => write!(f, "error formatting generated code: {e}"),
            CodegenError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<fmt::Error> for CodegenError {
    fn from(e: fmt::Error) -> Self {
        CodegenError::Format(e)
    }
}

impl From<std::io::Error> for CodegenError {
    fn from(e: std::io::Error) -> Self {
        CodegenError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;
