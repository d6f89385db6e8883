use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Diagnostic, Debug, Error)]
#[error("LexError: Unexpected character '{token}'")]
pub struct LexError {
    #[source_code]
    pub src: String,

    pub token: char,

    #[label = "this input character"]
    pub err_span: SourceSpan,
}

#[derive(Diagnostic, Debug, Error)]
#[error("ParseError: {message}")]
pub struct ParseError {
    #[source_code]
    pub src: String,

    pub message: String,

    #[label = "here"]
    pub err_span: SourceSpan,
}

impl ParseError {
    pub fn new(src: &str, message: impl Into<String>, range: (usize, usize)) -> Self {
        Self {
            src: src.to_string(),
            message: message.into(),
            err_span: SourceSpan::from(range.0..range.1),
        }
    }
}

#[derive(Diagnostic, Debug, Error, PartialEq)]
pub enum ResolutionError {
    #[error("ResolutionError: Type '{name}' not found")]
    TypeNotFound { name: String },

    #[error("ResolutionError: Member '{member}' not found in '{type_name}'")]
    MemberNotFound { member: String, type_name: String },

    #[error("ResolutionError: '{name}' cannot be resolved without a receiver type")]
    NoReceiver { name: String },

    #[error("ResolutionError: '{member}' is not a qualified member name")]
    Unqualified { member: String },

    #[error("ResolutionError: Member name must not be empty")]
    EmptyName,
}

#[derive(Diagnostic, Debug, Error, PartialEq)]
pub enum ConstructionError {
    #[error("ConstructionError: Cannot assign values to '{member}' in '{type_name}'")]
    NotWritable { member: String, type_name: String },

    #[error("ConstructionError: '{type_name}' has no parameterless constructor")]
    NoConstructor { type_name: String },
}

/// Raised when the invoked member itself failed. `cause` is the host's error,
/// which is what a test run reports.
#[derive(Diagnostic, Debug, Error)]
#[error("InvocationError: '{member}' raised: {cause}")]
pub struct InvocationError {
    pub member: String,
    pub cause: miette::Report,
}

#[derive(Diagnostic, Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("EvaluationError: Object is null when accessing '{member}'")]
    NullTarget { member: String },

    #[error("EvaluationError: Operator '{operator}' is not supported")]
    UnsupportedOperator { operator: String },

    #[error("EvaluationError: Bad operand for {operator}: {reason}")]
    BadOperand { operator: String, reason: String },

    #[error("EvaluationError: Object literals cannot be evaluated directly")]
    ObjectLiteral,

    #[error("EvaluationError: '{member}' in '{type_name}' is not a readable field or property")]
    NotReadable { member: String, type_name: String },

    #[error("EvaluationError: '{member}' in '{type_name}' is not invocable")]
    NotInvocable { member: String, type_name: String },

    #[error("EvaluationError: Expected {expected} argument(s) for '{member}', got {found}")]
    Arity {
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("EvaluationError: Object of type '{type_name}' is already in use")]
    AlreadyBorrowed { type_name: String },
}

#[derive(Diagnostic, Debug, Error, PartialEq)]
#[error("ConversionError: Cannot convert {found} to {expected}")]
pub struct ConversionError {
    pub expected: String,
    pub found: String,
}

impl ConversionError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
