//! Compile-time and evaluation-time errors.

use thiserror::Error;

/// What went wrong while compiling a query.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Expected a key")]
    ExpectedKey,
    #[error("Expected '$' or a function call at start")]
    ExpectedRootOrFunction,
    #[error("Expected '$' or '@'")]
    ExpectedRootOrCurrentNode,
    #[error("Expected '.', '[' or an operator")]
    ExpectedSeparator,
    #[error("Expected ']'")]
    ExpectedRightBracket,
    #[error("Expected a comparator")]
    ExpectedComparator,
    #[error("Expected '||'")]
    ExpectedOr,
    #[error("Expected '&&'")]
    ExpectedAnd,
    #[error("Expected '/' to open a regular expression")]
    ExpectedForwardSlash,
    #[error("Expected a single quote or a digit")]
    ExpectedSingleQuoteOrDigit,
    #[error("Invalid number")]
    InvalidNumber,
    #[error("Slice step cannot be zero")]
    StepCannotBeZero,
    #[error("Unbalanced parenthesis")]
    UnbalancedParenthesis,
    #[error("Unbalanced braces")]
    UnbalancedBraces,
    #[error("Illegal escaped character")]
    IllegalEscapedCharacter,
    #[error("Invalid code point")]
    InvalidCodepoint,
    #[error("Unknown function")]
    UnknownFunction,
    #[error("Wrong number of function arguments")]
    InvalidArity,
    #[error("Invalid regular expression")]
    InvalidRegex,
    #[error("Invalid JSON literal")]
    InvalidLiteral,
    #[error("Syntax error")]
    SyntaxError,
}

impl ErrorKind {
    /// Stable symbolic name, e.g. `"step_cannot_be_zero"`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedEof => "unexpected_eof",
            ErrorKind::ExpectedKey => "expected_key",
            ErrorKind::ExpectedRootOrFunction => "expected_root_or_function",
            ErrorKind::ExpectedRootOrCurrentNode => "expected_root_or_current_node",
            ErrorKind::ExpectedSeparator => "expected_separator",
            ErrorKind::ExpectedRightBracket => "expected_rbracket",
            ErrorKind::ExpectedComparator => "expected_comparator",
            ErrorKind::ExpectedOr => "expected_or",
            ErrorKind::ExpectedAnd => "expected_and",
            ErrorKind::ExpectedForwardSlash => "expected_forward_slash",
            ErrorKind::ExpectedSingleQuoteOrDigit => "expected_single_quote_or_digit",
            ErrorKind::InvalidNumber => "invalid_number",
            ErrorKind::StepCannotBeZero => "step_cannot_be_zero",
            ErrorKind::UnbalancedParenthesis => "unbalanced_parenthesis",
            ErrorKind::UnbalancedBraces => "unbalanced_braces",
            ErrorKind::IllegalEscapedCharacter => "illegal_escaped_character",
            ErrorKind::InvalidCodepoint => "invalid_codepoint",
            ErrorKind::UnknownFunction => "unknown_function",
            ErrorKind::InvalidArity => "invalid_arity",
            ErrorKind::InvalidRegex => "invalid_regex",
            ErrorKind::InvalidLiteral => "invalid_literal",
            ErrorKind::SyntaxError => "syntax_error",
        }
    }
}

/// A query failed to compile.
///
/// `line` and `column` are 1-based and point at the offending character (or
/// one past the end of input for [`ErrorKind::UnexpectedEof`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at line {line} and column {column}")]
pub struct JsonPathError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
}

impl JsonPathError {
    pub fn new(kind: ErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// Evaluation failed. Only function misuse can cause this; a query that
/// matches nothing is not an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("{function}: {message}")]
    InvalidArgument {
        function: String,
        message: String,
    },
    #[error("{0}")]
    Function(String),
    #[error("Malformed expression")]
    MalformedExpression,
}

impl EvalError {
    pub(crate) fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// A flattened document could not be rebuilt.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnflattenError {
    #[error("Flattened document must be an object")]
    NotAnObject,
    #[error("Invalid path '{key}': {source}")]
    InvalidPath { key: String, source: JsonPathError },
    #[error("Path '{key}' conflicts with an earlier path")]
    Conflict { key: String },
    #[error("Path '{key}' skips array elements")]
    IndexGap { key: String },
}

/// Either error, for the helpers that compile and evaluate in one call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] JsonPathError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
