// ABOUTME: Error types for every phase of the RPAL pipeline

use thiserror::Error;

/// Failures produced while tokenizing source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("illegal character '{0}'")]
    IllegalCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,
}

/// Failures produced while building the surface AST from a token stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token '{found}', expected one of: {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("unexpected end of input, expected one of: {expected}")]
    UnexpectedEof { expected: String },
}

/// Unified error type surfaced by every stage of the interpreter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A standardizer invariant was violated; this indicates a parser bug,
    /// not a user mistake, since the parser should never hand the
    /// standardizer a tree shape the rewrite rules can't consume.
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    #[error("undefined identifier: {0}")]
    UnboundIdentifier(String),

    #[error("{op}: expected {expected}, got {got}")]
    TypeError {
        op: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("tuple index {index} out of range for tuple of length {len}")]
    TupleIndexOutOfRange { index: i64, len: usize },

    #[error("arity mismatch: expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("division by zero")]
    DivisionByZero,
}
