//! Token types for the filter expression lexer
//!
//! Tokens represent the lexical elements of filter expressions.

/// Token types for the filter expression lexer
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    // Literals
    StringLiteral,
    IntegerLiteral,
    FloatLiteral,

    // Identifiers
    Identifier,
    DelimitedIdentifier,

    // Keywords
    And,
    Or,
    Not,
    Like,

    // Operators
    Dot,                // .
    Equal,              // =
    NotEqual,           // != or <>
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=

    // Delimiters
    OpenParen,  // (
    CloseParen, // )

    // End of input
    Eof,

    // Error
    Error,
}

impl TokenType {
    /// Keywords may still be used as field segments after a `.`
    pub fn is_keyword(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not | Self::Like)
    }
}

/// A token in the filter expression
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    /// Character offset of the first character of the token
    pub position: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: String, position: usize) -> Self {
        Self {
            token_type,
            value,
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            value: String::new(),
            position,
        }
    }

    pub fn error(message: String, position: usize) -> Self {
        Self {
            token_type: TokenType::Error,
            value: message,
            position,
        }
    }
}
