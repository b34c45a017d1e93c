use thiserror::Error;

use crate::lexer::{Span, TokenKind};

#[derive(Debug, Error)]
pub enum NetlistError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("element name must not be empty")]
    EmptyElementName { span: Option<Span> },

    #[error("unsupported element '{name}': designator '{designator}' is not one of R, C, L, V, I, S, D")]
    UnsupportedElement {
        name: String,
        designator: char,
        span: Option<Span>,
    },

    #[error("element '{name}' is declared more than once")]
    DuplicateElement { name: String, span: Option<Span> },
}

impl NetlistError {
    pub fn error_span(&self) -> Option<Span> {
        match self {
            NetlistError::Lexer(le) => match le {
                LexerError::UnexpectedCharacter { span, .. } => Some(*span),
            },
            NetlistError::Parser(pe) => match pe {
                ParserError::UnexpectedToken { span, .. }
                | ParserError::MissingField { span, .. }
                | ParserError::ExpectedDigitsAfterDot { span }
                | ParserError::InvalidExponentDigits { span, .. }
                | ParserError::InvalidNumericLiteral { span, .. }
                | ParserError::TooManyFields { span } => Some(*span),
            },
            NetlistError::EmptyElementName { span }
            | NetlistError::UnsupportedElement { span, .. }
            | NetlistError::DuplicateElement { span, .. } => *span,
        }
    }
}

#[derive(Debug, Error)]
pub enum LexerError {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, span: Span },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("unexpected token {found:?} (expected {expected})")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        span: Span,
    },

    #[error("missing field: {field}")]
    MissingField { field: &'static str, span: Span },

    #[error("expected digits after '.'")]
    ExpectedDigitsAfterDot { span: Span },

    #[error("invalid exponent digits '{lexeme}'")]
    InvalidExponentDigits { span: Span, lexeme: String },

    #[error("invalid numeric literal '{lexeme}'")]
    InvalidNumericLiteral { span: Span, lexeme: String },

    #[error("too many fields, expected name,node,node[,value]")]
    TooManyFields { span: Span },
}
