use serde::Serialize;
use unscanny::Scanner;

use crate::error::LexerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Ident,
    Number,
    Dot,
    Comma,
    Plus,
    Minus,
    WhiteSpace,
    Newline,
    Comment,
    EOF,
}

impl TokenKind {
    pub fn ident_or_numeric(&self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::Number)
    }
}

/// Inclusive byte range into the netlist source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn join(&self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    pub fn single(kind: TokenKind, pos: usize) -> Self {
        Self::new(kind, pos, pos)
    }

    pub fn end(pos: usize) -> Self {
        Self::new(TokenKind::EOF, pos, pos)
    }
}

pub(crate) struct Lexer<'s> {
    s: Scanner<'s>,
}

impl<'s> Lexer<'s> {
    pub fn new(input: &'s str) -> Self {
        Lexer {
            s: Scanner::new(input),
        }
    }

    fn whitespace(&mut self, start: usize) -> Token {
        self.s.eat_while(|c: char| c.is_whitespace() && c != '\n');
        Token::new(TokenKind::WhiteSpace, start, self.s.cursor() - 1)
    }

    fn newline(&mut self, start: usize) -> Token {
        self.s.eat_while(|c: char| c == '\n');
        Token::new(TokenKind::Newline, start, self.s.cursor() - 1)
    }

    // `*` and `#` run to the end of the line
    fn comment(&mut self, start: usize) -> Token {
        self.s.eat_until('\n');
        Token::new(TokenKind::Comment, start, self.s.cursor() - 1)
    }

    fn identifier(&mut self, start: usize) -> Token {
        self.s.eat_while(|c: char| c.is_ascii_alphanumeric() || c == '_');
        Token::new(TokenKind::Ident, start, self.s.cursor() - 1)
    }

    fn number(&mut self, start: usize) -> Token {
        self.s.eat_while(|c: char| c.is_ascii_digit());
        Token::new(TokenKind::Number, start, self.s.cursor() - 1)
    }

    fn netlist(&mut self, c: char, start: usize) -> Result<Token, LexerError> {
        let token = match c {
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(start),
            c if c.is_ascii_digit() => self.number(start),
            '*' | '#' => self.comment(start),
            '.' => Token::single(TokenKind::Dot, start),
            ',' => Token::single(TokenKind::Comma, start),
            '+' => Token::single(TokenKind::Plus, start),
            '-' => Token::single(TokenKind::Minus, start),
            _ => {
                return Err(LexerError::UnexpectedCharacter {
                    ch: c,
                    span: Span::new(start, self.s.cursor() - 1),
                });
            }
        };
        Ok(token)
    }

    pub fn next(&mut self) -> Result<Token, LexerError> {
        let start = self.s.cursor();
        match self.s.eat() {
            Some('\n') => Ok(self.newline(start)),
            Some(c) if c.is_whitespace() => Ok(self.whitespace(start)),
            Some(c) => self.netlist(c, start),
            None => Ok(Token::end(start)),
        }
    }

    /// Lex the whole input, the trailing `EOF` token included.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next()?;
            let done = token.kind == TokenKind::EOF;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

pub(crate) fn token_text<'a>(src: &'a str, t: &Token) -> &'a str {
    &src[t.span.start..=t.span.end]
}
