use miette::{Error, LabeledSpan, SourceSpan};
use std::{borrow::Cow, fmt};

use crate::error::{LexError, ParseError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub offset: usize,
    pub origin: &'de str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Dot,
    Comma,
    Colon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Add,
    Subtract,
    Multiply,
    Divide,
    Assign,
    String,
    Number,
    Ident,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalOr,
    BitwiseOr,
    LogicalAnd,
    BitwiseAnd,
    LogicalNot,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Dot => "DOT",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::Add => "ADD",
            TokenKind::Subtract => "SUBTRACT",
            TokenKind::Multiply => "MULTIPLY",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Assign => "ASSIGN",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Equal => "EQUAL",
            TokenKind::NotEqual => "NOT_EQUAL",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::LogicalOr => "LOGICAL_OR",
            TokenKind::BitwiseOr => "BITWISE_OR",
            TokenKind::LogicalAnd => "LOGICAL_AND",
            TokenKind::BitwiseAnd => "BITWISE_AND",
            TokenKind::LogicalNot => "LOGICAL_NOT",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "{} {}", self.kind, self.unescape()),
            _ => write!(f, "{} {}", self.kind, self.origin),
        }
    }
}

impl<'de> Token<'de> {
    /// The literal text of the token. For strings this resolves escapes;
    /// every other kind borrows straight from the source.
    pub fn unescape(&self) -> Cow<'de, str> {
        if self.kind != TokenKind::String || !self.origin.contains('\\') {
            return Cow::Borrowed(self.origin);
        }

        let mut out = String::with_capacity(self.origin.len());
        let mut chars = self.origin.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        Cow::Owned(out)
    }

    pub fn range(&self) -> (usize, usize) {
        (self.offset, self.offset + self.origin.len())
    }
}

#[derive(Debug, Default)]
pub struct Lexer<'de> {
    whole: &'de str,
    rest: &'de str,
    byte: usize,
    peeked: Option<Result<Token<'de>, Error>>,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Self {
            whole: input,
            rest: input,
            byte: 0,
            peeked: None,
        }
    }

    pub fn offset(&self) -> usize {
        self.byte
    }

    pub fn expect(&mut self, expected: TokenKind, unexpected: &str) -> Result<Token<'de>, Error> {
        self.expect_where(|next| next.kind == expected, unexpected)
    }

    pub fn expect_where(
        &mut self,
        mut check: impl FnMut(&Token<'de>) -> bool,
        unexpected: &str,
    ) -> Result<Token<'de>, Error> {
        match self.next() {
            Some(Ok(token)) if check(&token) => Ok(token),
            Some(Ok(token)) => Err(miette::miette!(
                labels = vec![LabeledSpan::at(
                    token.offset..token.offset + token.origin.len(),
                    "here"
                )],
                help = format!("found {}", token.kind),
                "ParseError: {unexpected}",
            )
            .with_source_code(self.whole.to_string())),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::new(
                self.whole,
                format!("{unexpected}, found end of input"),
                (self.byte, self.byte),
            )
            .into()),
        }
    }

    pub fn peek(&mut self) -> Option<&Result<Token<'de>, Error>> {
        if self.peeked.is_some() {
            return self.peeked.as_ref();
        }

        self.peeked = self.next();
        self.peeked.as_ref()
    }

    /// Kind of the next token, or `None` at end of input or on a lex error.
    /// The error itself stays queued for the next call to `next`.
    pub fn peek_kind(&mut self) -> Option<TokenKind> {
        match self.peek() {
            Some(Ok(token)) => Some(token.kind),
            _ => None,
        }
    }

    fn advance(&mut self, bytes: usize) -> &'de str {
        let taken = &self.rest[..bytes];
        self.byte += bytes;
        self.rest = &self.rest[bytes..];
        taken
    }

    fn lex_number(&mut self) -> Token<'de> {
        let start = self.byte;
        let src = self.rest;
        let mut end = 0;
        let mut got_dot = false;
        let mut got_e = false;
        let mut got_e_minus = false;

        for c in src.chars() {
            match c {
                '0'..='9' => end += 1,
                '.' if !got_dot => {
                    got_dot = true;
                    end += 1;
                }
                '-' if end == 0 => end += 1,
                '-' if got_e && !got_e_minus => {
                    got_e_minus = true;
                    end += 1;
                }
                'e' | 'E' if !got_e => {
                    got_e = true;
                    end += 1;
                }
                'f' => {
                    end += 1;
                    break;
                }
                _ => break,
            }
        }

        Token {
            kind: TokenKind::Number,
            offset: start,
            origin: self.advance(end),
        }
    }

    fn lex_string(&mut self, quote: char) -> Token<'de> {
        // skip the opening quote
        self.advance(quote.len_utf8());
        let start = self.byte;

        let mut end = self.rest.len();
        let mut chars = self.rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                end = i;
                break;
            }
        }

        let literal = self.advance(end);
        if !self.rest.is_empty() {
            self.advance(quote.len_utf8());
        }

        Token {
            kind: TokenKind::String,
            offset: start,
            origin: literal,
        }
    }

    fn lex_ident(&mut self) -> Token<'de> {
        let start = self.byte;
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());

        Token {
            kind: TokenKind::Ident,
            offset: start,
            origin: self.advance(end),
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, Error>;

    /// Once the iterator returns `Err`, it will only return `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(next) = self.peeked.take() {
            return Some(next);
        }

        self.rest = self.rest.trim_start();
        self.byte = self.whole.len() - self.rest.len();

        let mut chars = self.rest.chars();
        let c = chars.next()?;
        let following = chars.next();
        let c_at = self.byte;

        let just = |lexer: &mut Self, kind: TokenKind, len: usize| {
            Some(Ok(Token {
                kind,
                offset: c_at,
                origin: lexer.advance(len),
            }))
        };

        let doubled_or = |lexer: &mut Self, second: char, yes: TokenKind, no: TokenKind| {
            if following == Some(second) {
                just(lexer, yes, 2)
            } else {
                just(lexer, no, 1)
            }
        };

        match c {
            '.' if following.is_some_and(|f| f.is_ascii_digit()) => Some(Ok(self.lex_number())),
            '-' if following.is_some_and(|f| f.is_ascii_digit() || f == '.') => {
                Some(Ok(self.lex_number()))
            }
            '.' => just(self, TokenKind::Dot, 1),
            '-' => just(self, TokenKind::Subtract, 1),
            ',' => just(self, TokenKind::Comma, 1),
            ':' => just(self, TokenKind::Colon, 1),
            '(' => just(self, TokenKind::LeftParen, 1),
            ')' => just(self, TokenKind::RightParen, 1),
            '{' => just(self, TokenKind::LeftBrace, 1),
            '}' => just(self, TokenKind::RightBrace, 1),
            '+' => just(self, TokenKind::Add, 1),
            '*' => just(self, TokenKind::Multiply, 1),
            '/' => just(self, TokenKind::Divide, 1),
            '=' => doubled_or(self, '=', TokenKind::Equal, TokenKind::Assign),
            '<' => doubled_or(self, '=', TokenKind::LessEqual, TokenKind::Less),
            '>' => doubled_or(self, '=', TokenKind::GreaterEqual, TokenKind::Greater),
            '!' => doubled_or(self, '=', TokenKind::NotEqual, TokenKind::LogicalNot),
            '|' => doubled_or(self, '|', TokenKind::LogicalOr, TokenKind::BitwiseOr),
            '&' => doubled_or(self, '&', TokenKind::LogicalAnd, TokenKind::BitwiseAnd),
            '"' | '\'' => Some(Ok(self.lex_string(c))),
            c if c.is_ascii_digit() => Some(Ok(self.lex_number())),
            c if c == '_' || c.is_ascii_alphabetic() => Some(Ok(self.lex_ident())),
            c => {
                let err = LexError {
                    src: self.whole.to_string(),
                    token: c,
                    err_span: SourceSpan::from(c_at..c_at + c.len_utf8()),
                };
                // stop lexing after the first error
                self.byte = self.whole.len();
                self.rest = &self.whole[self.whole.len()..];
                Some(Err(err.into()))
            }
        }
    }
}
