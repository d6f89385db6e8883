use miette::Error;

use crate::{
    ast::{Assignment, BinaryOp, Constant, Expression, ExpressionInner, Spanned},
    error::ParseError,
    lexer::{Token, TokenKind},
    Lexer,
};

/// Recursive-descent parser for assertion, receiver and argument expressions.
///
/// Precedence, lowest first: `||`, `&&`, equality, relational, additive,
/// multiplicative, primary. Equality and relational operators apply at most
/// once per level, so `a == b == c` is rejected as trailing input.
#[derive(Debug)]
pub struct Parser<'de> {
    whole: &'de str,
    lexer: Lexer<'de>,
}

impl Expression {
    pub fn parse(src: &str) -> Result<Expression, Error> {
        Parser::new(src).parse()
    }
}

fn binary(operator: BinaryOp, left: Expression, right: Expression) -> Expression {
    let range = (left.range.0, right.range.1);
    Spanned::new(
        ExpressionInner::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        range,
    )
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::LogicalOr => BinaryOp::Or,
        TokenKind::LogicalAnd => BinaryOp::And,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Add => BinaryOp::Add,
        TokenKind::Subtract => BinaryOp::Subtract,
        TokenKind::Multiply => BinaryOp::Multiply,
        TokenKind::Divide => BinaryOp::Divide,
        _ => return None,
    };
    Some(op)
}

impl<'de> Parser<'de> {
    pub fn new(input: &'de str) -> Self {
        Self {
            whole: input,
            lexer: Lexer::new(input),
        }
    }

    pub fn whole(&self) -> &str {
        self.whole
    }

    /// Parses exactly one expression; anything left over is an error.
    pub fn parse(&mut self) -> Result<Expression, Error> {
        let expr = self.parse_or()?;

        match self.lexer.next() {
            None => Ok(expr),
            Some(Err(e)) => Err(e),
            Some(Ok(token)) => Err(ParseError::new(
                self.whole,
                format!("Unexpected '{}' after expression", token.origin),
                token.range(),
            )
            .into()),
        }
    }

    /// Consumes the next token if it is one of `kinds`. A pending lex error is
    /// surfaced here rather than being mistaken for the end of input.
    fn next_if(&mut self, kinds: &[TokenKind]) -> Result<Option<Token<'de>>, Error> {
        match self.lexer.peek() {
            Some(Ok(token)) if kinds.contains(&token.kind) => {}
            Some(Err(_)) => {}
            _ => return Ok(None),
        }
        self.lexer.next().transpose()
    }

    fn parse_left_assoc(
        &mut self,
        kinds: &[TokenKind],
        operand: fn(&mut Self) -> Result<Expression, Error>,
    ) -> Result<Expression, Error> {
        let mut expr = operand(self)?;
        while let Some(token) = self.next_if(kinds)? {
            let right = operand(self)?;
            expr = self.combine(token, expr, right)?;
        }
        Ok(expr)
    }

    fn parse_single(
        &mut self,
        kinds: &[TokenKind],
        operand: fn(&mut Self) -> Result<Expression, Error>,
    ) -> Result<Expression, Error> {
        let expr = operand(self)?;
        match self.next_if(kinds)? {
            Some(token) => {
                let right = operand(self)?;
                self.combine(token, expr, right)
            }
            None => Ok(expr),
        }
    }

    fn combine(
        &self,
        token: Token<'de>,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, Error> {
        let operator = binary_op(token.kind).ok_or_else(|| {
            ParseError::new(
                self.whole,
                format!("'{}' is not a binary operator", token.origin),
                token.range(),
            )
        })?;
        Ok(binary(operator, left, right))
    }

    fn parse_or(&mut self) -> Result<Expression, Error> {
        self.parse_left_assoc(&[TokenKind::LogicalOr], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expression, Error> {
        self.parse_left_assoc(&[TokenKind::LogicalAnd], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expression, Error> {
        self.parse_single(
            &[TokenKind::Equal, TokenKind::NotEqual],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<Expression, Error> {
        self.parse_single(
            &[
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expression, Error> {
        self.parse_left_assoc(
            &[TokenKind::Add, TokenKind::Subtract],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, Error> {
        self.parse_left_assoc(
            &[TokenKind::Multiply, TokenKind::Divide],
            Self::parse_primary,
        )
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let token = match self.lexer.next() {
            Some(Ok(token)) => token,
            Some(Err(e)) => return Err(e),
            None => {
                return Err(ParseError::new(
                    self.whole,
                    "Expected an expression, found end of input",
                    (self.whole.len(), self.whole.len()),
                )
                .into())
            }
        };

        let mut expr = match token.kind {
            TokenKind::Ident => {
                let inner = match token.origin {
                    "true" => ExpressionInner::Constant(Constant::Bool(true)),
                    "false" => ExpressionInner::Constant(Constant::Bool(false)),
                    name => ExpressionInner::Variable(name.to_string()),
                };
                Spanned::new(inner, token.range())
            }
            TokenKind::String => Spanned::new(
                ExpressionInner::Constant(Constant::String(token.unescape().into_owned())),
                token.range(),
            ),
            TokenKind::Number => self.parse_number(token)?,
            TokenKind::LeftParen => {
                let inner = self.parse_or()?;
                self.lexer
                    .expect(TokenKind::RightParen, "Expected closing ')'")?;
                inner
            }
            TokenKind::LeftBrace => self.parse_object_literal(token)?,
            _ => {
                return Err(ParseError::new(
                    self.whole,
                    format!("Unexpected '{}', expected a literal, name, '(' or '{{'", token.origin),
                    token.range(),
                )
                .into())
            }
        };

        while self.next_if(&[TokenKind::Dot])?.is_some() {
            let name = self
                .lexer
                .expect(TokenKind::Ident, "Expected a member name after '.'")?;
            let range = (expr.range.0, name.range().1);
            expr = Spanned::new(
                ExpressionInner::Member {
                    target: Box::new(expr),
                    name: name.origin.to_string(),
                },
                range,
            );
        }

        Ok(expr)
    }

    fn parse_number(&self, token: Token<'de>) -> Result<Expression, Error> {
        let text = token.origin;
        let constant = if let Some(float) = text.strip_suffix('f') {
            float.parse().ok().map(Constant::Float)
        } else if let Ok(int) = text.parse() {
            Some(Constant::Int(int))
        } else {
            text.parse().ok().map(Constant::Float)
        };

        match constant {
            Some(constant) => Ok(Spanned::new(
                ExpressionInner::Constant(constant),
                token.range(),
            )),
            None => Err(ParseError::new(
                self.whole,
                format!("Cannot interpret number '{text}'"),
                token.range(),
            )
            .into()),
        }
    }

    /// `{` already consumed. Entries are `name: expr` or `name = expr`, where
    /// the name may also be a string literal; commas between entries are
    /// optional.
    fn parse_object_literal(&mut self, open: Token<'de>) -> Result<Expression, Error> {
        let mut assignments = Vec::new();

        loop {
            let token = self.lexer.expect_where(
                |t| {
                    matches!(
                        t.kind,
                        TokenKind::Ident | TokenKind::String | TokenKind::RightBrace
                    )
                },
                "Expected a member name or '}' in object literal",
            )?;

            if token.kind == TokenKind::RightBrace {
                return Ok(Spanned::new(
                    ExpressionInner::ObjectLiteral(assignments),
                    (open.offset, token.range().1),
                ));
            }

            let name = token.unescape().into_owned();
            self.lexer.expect_where(
                |t| matches!(t.kind, TokenKind::Colon | TokenKind::Assign),
                "Expected ':' or '=' after member name",
            )?;
            let value = self.parse_or()?;
            assignments.push(Assignment { name, value });

            self.next_if(&[TokenKind::Comma])?;
        }
    }
}

#[cfg(test)]
mod tests;
