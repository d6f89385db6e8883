use std::{fmt, ops::Deref};

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub inner: T,
    pub range: (usize, usize),
}

impl<T> Spanned<T> {
    pub fn new(inner: T, range: (usize, usize)) -> Self {
        Self { inner, range }
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Float(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{n:.1}"),
            Constant::Float(n) => write!(f, "{n}"),
            Constant::String(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BinaryOp::Or => "||",
                BinaryOp::And => "&&",
                BinaryOp::Equal => "==",
                BinaryOp::NotEqual => "!=",
                BinaryOp::Less => "<",
                BinaryOp::LessEqual => "<=",
                BinaryOp::Greater => ">",
                BinaryOp::GreaterEqual => ">=",
                BinaryOp::Add => "+",
                BinaryOp::Subtract => "-",
                BinaryOp::Multiply => "*",
                BinaryOp::Divide => "/",
            }
        )
    }
}

/// One `name: value` (or `name = value`) entry of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionInner {
    Constant(Constant),
    /// Resolved against the environment's receiver at evaluation time.
    Variable(String),
    Member {
        target: Box<Expression>,
        name: String,
    },
    Binary {
        operator: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Only consumed by receiver and argument construction.
    ObjectLiteral(Vec<Assignment>),
}

/// Parsed expressions own their text, so a parse outlives its source and can
/// be evaluated any number of times.
pub type Expression = Spanned<ExpressionInner>;

impl Expression {
    pub fn as_object_literal(&self) -> Option<&[Assignment]> {
        match &self.inner {
            ExpressionInner::ObjectLiteral(assignments) => Some(assignments),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ExpressionInner::Constant(constant) => write!(f, "{constant}"),
            ExpressionInner::Variable(name) => write!(f, "{name}"),
            ExpressionInner::Member { target, name } => write!(f, "(. {target} {name})"),
            ExpressionInner::Binary {
                operator,
                left,
                right,
            } => write!(f, "({operator} {left} {right})"),
            ExpressionInner::ObjectLiteral(assignments) => {
                write!(f, "{{")?;
                for (i, assignment) in assignments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", assignment.name, assignment.value)?;
                }
                write!(f, " }}")
            }
        }
    }
}
