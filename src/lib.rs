pub mod lexer;
pub use lexer::Lexer;

pub mod parser;
pub use parser::Parser;

pub mod ast;

pub mod evaluator;

pub mod value;
pub use value::Value;

pub mod codec;

pub mod host;

pub mod runner;

pub mod error;

#[cfg(test)]
mod tests;
