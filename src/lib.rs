//! Infix expression evaluator.
//!
//! An [`Expression`] is lexed and converted to reverse polish notation once,
//! when it is built. After that only the variable bindings change:
//!
//! ```
//! use expression_parser::Expression;
//!
//! let mut expr = Expression::new("(x1 + x2) ^ 2")?;
//! expr.set_value("x1", 3.0)?;
//! expr.set_value("x2", 5.0)?;
//! assert_eq!(expr.evaluate()?, 64.0);
//! # Ok::<(), miette::Error>(())
//! ```
//!
//! Errors are [`miette`] reports. The concrete kind can be recovered with
//! `downcast_ref` to [`LexError`], [`SyntaxError`], [`EvalError`] or
//! [`UnknownVariableError`].

use std::fmt::Display;

use log::debug;
use miette::Error;

pub mod eval;
pub mod lex;
pub mod parse;
pub mod system;

pub use eval::{EvalError, EvalErrorKind, UnknownVariableError, Variables};
pub use lex::{LexError, Lexer, Token, TokenKind, tokenize};
pub use parse::{DisplayRpn, Parser, Program, RpnToken, SyntaxError, SyntaxErrorKind};

/// A parsed expression together with its variable bindings.
///
/// Not meant to be shared between threads without a lock: [`set_value`]
/// and [`evaluate`] both go through the same binding table.
///
/// [`set_value`]: Expression::set_value
/// [`evaluate`]: Expression::evaluate
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    program: Program,
}

impl Expression {
    /// Lower-cases `expression` and builds its postfix form.
    pub fn new(expression: &str) -> Result<Self, Error> {
        let source = expression.to_lowercase();
        let program = Parser::new(None, &source).parse()?;
        debug!(
            "built `{source}`: {} rpn tokens, {} variables",
            program.rpn.len(),
            program.variables.len()
        );
        Ok(Expression { source, program })
    }

    /// Binds `name`. Only names discovered while parsing are accepted.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), Error> {
        self.program.variables.set(&name.to_lowercase(), value)
    }

    /// Evaluates with the current bindings. Variables that were never set
    /// count as `0.0`.
    pub fn evaluate(&self) -> Result<f64, Error> {
        eval::evaluate(&self.program.rpn, &self.program.variables)
    }

    /// Evaluates, failing if any variable was never set.
    pub fn evaluate_strict(&self) -> Result<f64, Error> {
        eval::evaluate_strict(&self.program.rpn, &self.program.variables)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rpn(&self) -> &[RpnToken] {
        &self.program.rpn
    }

    /// Variable names in order of first appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.program.variables.names()
    }

    pub fn unbound_variables(&self) -> impl Iterator<Item = &str> {
        self.program.variables.unbound()
    }

    pub fn postfix(&self) -> DisplayRpn<'_> {
        DisplayRpn(&self.program.rpn, &self.program.variables)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
