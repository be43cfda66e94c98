use log::trace;
use miette::{Diagnostic, Error};
use thiserror::Error;

use crate::parse::RpnToken;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    #[error("unable to evaluate `{0}`: not enough operands")]
    MissingOperands(String),
    #[error("{0} values left on the stack instead of one")]
    UnbalancedStack(usize),
    #[error("variable `{0}` was never given a value")]
    UnboundVariable(String),
    #[error("variable slot {0} is not in the binding table")]
    UnknownSlot(usize),
}

#[derive(Error, Debug, Diagnostic)]
#[error("incorrect expression: {kind}")]
#[diagnostic(help("check that every operator and function has all of its arguments"))]
pub struct EvalError {
    pub kind: EvalErrorKind,
}

fn fail(kind: EvalErrorKind) -> Error {
    EvalError { kind }.into()
}

#[derive(Error, Debug, Diagnostic)]
#[error("unknown variable `{name}`")]
pub struct UnknownVariableError {
    pub name: String,

    #[help]
    help: String,
}

/// Name to value bindings. Slots are handed out in order of first
/// appearance and never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    names: Vec<String>,
    values: Vec<f64>,
    bound: Vec<bool>,
}

impl Variables {
    /// Returns the slot for `name`, adding it with the value `0.0` if new.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(slot) = self.slot(name) {
            return slot;
        }
        self.names.push(name.to_string());
        self.values.push(0.0);
        self.bound.push(false);
        self.names.len() - 1
    }

    pub fn slot(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn name(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn get(&self, slot: usize) -> Option<f64> {
        self.values.get(slot).copied()
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<(), Error> {
        let Some(slot) = self.slot(name) else {
            let help = if self.names.is_empty() {
                "this expression has no variables".to_string()
            } else {
                format!("known variables: {}", self.names.join(", "))
            };
            return Err(UnknownVariableError {
                name: name.to_string(),
                help,
            }
            .into());
        };
        self.values[slot] = value;
        self.bound[slot] = true;
        Ok(())
    }

    pub fn is_bound(&self, slot: usize) -> bool {
        self.bound.get(slot).copied().unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names that still hold their default value because nobody set them.
    pub fn unbound(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .zip(&self.bound)
            .filter(|(_, bound)| !**bound)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Default)]
struct Operands {
    values: Vec<f64>,
}

impl Operands {
    fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    fn pop(&mut self, what: impl ToString) -> Result<f64, Error> {
        self.values
            .pop()
            .ok_or_else(|| fail(EvalErrorKind::MissingOperands(what.to_string())))
    }

    /// Pops the two topmost values as `(earlier, later)`.
    fn pop_pair(&mut self, what: impl ToString) -> Result<(f64, f64), Error> {
        if self.values.len() < 2 {
            return Err(fail(EvalErrorKind::MissingOperands(what.to_string())));
        }
        let rhs = self.pop("")?;
        let lhs = self.pop("")?;
        Ok((lhs, rhs))
    }
}

/// Runs the postfix program against the current bindings.
pub fn evaluate(rpn: &[RpnToken], variables: &Variables) -> Result<f64, Error> {
    let mut stack = Operands::default();

    for token in rpn {
        let value = match *token {
            RpnToken::Number(n) => n,
            RpnToken::Constant(constant) => constant.value(),
            RpnToken::Variable(slot) => variables
                .get(slot)
                .ok_or_else(|| fail(EvalErrorKind::UnknownSlot(slot)))?,
            RpnToken::Operator(op) => {
                let (lhs, rhs) = stack.pop_pair(op)?;
                op.apply(lhs, rhs)
            }
            RpnToken::UnaryMinus => -stack.pop("unary minus")?,
            RpnToken::Function(function) => function.apply(stack.pop(function)?),
            RpnToken::BinaryFunction(function) => {
                let (first, second) = stack.pop_pair(function)?;
                function.apply(first, second)
            }
        };
        trace!("{token:?} -> {value}");
        stack.push(value);
    }

    match stack.values.as_slice() {
        [value] => Ok(*value),
        values => Err(fail(EvalErrorKind::UnbalancedStack(values.len()))),
    }
}

/// Like [`evaluate`], but refuses to read a variable nobody has set.
pub fn evaluate_strict(rpn: &[RpnToken], variables: &Variables) -> Result<f64, Error> {
    for token in rpn {
        if let RpnToken::Variable(slot) = *token {
            if !variables.is_bound(slot) {
                let name = variables.name(slot).unwrap_or("?").to_string();
                return Err(fail(EvalErrorKind::UnboundVariable(name)));
            }
        }
    }
    evaluate(rpn, variables)
}
