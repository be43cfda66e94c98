use std::fmt::Display;

use log::{debug, trace};
use miette::{Diagnostic, Error, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
    eval::Variables,
    lex::{Token, TokenKind, tokenize},
    system::{BinaryFunction, Constant, Function, Operator},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    #[error("brackets are disbalanced")]
    DisbalancedBrackets,
    #[error("comma outside of a function call")]
    StrayComma,
}

#[derive(Error, Debug, Diagnostic)]
#[error("incorrect expression: {kind}")]
pub struct SyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    bad_bit: SourceSpan,

    #[help]
    help: Option<String>,

    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn offset(&self) -> usize {
        self.bad_bit.offset()
    }
}

/// One element of the postfix program. Order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RpnToken {
    Number(f64),
    Constant(Constant),
    /// Slot in the [`Variables`] table.
    Variable(usize),
    Operator(Operator),
    UnaryMinus,
    Function(Function),
    BinaryFunction(BinaryFunction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub rpn: Vec<RpnToken>,
    pub variables: Variables,
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        DisplayRpn(&self.rpn, &self.variables).fmt(f)
    }
}

/// Space separated postfix form, unary minus written as `!`.
pub struct DisplayRpn<'a>(pub &'a [RpnToken], pub &'a Variables);

impl Display for DisplayRpn<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match token {
                RpnToken::Number(n) => write!(f, "{n}")?,
                RpnToken::Constant(c) => write!(f, "{c}")?,
                RpnToken::Variable(slot) => write!(f, "{}", self.1.name(*slot).unwrap_or("?"))?,
                RpnToken::Operator(op) => write!(f, "{op}")?,
                RpnToken::UnaryMinus => write!(f, "!")?,
                RpnToken::Function(function) => write!(f, "{function}")?,
                RpnToken::BinaryFunction(function) => write!(f, "{function}")?,
            }
        }
        Ok(())
    }
}

/// Operator stack entry.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Operator(Operator),
    UnaryMinus,
    Function(Function),
    BinaryFunction(BinaryFunction),
    LeftParen,
}

impl Pending {
    fn precedence(self) -> u8 {
        match self {
            Pending::Function(_) | Pending::BinaryFunction(_) => 4,
            Pending::UnaryMinus => 3,
            Pending::Operator(op) => op.precedence(),
            Pending::LeftParen => 0,
        }
    }

    /// Whether `top` has to leave the stack before `self` is pushed. `^` and
    /// unary minus only give way to strictly tighter entries.
    fn yields_to(self, top: Pending) -> bool {
        match self {
            Pending::UnaryMinus => top.precedence() > self.precedence(),
            Pending::Operator(op) if op.is_right_assoc() => top.precedence() > self.precedence(),
            _ => top.precedence() >= self.precedence(),
        }
    }

    fn into_rpn(self) -> Option<RpnToken> {
        Some(match self {
            Pending::Operator(op) => RpnToken::Operator(op),
            Pending::UnaryMinus => RpnToken::UnaryMinus,
            Pending::Function(function) => RpnToken::Function(function),
            Pending::BinaryFunction(function) => RpnToken::BinaryFunction(function),
            Pending::LeftParen => return None,
        })
    }
}

pub struct Parser<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    output: Vec<RpnToken>,
    stack: Vec<(Pending, Token<'de>)>,
    variables: Variables,
    may_unary: bool,
}

impl<'de> Parser<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str) -> Self {
        Parser {
            filename,
            whole,
            output: Vec::new(),
            stack: Vec::new(),
            variables: Variables::default(),
            may_unary: true,
        }
    }

    /// Lexes the whole input and converts it to postfix.
    pub fn parse(self) -> Result<Program, Error> {
        let tokens = tokenize(self.filename, self.whole)?;
        debug!("lexed {} lexemes from `{}`", tokens.len(), self.whole);
        self.convert(&tokens)
    }

    pub fn convert(mut self, tokens: &[Token<'de>]) -> Result<Program, Error> {
        for &token in tokens {
            trace!("lexeme `{}`, may_unary = {}", token.literal, self.may_unary);
            match token.kind {
                TokenKind::Number(n) => {
                    self.output.push(RpnToken::Number(n));
                    self.may_unary = false;
                }
                TokenKind::Constant(constant) => {
                    self.output.push(RpnToken::Constant(constant));
                    self.may_unary = false;
                }
                TokenKind::Function(function) => {
                    self.stack.push((Pending::Function(function), token));
                    self.may_unary = true;
                }
                TokenKind::BinaryFunction(function) => {
                    self.stack.push((Pending::BinaryFunction(function), token));
                    self.may_unary = true;
                }
                TokenKind::Ident => {
                    let slot = self.variables.insert(token.literal);
                    self.output.push(RpnToken::Variable(slot));
                    self.may_unary = false;
                }
                TokenKind::Comma => {
                    if !self.pop_until_paren() {
                        return Err(self.error(
                            SyntaxErrorKind::StrayComma,
                            token.span(),
                            "wrap the arguments in a binary function such as `max(a, b)`",
                        ));
                    }
                    self.may_unary = true;
                }
                TokenKind::Operator(op) => {
                    let current = if op == Operator::Minus && self.may_unary {
                        Pending::UnaryMinus
                    } else {
                        Pending::Operator(op)
                    };
                    while let Some(&(top, _)) = self.stack.last() {
                        if !current.yields_to(top) {
                            break;
                        }
                        self.pop_to_output();
                    }
                    self.stack.push((current, token));
                    self.may_unary = op == Operator::Caret;
                }
                TokenKind::LeftParen => {
                    self.stack.push((Pending::LeftParen, token));
                    self.may_unary = true;
                }
                TokenKind::RightParen => {
                    if !self.pop_until_paren() {
                        return Err(self.error(
                            SyntaxErrorKind::DisbalancedBrackets,
                            token.span(),
                            "this bracket closes nothing",
                        ));
                    }
                    self.stack.pop();
                    if let Some((Pending::Function(_), _)) = self.stack.last() {
                        self.pop_to_output();
                    }
                    self.may_unary = false;
                }
            }
        }

        while let Some((pending, token)) = self.stack.pop() {
            match pending.into_rpn() {
                Some(rpn) => self.output.push(rpn),
                None => {
                    return Err(self.error(
                        SyntaxErrorKind::DisbalancedBrackets,
                        token.span(),
                        "this bracket is never closed",
                    ));
                }
            }
        }

        let program = Program {
            rpn: self.output,
            variables: self.variables,
        };
        debug!("rpn: {program}");
        Ok(program)
    }

    /// Moves entries to the output up to the nearest open paren, which stays
    /// on the stack. Returns `false` when there is no open paren.
    fn pop_until_paren(&mut self) -> bool {
        loop {
            match self.stack.last() {
                None => return false,
                Some((Pending::LeftParen, _)) => return true,
                Some(_) => self.pop_to_output(),
            }
        }
    }

    fn pop_to_output(&mut self) {
        if let Some(rpn) = self.stack.pop().and_then(|(pending, _)| pending.into_rpn()) {
            self.output.push(rpn);
        }
    }

    fn error(&self, kind: SyntaxErrorKind, span: SourceSpan, help: &str) -> Error {
        SyntaxError {
            src: NamedSource::new(self.filename.unwrap_or("<expression>"), self.whole.to_string()),
            bad_bit: span,
            help: Some(help.to_string()),
            kind,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postfix(input: &str) -> String {
        Parser::new(None, input).parse().unwrap().to_string()
    }

    fn syntax_error(input: &str) -> SyntaxErrorKind {
        let err = Parser::new(None, input).parse().unwrap_err();
        err.downcast_ref::<SyntaxError>()
            .expect("syntax error")
            .kind
            .clone()
    }

    #[test]
    fn left_associative_chain() {
        assert_eq!(postfix("1+2+3+4"), "1 2 + 3 + 4 +");
        assert_eq!(postfix("8-3-2"), "8 3 - 2 -");
    }

    #[test]
    fn precedence() {
        assert_eq!(postfix("1+2*3"), "1 2 3 * +");
        assert_eq!(postfix("(1+2)*(3+4)"), "1 2 + 3 4 + *");
        assert_eq!(postfix("7%4/2"), "7 4 % 2 /");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(postfix("2^2^3"), "2 2 3 ^ ^");
        assert_eq!(postfix("(2^2)^3"), "2 2 ^ 3 ^");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(postfix("4^-2"), "4 2 ! ^");
        assert_eq!(postfix("-1^2"), "1 2 ^ !");
        assert_eq!(postfix("(-1)^2"), "1 ! 2 ^");
        assert_eq!(postfix("2^-2^2"), "2 2 2 ^ ! ^");
        assert_eq!(postfix("-x - 1"), "x ! 1 -");
    }

    #[test]
    fn functions_attach_to_their_group() {
        assert_eq!(postfix("sqrt(x)+1"), "x sqrt 1 +");
        assert_eq!(postfix("sin(cos(pi))"), "pi cos sin");
        assert_eq!(postfix("max(6, 8)"), "6 8 max");
        assert_eq!(postfix("log(2, 8) * 2"), "2 8 log 2 *");
    }

    #[test]
    fn unary_minus_after_comma() {
        assert_eq!(postfix("min(1, -2)"), "1 2 ! min");
    }

    #[test]
    fn variables_are_discovered_once() {
        let program = Parser::new(None, "x + y * x").parse().unwrap();
        let names: Vec<_> = program.variables.names().collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(
            program.rpn,
            [
                RpnToken::Variable(0),
                RpnToken::Variable(1),
                RpnToken::Variable(0),
                RpnToken::Operator(Operator::Star),
                RpnToken::Operator(Operator::Plus),
            ]
        );
    }

    #[test]
    fn unclosed_paren() {
        assert_eq!(syntax_error("(1+2"), SyntaxErrorKind::DisbalancedBrackets);
        assert_eq!(syntax_error("sin(1"), SyntaxErrorKind::DisbalancedBrackets);
    }

    #[test]
    fn unopened_paren() {
        assert_eq!(syntax_error("1+2)"), SyntaxErrorKind::DisbalancedBrackets);
        let err = Parser::new(None, "(1))").parse().unwrap_err();
        assert_eq!(err.downcast_ref::<SyntaxError>().unwrap().offset(), 3);
    }

    #[test]
    fn stray_comma() {
        assert_eq!(syntax_error("1,2"), SyntaxErrorKind::StrayComma);
    }

    #[test]
    fn lex_errors_pass_through() {
        let err = Parser::new(None, "2 & 3").parse().unwrap_err();
        assert!(err.downcast_ref::<crate::lex::LexError>().is_some());
    }
}
