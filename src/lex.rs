use std::fmt::Display;

use miette::{Diagnostic, Error, NamedSource, SourceSpan};
use thiserror::Error;

use crate::system::{BinaryFunction, Constant, Function, Operator};

#[derive(Error, Debug, Diagnostic)]
#[error("unknown characters in expression: `{unmatched}`")]
#[diagnostic(help("only numbers, names, `+ - * / % ^`, `,` and parentheses are allowed"))]
pub struct LexError {
    #[source_code]
    src: NamedSource<String>,

    #[label("not part of any lexeme")]
    bad_bit: SourceSpan,

    pub unmatched: String,
}

impl LexError {
    pub fn offset(&self) -> usize {
        self.bad_bit.offset()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

impl Token<'_> {
    pub fn span(&self) -> SourceSpan {
        SourceSpan::from(self.offset..self.offset + self.literal.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Constant(Constant),
    Function(Function),
    BinaryFunction(BinaryFunction),
    Ident,
    Operator(Operator),
    Comma,
    LeftParen,
    RightParen,
}

impl TokenKind {
    /// Words are classified in a fixed order: constant, function, binary
    /// function, and only then a free variable.
    fn from_word(word: &str) -> Self {
        if let Some(constant) = Constant::from_name(word) {
            TokenKind::Constant(constant)
        } else if let Some(function) = Function::from_name(word) {
            TokenKind::Function(function)
        } else if let Some(function) = BinaryFunction::from_name(word) {
            TokenKind::BinaryFunction(function)
        } else {
            TokenKind::Ident
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::Number(n) => write!(f, "NUMBER {lit} {n}"),
            TokenKind::Constant(c) => write!(f, "CONSTANT {lit} {}", c.value()),
            TokenKind::Function(_) => write!(f, "FUNCTION {lit}"),
            TokenKind::BinaryFunction(_) => write!(f, "BINARY_FUNCTION {lit}"),
            TokenKind::Ident => write!(f, "VARIABLE {lit}"),
            TokenKind::Operator(_) => write!(f, "OPERATOR {lit}"),
            TokenKind::Comma => write!(f, "COMMA {lit}"),
            TokenKind::LeftParen => write!(f, "LEFT_PAREN {lit}"),
            TokenKind::RightParen => write!(f, "RIGHT_PAREN {lit}"),
        }
    }
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
        }
    }

    pub fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.filename.unwrap_or("<expression>"), self.whole.to_string())
    }

    fn unmatched(&mut self, start: usize) -> Error {
        // swallow the whole run of garbage so the label covers all of it
        let run = self
            .rest
            .find(|c: char| c.is_whitespace() || starts_lexeme(c))
            .unwrap_or(self.rest.len());
        self.byte += run;
        self.rest = &self.rest[run..];

        LexError {
            src: self.source(),
            bad_bit: SourceSpan::from(start..self.byte),
            unmatched: self.whole[start..self.byte].to_string(),
        }
        .into()
    }
}

fn starts_lexeme(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '(' | ')' | ',') || Operator::from_symbol(c).is_some()
}

/// Splits `input` into lexemes, failing on the first unmatched character run.
pub fn tokenize<'de>(filename: Option<&'de str>, input: &'de str) -> Result<Vec<Token<'de>>, Error> {
    Lexer::new(filename, input).collect()
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let literal = &self.rest[..c.len_utf8()];
            let cur = self.rest;
            let offset = self.byte;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            enum Start {
                Word,
                Number,
            }

            let process = |kind: TokenKind| {
                Some(Ok(Token {
                    kind,
                    literal,
                    offset,
                }))
            };

            let started = match c {
                '(' => return process(TokenKind::LeftParen),
                ')' => return process(TokenKind::RightParen),
                ',' => return process(TokenKind::Comma),
                'a'..='z' => Start::Word,
                '0'..='9' => Start::Number,
                c if c.is_whitespace() => continue,
                c => match Operator::from_symbol(c) {
                    Some(op) => return process(TokenKind::Operator(op)),
                    None => return Some(Err(self.unmatched(offset))),
                },
            };

            let len = match started {
                Start::Word => cur
                    .find(|c| !matches!(c, 'a'..='z' | '0'..='9'))
                    .unwrap_or(cur.len()),
                Start::Number => {
                    let integer = cur
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(cur.len());
                    let fraction = cur[integer..]
                        .strip_prefix('.')
                        .map(|after| {
                            after
                                .find(|c: char| !c.is_ascii_digit())
                                .unwrap_or(after.len())
                        })
                        .unwrap_or(0);
                    // a dot only belongs to the number when digits follow it
                    if fraction > 0 {
                        integer + 1 + fraction
                    } else {
                        integer
                    }
                }
            };

            let literal = &cur[..len];
            let extra_bytes = literal.len() - c.len_utf8();
            self.byte += extra_bytes;
            self.rest = &self.rest[extra_bytes..];

            let kind = match started {
                Start::Word => TokenKind::from_word(literal),
                // digits with an optional `.digits` tail always parse
                Start::Number => TokenKind::Number(literal.parse().unwrap_or(f64::NAN)),
            };

            return Some(Ok(Token {
                kind,
                literal,
                offset,
            }));
        }
    }
}
