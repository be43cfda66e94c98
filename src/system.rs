use std::{f64::consts, fmt::Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
    Ln,
    Log2,
    Lg,
    Exp,
    Sqrt,
    Cbrt,
    Abs,
    Sign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFunction {
    Max,
    Min,
    Log,
    Pow,
    Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    Ln2,
    Ln10,
    Sqrt2,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" | "tg" => Function::Tan,
            "cot" | "ctg" => Function::Cot,
            "sinh" | "sh" => Function::Sinh,
            "cosh" | "ch" => Function::Cosh,
            "tanh" | "th" => Function::Tanh,
            "asin" | "arcsin" => Function::Asin,
            "acos" | "arccos" => Function::Acos,
            "atan" | "arctg" => Function::Atan,
            "ln" => Function::Ln,
            "log2" => Function::Log2,
            "lg" => Function::Lg,
            "exp" => Function::Exp,
            "sqrt" => Function::Sqrt,
            "cbrt" => Function::Cbrt,
            "abs" => Function::Abs,
            "sign" => Function::Sign,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Cot => "cot",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Ln => "ln",
            Function::Log2 => "log2",
            Function::Lg => "lg",
            Function::Exp => "exp",
            Function::Sqrt => "sqrt",
            Function::Cbrt => "cbrt",
            Function::Abs => "abs",
            Function::Sign => "sign",
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Cot => 1.0 / x.tan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Ln => x.ln(),
            Function::Log2 => x.log2(),
            Function::Lg => x.log10(),
            Function::Exp => x.exp(),
            Function::Sqrt => x.sqrt(),
            Function::Cbrt => x.cbrt(),
            Function::Abs => x.abs(),
            // f64::signum maps 0.0 to 1.0
            Function::Sign => {
                if x == 0.0 || x.is_nan() {
                    x
                } else {
                    x.signum()
                }
            }
        }
    }
}

impl BinaryFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "max" => BinaryFunction::Max,
            "min" => BinaryFunction::Min,
            "log" => BinaryFunction::Log,
            "pow" => BinaryFunction::Pow,
            "root" => BinaryFunction::Root,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryFunction::Max => "max",
            BinaryFunction::Min => "min",
            BinaryFunction::Log => "log",
            BinaryFunction::Pow => "pow",
            BinaryFunction::Root => "root",
        }
    }

    /// `x` is the first argument as written, `y` the second.
    pub fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            BinaryFunction::Max => x.max(y),
            BinaryFunction::Min => x.min(y),
            // log(base, value)
            BinaryFunction::Log => y.ln() / x.ln(),
            BinaryFunction::Pow => x.powf(y),
            // root(degree, value)
            BinaryFunction::Root => y.powf(1.0 / x),
        }
    }
}

impl Operator {
    pub fn from_symbol(c: char) -> Option<Self> {
        Some(match c {
            '+' => Operator::Plus,
            '-' => Operator::Minus,
            '*' => Operator::Star,
            '/' => Operator::Slash,
            '%' => Operator::Percent,
            '^' => Operator::Caret,
            _ => return None,
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Plus => '+',
            Operator::Minus => '-',
            Operator::Star => '*',
            Operator::Slash => '/',
            Operator::Percent => '%',
            Operator::Caret => '^',
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Operator::Caret => 3,
            Operator::Star | Operator::Slash | Operator::Percent => 2,
            Operator::Plus | Operator::Minus => 1,
        }
    }

    pub fn is_right_assoc(self) -> bool {
        self == Operator::Caret
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Plus => lhs + rhs,
            Operator::Minus => lhs - rhs,
            Operator::Star => lhs * rhs,
            Operator::Slash => lhs / rhs,
            Operator::Percent => lhs % rhs,
            Operator::Caret => lhs.powf(rhs),
        }
    }
}

impl Constant {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "pi" => Constant::Pi,
            "e" => Constant::E,
            "ln2" => Constant::Ln2,
            "ln10" => Constant::Ln10,
            "sqrt2" => Constant::Sqrt2,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
            Constant::Ln2 => "ln2",
            Constant::Ln10 => "ln10",
            Constant::Sqrt2 => "sqrt2",
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => consts::PI,
            Constant::E => consts::E,
            Constant::Ln2 => consts::LN_2,
            Constant::Ln10 => consts::LN_10,
            Constant::Sqrt2 => consts::SQRT_2,
        }
    }
}

pub fn is_function(name: &str) -> bool {
    Function::from_name(name).is_some()
}

pub fn is_binary_function(name: &str) -> bool {
    BinaryFunction::from_name(name).is_some()
}

pub fn is_operator(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Operator::from_symbol(c).is_some(),
        _ => false,
    }
}

pub fn is_constant(name: &str) -> bool {
    Constant::from_name(name).is_some()
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Display for BinaryFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
