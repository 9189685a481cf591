//! Operators and the semantic cube.

use std::fmt;

use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Equal,
    NotEqual,
    And,
    Or,
    Assign,
    /// Sentinel delimiting a parenthesized sub-expression or an argument.
    FakeBottom,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        let op = match symbol {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Times,
            "/" => Operator::Divide,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            "<=" => Operator::LessEq,
            ">=" => Operator::GreaterEq,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "&&" | "and" => Operator::And,
            "||" | "or" => Operator::Or,
            "=" => Operator::Assign,
            "(" => Operator::FakeBottom,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Times => "*",
            Operator::Divide => "/",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEq => "<=",
            Operator::GreaterEq => ">=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Assign => "=",
            Operator::FakeBottom => "(",
        }
    }

    fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Operator::Plus | Operator::Minus | Operator::Times | Operator::Divide
        )
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Less | Operator::Greater | Operator::LessEq | Operator::GreaterEq
        )
    }

    fn is_equality(self) -> bool {
        matches!(self, Operator::Equal | Operator::NotEqual)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Precedence classes the parser reduces one at a time, tightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Multiplicative,
    Additive,
    Relational,
    Logical,
}

impl OperatorClass {
    pub fn from_name(name: &str) -> Option<OperatorClass> {
        match name {
            "multiplicative" => Some(OperatorClass::Multiplicative),
            "additive" => Some(OperatorClass::Additive),
            "relational" => Some(OperatorClass::Relational),
            "logical" => Some(OperatorClass::Logical),
            _ => None,
        }
    }

    pub fn operators(self) -> &'static [Operator] {
        match self {
            OperatorClass::Multiplicative => &[Operator::Times, Operator::Divide],
            OperatorClass::Additive => &[Operator::Plus, Operator::Minus],
            OperatorClass::Relational => &[
                Operator::Less,
                Operator::Greater,
                Operator::LessEq,
                Operator::GreaterEq,
                Operator::Equal,
                Operator::NotEqual,
            ],
            OperatorClass::Logical => &[Operator::And, Operator::Or],
        }
    }
}

/// Result type of `left <operator> right`, or `None` when the combination is
/// illegal. For [`Operator::Assign`], `left` is the target and `right` the
/// assigned value.
pub fn semantic_cube(left: &DataType, right: &DataType, operator: Operator) -> Option<DataType> {
    use DataType::*;

    if operator == Operator::Assign {
        return match (left, right) {
            (Int, Int) | (Float, Float) | (Bool, Bool) | (Char, Char) => Some(left.clone()),
            (Float, Int) => Some(Float),
            (target, Read) if target.is_primitive() => Some(target.clone()),
            (Class(a), Class(b)) if a == b => Some(left.clone()),
            _ => None,
        };
    }

    match (left, right) {
        (Int, Int) if operator.is_arithmetic() => Some(Int),
        (Int, Float) | (Float, Int) | (Float, Float) if operator.is_arithmetic() => Some(Float),
        (Int | Float, Int | Float) if operator.is_ordering() || operator.is_equality() => {
            Some(Bool)
        }
        (Char, Char) if operator.is_ordering() || operator.is_equality() => Some(Bool),
        (Bool, Bool) if operator.is_equality() => Some(Bool),
        (Bool, Bool) if matches!(operator, Operator::And | Operator::Or) => Some(Bool),
        _ => None,
    }
}
