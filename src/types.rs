use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};

/// Type of a value, variable or function result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Bool,
    Char,
    /// String literals; only valid as `write` arguments.
    Str,
    /// Pending console input, produced by `read` and consumed by assignment.
    Read,
    Void,
    Class(String),
}

impl DataType {
    /// Primitive or `void` type named by a declaration keyword.
    pub fn from_keyword(name: &str) -> Option<DataType> {
        match name {
            "int" => Some(DataType::Int),
            "float" => Some(DataType::Float),
            "bool" => Some(DataType::Bool),
            "char" => Some(DataType::Char),
            "void" => Some(DataType::Void),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DataType::Int | DataType::Float | DataType::Bool | DataType::Char
        )
    }

    pub fn is_class(&self) -> bool {
        matches!(self, DataType::Class(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            DataType::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Bool => write!(f, "bool"),
            DataType::Char => write!(f, "char"),
            DataType::Str => write!(f, "string"),
            DataType::Read => write!(f, "read"),
            DataType::Void => write!(f, "void"),
            DataType::Class(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Private,
}

impl Access {
    pub fn from_keyword(name: &str) -> Option<Access> {
        match name {
            "public" => Some(Access::Public),
            "private" => Some(Access::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Private => write!(f, "private"),
        }
    }
}

/// Literal value, classified by the front end before it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    Char(char),
    Str(String),
}

impl Literal {
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Int(_) => DataType::Int,
            Literal::Float(_) => DataType::Float,
            Literal::Bool(_) => DataType::Bool,
            Literal::Char(_) => DataType::Char,
            Literal::Str(_) => DataType::Str,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v.into_inner()),
            Literal::Bool(v) => write!(f, "{}", v),
            Literal::Char(c) => write!(f, "'{}'", c),
            Literal::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(OrderedFloat(value))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<char> for Literal {
    fn from(value: char) -> Self {
        Literal::Char(value)
    }
}

/// Token the parser pushes as an operand.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandToken {
    Literal(Literal),
    Identifier(String),
}

impl OperandToken {
    pub fn ident(name: impl Into<String>) -> Self {
        OperandToken::Identifier(name.into())
    }
}

impl From<Literal> for OperandToken {
    fn from(value: Literal) -> Self {
        OperandToken::Literal(value)
    }
}

macro_rules! literal_operand {
    ($($ty:ty),*) => {
        $(impl From<$ty> for OperandToken {
            fn from(value: $ty) -> Self {
                OperandToken::Literal(Literal::from(value))
            }
        })*
    };
}

literal_operand!(i64, f64, bool, char);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_primitives() {
        assert_eq!(DataType::from_keyword("int"), Some(DataType::Int));
        assert_eq!(DataType::from_keyword("void"), Some(DataType::Void));
        assert_eq!(DataType::from_keyword("Point"), None);
        assert!(!DataType::Void.is_primitive());
        assert!(DataType::Class("Point".into()).is_class());
    }

    #[test]
    fn float_literals_are_hashable_and_distinct_from_ints() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        seen.insert(Literal::from(1i64));
        seen.insert(Literal::from(1.0));
        seen.insert(Literal::from(true));
        assert_eq!(seen.len(), 3);
        assert_eq!(Literal::from(2.5).to_string(), "2.5");
        assert_eq!(Literal::from('a').to_string(), "'a'");
    }
}
