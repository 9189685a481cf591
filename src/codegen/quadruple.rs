//! Quadruple instructions.

use std::fmt;

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::memory::Address;
use crate::semantic::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Goto,
    Gotof,
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
    Write,
    Read,
    Era,
    Param,
    Gosub,
    Return,
    GetReturn,
    EndProc,
    End,
    SwitchInstance,
    ExitInstances,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Goto => "goto",
            OpCode::Gotof => "gotof",
            OpCode::Plus => "+",
            OpCode::Minus => "-",
            OpCode::Times => "*",
            OpCode::Divide => "/",
            OpCode::Less => "<",
            OpCode::Greater => ">",
            OpCode::LessEq => "<=",
            OpCode::GreaterEq => ">=",
            OpCode::Equal => "==",
            OpCode::NotEqual => "!=",
            OpCode::And => "&&",
            OpCode::Or => "||",
            OpCode::Assign => "=",
            OpCode::Write => "write",
            OpCode::Read => "read",
            OpCode::Era => "era",
            OpCode::Param => "param",
            OpCode::Gosub => "gosub",
            OpCode::Return => "return",
            OpCode::GetReturn => "get_return",
            OpCode::EndProc => "endproc",
            OpCode::End => "end",
            OpCode::SwitchInstance => "switch_instance",
            OpCode::ExitInstances => "exit_instances",
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, OpCode::Goto | OpCode::Gotof)
    }

    /// Op code of a binary operator; `None` for the fake bottom.
    pub fn from_operator(operator: Operator) -> Option<OpCode> {
        let op = match operator {
            Operator::Plus => OpCode::Plus,
            Operator::Minus => OpCode::Minus,
            Operator::Times => OpCode::Times,
            Operator::Divide => OpCode::Divide,
            Operator::Less => OpCode::Less,
            Operator::Greater => OpCode::Greater,
            Operator::LessEq => OpCode::LessEq,
            Operator::GreaterEq => OpCode::GreaterEq,
            Operator::Equal => OpCode::Equal,
            Operator::NotEqual => OpCode::NotEqual,
            Operator::And => OpCode::And,
            Operator::Or => OpCode::Or,
            Operator::Assign => OpCode::Assign,
            Operator::FakeBottom => return None,
        };
        Some(op)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for OpCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One operand field of a quadruple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Empty,
    /// Jump target not known yet; patched exactly once.
    Pending,
    Address(Address),
    Target(usize),
    Size(usize),
    Position(usize),
    Name(String),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Empty => write!(f, "_"),
            Slot::Pending => write!(f, "?"),
            Slot::Address(address) => write!(f, "{}", address),
            Slot::Target(index) | Slot::Size(index) | Slot::Position(index) => {
                write!(f, "{}", index)
            }
            Slot::Name(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Empty | Slot::Pending => serializer.serialize_none(),
            Slot::Address(address) => serializer.serialize_u32(*address),
            Slot::Target(n) | Slot::Size(n) | Slot::Position(n) => serializer.serialize_u64(*n as u64),
            Slot::Name(name) => serializer.serialize_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadruple {
    pub op: OpCode,
    pub left: Slot,
    pub right: Slot,
    pub result: Slot,
}

impl Quadruple {
    pub fn new(op: OpCode, left: Slot, right: Slot, result: Slot) -> Self {
        Self {
            op,
            left,
            right,
            result,
        }
    }

    /// Resolved jump target, if this is a patched jump.
    pub fn target(&self) -> Option<usize> {
        match (self.op.is_jump(), &self.result) {
            (true, Slot::Target(index)) => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.op, self.left, self.right, self.result
        )
    }
}

impl Serialize for Quadruple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.op)?;
        tuple.serialize_element(&self.left)?;
        tuple.serialize_element(&self.right)?;
        tuple.serialize_element(&self.result)?;
        tuple.end()
    }
}
