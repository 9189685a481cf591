use std::fmt;
use thiserror::Error;

use crate::memory::Segment;
use crate::semantic::cube::Operator;
use crate::types::DataType;

/// Errors raised by engine actions.
///
/// Every recoverable variant halts compilation of the current unit; the
/// caller must stop issuing actions after the first one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("Repeated class name: {0}")]
    RepeatedClass(String),

    #[error("Undeclared class parent: {0}")]
    UndeclaredParent(String),

    #[error("{0} cannot inherit from itself")]
    CyclicInheritance(String),

    #[error("Redeclared function {0}")]
    RedeclaredFunction(String),

    #[error("{0} is not a class nor data type")]
    UnknownType(String),

    #[error("Redeclared variable: {0}")]
    RedeclaredVariable(String),

    #[error("Variable {0} cannot be declared void")]
    VoidVariable(String),

    #[error("Variable {0} not in scope.")]
    NotInScope(String),

    #[error("Variable {0} used before assignment")]
    UsedBeforeAssignment(String),

    #[error("Variable {0} has private access")]
    PrivateAccess(String),

    #[error("Type mismatch: Invalid operation {operator} on given operands ({left}, {right})")]
    OperatorMismatch {
        operator: Operator,
        left: DataType,
        right: DataType,
    },

    #[error("Type mismatch: expression cannot be assigned to {target}")]
    AssignmentMismatch {
        target: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Expression returns no value.")]
    NoValue,

    #[error("read can only be assigned to a variable")]
    ReadOutsideAssignment,

    #[error("Evaluated expression is not boolean")]
    NonBooleanCondition(DataType),

    #[error("{name} is of type {data_type} and not an instance.")]
    NotAnInstance { name: String, data_type: DataType },

    #[error("{0} not defined in scope.")]
    UndefinedFunction(String),

    #[error("{class} has no parent class but tries to extend {parent} in constructor")]
    NoParentClass { class: String, parent: String },

    #[error("{parent} is not {class}'s parent")]
    NotParentClass { class: String, parent: String },

    #[error("{function} expecting type {expected} for parameter {position}")]
    ArgumentMismatch {
        function: String,
        position: usize,
        expected: DataType,
        found: DataType,
    },

    #[error("{function} expects {expected} parameters, but more were given")]
    TooManyArguments { function: String, expected: usize },

    #[error("{function} expects {expected} parameters, but {given} were given")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        given: usize,
    },

    #[error("Void function cannot return a value")]
    ReturnFromVoid(String),

    #[error("Cannot return type {found} as {expected}")]
    ReturnMismatch { expected: DataType, found: DataType },

    #[error("address range exhausted for {data_type} in {segment} segment (limit {limit})")]
    AddressOverflow {
        segment: Segment,
        data_type: DataType,
        limit: u32,
    },

    #[error("internal compiler state error: {0}")]
    Internal(String),
}

/// Coarse classification of [`SemanticError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Declaration,
    UndeclaredReference,
    Access,
    Type,
    CallProtocol,
    Resource,
    Internal,
}

impl SemanticError {
    pub fn category(&self) -> ErrorCategory {
        use SemanticError::*;
        match self {
            RepeatedClass(_) | RedeclaredFunction(_) | RedeclaredVariable(_) | VoidVariable(_)
            | CyclicInheritance(_) => ErrorCategory::Declaration,
            UndeclaredParent(_) | UnknownType(_) | NotInScope(_) => {
                ErrorCategory::UndeclaredReference
            }
            PrivateAccess(_) => ErrorCategory::Access,
            UsedBeforeAssignment(_)
            | OperatorMismatch { .. }
            | AssignmentMismatch { .. }
            | NoValue
            | ReadOutsideAssignment
            | NonBooleanCondition(_)
            | NotAnInstance { .. } => ErrorCategory::Type,
            UndefinedFunction(_)
            | NoParentClass { .. }
            | NotParentClass { .. }
            | ArgumentMismatch { .. }
            | TooManyArguments { .. }
            | ArgumentCountMismatch { .. }
            | ReturnFromVoid(_)
            | ReturnMismatch { .. } => ErrorCategory::CallProtocol,
            AddressOverflow { .. } => ErrorCategory::Resource,
            Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Internal limits and broken action ordering, as opposed to errors in
    /// the compiled program.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Resource | ErrorCategory::Internal
        )
    }
}

pub fn internal_error(message: impl Into<String>) -> SemanticError {
    SemanticError::Internal(message.into())
}

pub type SemanticResult<T> = Result<T, SemanticError>;

#[derive(Error, Debug, Clone)]
pub enum QuadraError {
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Trace error at line {line}, column {column}: {message}")]
    Trace {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Semantic error at line {line}: {source}")]
    Semantic {
        line: usize,
        #[source]
        source: SemanticError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type QuadraResult<T> = Result<T, QuadraError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub fn lexer_error(line: usize, column: usize, message: impl Into<String>) -> QuadraError {
    QuadraError::Lexer {
        line,
        column,
        message: message.into(),
    }
}

pub fn trace_error(loc: SourceLocation, message: impl Into<String>) -> QuadraError {
    QuadraError::Trace {
        line: loc.line,
        column: loc.column,
        message: message.into(),
    }
}

pub fn semantic_error(line: usize, source: SemanticError) -> QuadraError {
    QuadraError::Semantic { line, source }
}
