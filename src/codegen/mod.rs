//! Quadruple generation.
//!
//! [`QuadGenerator`] receives parser actions in source order, checks them
//! against the symbol table and semantic cube, and appends quadruples.
//! Split by concern into expression, statement and call-protocol actions.

pub mod calls;
pub mod context;
pub mod operand;
pub mod output;
pub mod quadruple;
mod expressions;
mod statements;

pub use calls::{CallFrame, CallKind};
pub use context::QuadGenerator;
pub use operand::{ConstantPool, Operand};
pub use output::{ClassSummary, FunctionSummary, ProgramArtifact, VariableSummary};
pub use quadruple::{OpCode, Quadruple, Slot};
