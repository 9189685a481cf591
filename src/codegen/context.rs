//! Quadruple generator state.

use super::calls::CallFrame;
use super::operand::{ConstantPool, Operand};
use super::quadruple::{OpCode, Quadruple, Slot};
use crate::config::AddressLayout;
use crate::error::{SemanticResult, internal_error};
use crate::semantic::{Operator, SemanticAnalyzer, SymbolTable};
use crate::types::{Access, DataType};

/// Compilation context for one unit.
///
/// The parser drives it by calling one action per recognized construct, in
/// source order. After any action returns an error the context is no longer
/// consistent and must be discarded.
pub struct QuadGenerator {
    pub(super) analyzer: SemanticAnalyzer,
    pub(super) quadruples: Vec<Quadruple>,
    pub(super) operators: Vec<Operator>,
    pub(super) operands: Vec<Operand>,
    /// Pending `gotof`/`goto` indices and loop re-test points.
    pub(super) jumps: Vec<usize>,
    /// `goto` instructions emitted by `return` in the current function.
    pub(super) pending_returns: Vec<usize>,
    pub(super) constants: ConstantPool,
    pub(super) calls: Vec<CallFrame>,
    /// Class selected by `switch_instance` for the next member access.
    pub(super) dispatch_class: Option<String>,
}

impl QuadGenerator {
    pub fn new() -> Self {
        Self::with_layout(AddressLayout::default())
    }

    pub fn with_layout(layout: AddressLayout) -> Self {
        let constants = ConstantPool::new(&layout);
        Self {
            analyzer: SemanticAnalyzer::new(layout),
            // Entry jump, patched by `program_entry_mark`.
            quadruples: vec![Quadruple::new(
                OpCode::Goto,
                Slot::Empty,
                Slot::Empty,
                Slot::Pending,
            )],
            operators: Vec::new(),
            operands: Vec::new(),
            jumps: Vec::new(),
            pending_returns: Vec::new(),
            constants,
            calls: Vec::new(),
            dispatch_class: None,
        }
    }

    pub fn quadruples(&self) -> &[Quadruple] {
        &self.quadruples
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.analyzer.symbols()
    }

    pub fn analyzer(&self) -> &SemanticAnalyzer {
        &self.analyzer
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    /// Operand on top of the evaluation stack.
    pub fn peek_operand(&self) -> Option<&Operand> {
        self.operands.last()
    }

    /// Index the next emitted quadruple will receive.
    pub fn next_index(&self) -> usize {
        self.quadruples.len()
    }

    pub(super) fn emit(&mut self, op: OpCode, left: Slot, right: Slot, result: Slot) -> usize {
        let index = self.quadruples.len();
        let quad = Quadruple::new(op, left, right, result);
        log::debug!("{:>4}: {}", index, quad);
        self.quadruples.push(quad);
        index
    }

    /// Writes the target of a pending jump.
    pub(super) fn patch(&mut self, index: usize, target: usize) -> SemanticResult<()> {
        let quad = self
            .quadruples
            .get_mut(index)
            .ok_or_else(|| internal_error(format!("no instruction {} to patch", index)))?;
        if !quad.op.is_jump() || quad.result != Slot::Pending {
            return Err(internal_error(format!(
                "instruction {} {} is not a pending jump",
                index, quad
            )));
        }
        quad.result = Slot::Target(target);
        log::debug!("patched {} -> {}", index, target);
        Ok(())
    }

    pub(super) fn pop_operand(&mut self) -> SemanticResult<Operand> {
        self.operands
            .pop()
            .ok_or_else(|| internal_error("operand stack is empty"))
    }

    pub(super) fn pop_jump(&mut self) -> SemanticResult<usize> {
        self.jumps
            .pop()
            .ok_or_else(|| internal_error("jump stack is empty"))
    }

    pub(super) fn temporary(&mut self, data_type: DataType) -> SemanticResult<Operand> {
        let address = self.analyzer.allocate_temporary(&data_type)?;
        Ok(Operand::temporary(data_type, address))
    }

    // Declaration actions.

    pub fn declare_class(&mut self, name: &str) -> SemanticResult<()> {
        self.analyzer.declare_class(name)
    }

    pub fn set_parent(&mut self, parent: &str) -> SemanticResult<()> {
        self.analyzer.set_parent(parent)
    }

    pub fn finish_class(&mut self) -> SemanticResult<()> {
        self.analyzer.finish_class()
    }

    pub fn declare_function(&mut self, name: &str) -> SemanticResult<()> {
        self.pending_returns.clear();
        self.analyzer.declare_function(name)
    }

    pub fn set_access(&mut self, access: Access) -> SemanticResult<()> {
        self.analyzer.set_access(access);
        Ok(())
    }

    pub fn declare_type(&mut self, name: &str) -> SemanticResult<()> {
        self.analyzer.declare_type(name)
    }

    pub fn declare_variable(&mut self, name: &str) -> SemanticResult<()> {
        self.analyzer.declare_variable(name)
    }

    pub fn enter_parameter_list(&mut self) -> SemanticResult<()> {
        self.analyzer.enter_parameter_list();
        Ok(())
    }

    pub fn exit_parameter_list(&mut self) -> SemanticResult<()> {
        self.analyzer.exit_parameter_list()
    }
}

impl Default for QuadGenerator {
    fn default() -> Self {
        Self::new()
    }
}
