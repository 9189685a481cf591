//! Statements: console I/O, conditionals, loops, function bodies, returns.

use super::context::QuadGenerator;
use super::operand::Operand;
use super::quadruple::{OpCode, Slot};
use crate::error::{SemanticError, SemanticResult, internal_error};
use crate::types::{DataType, Literal};

impl QuadGenerator {
    /// `write` of a string literal, or of the expression on top of the stack.
    pub fn write(&mut self, text: Option<&str>) -> SemanticResult<()> {
        let slot = match text {
            Some(text) => {
                let address = self.constants.intern(&Literal::Str(text.to_string()))?;
                Slot::Address(address)
            }
            None => {
                let value = self.pop_operand()?;
                match value.data_type {
                    DataType::Void => return Err(SemanticError::NoValue),
                    DataType::Read => return Err(SemanticError::ReadOutsideAssignment),
                    _ => value.slot(),
                }
            }
        };
        self.emit(OpCode::Write, Slot::Empty, Slot::Empty, slot);
        Ok(())
    }

    /// Pushes pending console input; the following assignment emits `read`.
    pub fn read(&mut self) -> SemanticResult<()> {
        self.operands.push(Operand::read());
        Ok(())
    }

    pub fn if_test(&mut self) -> SemanticResult<()> {
        let condition = self.pop_operand()?;
        if condition.data_type != DataType::Bool {
            return Err(SemanticError::NonBooleanCondition(condition.data_type));
        }
        let index = self.emit(OpCode::Gotof, condition.slot(), Slot::Empty, Slot::Pending);
        self.jumps.push(index);
        Ok(())
    }

    pub fn else_branch(&mut self) -> SemanticResult<()> {
        let false_jump = self.pop_jump()?;
        let exit = self.emit(OpCode::Goto, Slot::Empty, Slot::Empty, Slot::Pending);
        self.patch(false_jump, self.next_index())?;
        self.jumps.push(exit);
        Ok(())
    }

    pub fn end_if(&mut self) -> SemanticResult<()> {
        let pending = self.pop_jump()?;
        self.patch(pending, self.next_index())
    }

    /// Records the loop's re-test point before its condition is evaluated.
    pub fn while_header(&mut self) -> SemanticResult<()> {
        self.jumps.push(self.next_index());
        Ok(())
    }

    pub fn end_while(&mut self) -> SemanticResult<()> {
        let false_jump = self.pop_jump()?;
        let header = self.pop_jump()?;
        self.emit(OpCode::Goto, Slot::Empty, Slot::Empty, Slot::Target(header));
        self.patch(false_jump, self.next_index())
    }

    pub fn function_body_begin(&mut self) -> SemanticResult<()> {
        let start = self.next_index();
        self.analyzer.mark_function_start(start)
    }

    /// Points the initial jump at the program's entry instruction.
    pub fn program_entry_mark(&mut self) -> SemanticResult<()> {
        self.patch(0, self.next_index())
    }

    pub fn function_end(&mut self, is_main: bool) -> SemanticResult<()> {
        if !self.operators.is_empty()
            || !self.operands.is_empty()
            || !self.jumps.is_empty()
            || !self.calls.is_empty()
        {
            return Err(internal_error(format!(
                "function {} ended with {} operators, {} operands, {} jumps, {} calls pending",
                self.analyzer.current_function(),
                self.operators.len(),
                self.operands.len(),
                self.jumps.len(),
                self.calls.len()
            )));
        }
        let epilogue = self.next_index();
        for index in std::mem::take(&mut self.pending_returns) {
            self.patch(index, epilogue)?;
        }
        let op = if is_main { OpCode::End } else { OpCode::EndProc };
        self.emit(op, Slot::Empty, Slot::Empty, Slot::Empty);
        self.analyzer.close_function_scope();
        Ok(())
    }

    pub fn return_statement(&mut self) -> SemanticResult<()> {
        let function = self.analyzer.current_function_entry()?;
        let expected = function.return_type.clone();
        if expected == DataType::Void {
            return Err(SemanticError::ReturnFromVoid(function.name.clone()));
        }
        let value = self.pop_operand()?;
        if value.is_void() {
            return Err(SemanticError::NoValue);
        }
        if value.data_type != expected {
            return Err(SemanticError::ReturnMismatch {
                expected,
                found: value.data_type,
            });
        }
        self.emit(OpCode::Return, value.slot(), Slot::Empty, Slot::Empty);
        let jump = self.emit(OpCode::Goto, Slot::Empty, Slot::Empty, Slot::Pending);
        self.pending_returns.push(jump);
        Ok(())
    }
}
