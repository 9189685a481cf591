//! Two-stack expression evaluation.

use super::context::QuadGenerator;
use super::operand::Operand;
use super::quadruple::{OpCode, Slot};
use crate::error::{SemanticError, SemanticResult, internal_error};
use crate::semantic::{Operator, semantic_cube};
use crate::types::{DataType, OperandToken};

impl QuadGenerator {
    /// Resolves a literal or identifier and pushes it.
    pub fn push_operand(&mut self, token: OperandToken) -> SemanticResult<()> {
        let operand = self.build_operand(token)?;
        self.operands.push(operand);
        Ok(())
    }

    fn build_operand(&mut self, token: OperandToken) -> SemanticResult<Operand> {
        match token {
            OperandToken::Literal(literal) => {
                let address = self.constants.intern(&literal)?;
                Ok(Operand::new(literal.to_string(), literal.data_type(), address))
            }
            OperandToken::Identifier(name) => {
                let resolved = self.analyzer.resolve(&name, false)?;
                Ok(Operand::new(name, resolved.data_type, resolved.address))
            }
        }
    }

    pub fn push_operator(&mut self, operator: Operator) -> SemanticResult<()> {
        if operator == Operator::Assign {
            return Err(internal_error("assignment is not a stacked operator"));
        }
        self.operators.push(operator);
        Ok(())
    }

    /// Reduces the top operator if it belongs to `ready`.
    pub fn reduce_if_ready(&mut self, ready: &[Operator]) -> SemanticResult<()> {
        match self.operators.last() {
            Some(top) if ready.contains(top) && *top != Operator::FakeBottom => {}
            _ => return Ok(()),
        }
        let right = self.pop_operand()?;
        let left = self.pop_operand()?;
        let operator = self
            .operators
            .pop()
            .ok_or_else(|| internal_error("operator stack is empty"))?;

        let Some(result_type) = semantic_cube(&left.data_type, &right.data_type, operator) else {
            if left.is_void() || right.is_void() {
                return Err(SemanticError::NoValue);
            }
            return Err(SemanticError::OperatorMismatch {
                operator,
                left: left.data_type,
                right: right.data_type,
            });
        };
        let op = OpCode::from_operator(operator)
            .ok_or_else(|| internal_error("fake bottom reached reduction"))?;
        let temp = self.temporary(result_type)?;
        self.emit(op, left.slot(), right.slot(), temp.slot());
        self.operands.push(temp);
        Ok(())
    }

    /// Removes the sentinel closing a parenthesized sub-expression.
    pub fn discard_fake_bottom(&mut self) -> SemanticResult<()> {
        match self.operators.pop() {
            Some(Operator::FakeBottom) => Ok(()),
            Some(other) => Err(internal_error(format!(
                "expected fake bottom, found pending operator {}",
                other
            ))),
            None => Err(internal_error("operator stack is empty")),
        }
    }

    /// Assigns the value on top of the stack to `target`.
    pub fn assign(&mut self, target: &str) -> SemanticResult<()> {
        let value = self.pop_operand()?;
        let resolved = self.analyzer.resolve(target, true)?;

        if semantic_cube(&resolved.data_type, &value.data_type, Operator::Assign).is_none() {
            if value.is_void() {
                return Err(SemanticError::NoValue);
            }
            return Err(SemanticError::AssignmentMismatch {
                target: target.to_string(),
                expected: resolved.data_type,
                found: value.data_type,
            });
        }
        if value.data_type == DataType::Read {
            self.emit(OpCode::Read, Slot::Empty, Slot::Empty, Slot::Address(resolved.address));
        } else {
            self.emit(
                OpCode::Assign,
                value.slot(),
                Slot::Empty,
                Slot::Address(resolved.address),
            );
        }
        Ok(())
    }

    /// Drops the value of an expression evaluated only for its effects.
    pub fn discard_value(&mut self) -> SemanticResult<()> {
        self.pop_operand().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::quadruple::Quadruple;
    use crate::semantic::{ATTRIBUTES, GLOBAL_CLASS};
    use crate::types::Literal;

    fn with_int(names: &[&str]) -> QuadGenerator {
        let mut generator = QuadGenerator::new();
        generator.declare_type("int").unwrap();
        for name in names {
            generator.declare_variable(name).unwrap();
        }
        generator
    }

    #[test]
    fn sum_of_literals_then_assignment() {
        let mut generator = with_int(&["x"]);
        generator.push_operand(OperandToken::from(2i64)).unwrap();
        generator.push_operator(Operator::Plus).unwrap();
        generator.push_operand(OperandToken::from(3i64)).unwrap();
        generator.reduce_if_ready(&[Operator::Plus, Operator::Minus]).unwrap();
        generator.assign("x").unwrap();

        let two = generator.constants().address_of(&Literal::Int(2)).unwrap();
        let three = generator.constants().address_of(&Literal::Int(3)).unwrap();
        let x = generator
            .symbols()
            .function(GLOBAL_CLASS, ATTRIBUTES)
            .and_then(|f| f.variable("x"))
            .unwrap()
            .address;
        let quads = &generator.quadruples()[1..];
        let Slot::Address(temp) = quads[0].result else {
            panic!("sum has no temporary");
        };
        assert_eq!(
            quads[0],
            Quadruple::new(OpCode::Plus, Slot::Address(two), Slot::Address(three), Slot::Address(temp))
        );
        assert_eq!(
            quads[1],
            Quadruple::new(OpCode::Assign, Slot::Address(temp), Slot::Empty, Slot::Address(x))
        );
    }

    #[test]
    fn reduction_waits_for_its_precedence_class() {
        let mut generator = with_int(&[]);
        generator.push_operand(OperandToken::from(1i64)).unwrap();
        generator.push_operator(Operator::Plus).unwrap();
        generator.push_operand(OperandToken::from(2i64)).unwrap();
        generator.reduce_if_ready(&[Operator::Times, Operator::Divide]).unwrap();
        assert_eq!(generator.next_index(), 1);
        generator.reduce_if_ready(&[Operator::Plus]).unwrap();
        assert_eq!(generator.next_index(), 2);
    }

    #[test]
    fn mismatched_operands_emit_nothing() {
        let mut generator = with_int(&[]);
        generator.push_operand(OperandToken::from(true)).unwrap();
        generator.push_operator(Operator::Plus).unwrap();
        generator.push_operand(OperandToken::from(1i64)).unwrap();
        let err = generator.reduce_if_ready(&[Operator::Plus]).unwrap_err();
        assert!(matches!(err, SemanticError::OperatorMismatch { operator: Operator::Plus, .. }));
        assert_eq!(generator.next_index(), 1);
    }

    #[test]
    fn void_operands_report_missing_value() {
        let mut generator = with_int(&[]);
        generator.operands.push(Operand::void());
        generator.push_operator(Operator::Times).unwrap();
        generator.push_operand(OperandToken::from(1i64)).unwrap();
        assert_eq!(
            generator.reduce_if_ready(&[Operator::Times]),
            Err(SemanticError::NoValue)
        );
    }

    #[test]
    fn fake_bottom_blocks_reduction() {
        let mut generator = with_int(&[]);
        generator.push_operand(OperandToken::from(1i64)).unwrap();
        generator.push_operator(Operator::Times).unwrap();
        generator.push_operator(Operator::FakeBottom).unwrap();
        generator.push_operand(OperandToken::from(2i64)).unwrap();
        generator.reduce_if_ready(&[Operator::Times]).unwrap();
        assert_eq!(generator.next_index(), 1);
        generator.discard_fake_bottom().unwrap();
        generator.reduce_if_ready(&[Operator::Times]).unwrap();
        assert_eq!(generator.next_index(), 2);
        assert!(generator.discard_fake_bottom().unwrap_err().is_fatal());
    }

    #[test]
    fn assignment_checks_the_cube() {
        let mut generator = with_int(&["x"]);
        generator.push_operand(OperandToken::from(1.5)).unwrap();
        let err = generator.assign("x").unwrap_err();
        assert_eq!(err.to_string(), "Type mismatch: expression cannot be assigned to x");
        generator.operands.push(Operand::void());
        assert_eq!(generator.assign("x"), Err(SemanticError::NoValue));
    }

    #[test]
    fn reading_unassigned_identifier_fails() {
        let mut generator = with_int(&["y"]);
        assert_eq!(
            generator.push_operand(OperandToken::ident("y")),
            Err(SemanticError::UsedBeforeAssignment("y".into()))
        );
        assert_eq!(
            generator.push_operand(OperandToken::ident("nope")),
            Err(SemanticError::NotInScope("nope".into()))
        );
    }
}
