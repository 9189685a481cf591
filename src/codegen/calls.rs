//! Call protocol: `era`, `param`, `gosub`, attribute access and instance
//! dispatch.
//!
//! Each call in progress owns a [`CallFrame`], so an argument that is itself
//! a call (`f(g(x), y)`) keeps the outer call's position intact.

use super::context::QuadGenerator;
use super::operand::Operand;
use super::quadruple::{OpCode, Slot};
use crate::error::{SemanticError, SemanticResult, internal_error};
use crate::semantic::{ATTRIBUTES, FunctionEntry, Visibility};
use crate::types::DataType;

/// What a call frame resolves to once the call closes.
#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    Function,
    /// Attribute read through an instance; carries the attribute type.
    Attribute(DataType),
    /// `super(...)`-style call to the parent's `init`.
    ParentInit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Class that owns the callee.
    pub class: String,
    pub function: String,
    pub kind: CallKind,
    /// Zero-based parameter position being filled.
    pub position: usize,
    /// Arguments bound so far.
    pub passed: usize,
}

impl CallFrame {
    fn new(class: String, function: String, kind: CallKind) -> Self {
        Self {
            class,
            function,
            kind,
            position: 0,
            passed: 0,
        }
    }
}

impl QuadGenerator {
    /// Class receiving the next member access: the instance selected by
    /// `switch_instance`, or the current class.
    fn target_class(&mut self) -> String {
        self.dispatch_class
            .take()
            .unwrap_or_else(|| self.analyzer.current_class().to_string())
    }

    fn innermost_call(&self) -> SemanticResult<&CallFrame> {
        self.calls
            .last()
            .ok_or_else(|| internal_error("no call in progress"))
    }

    fn innermost_call_mut(&mut self) -> SemanticResult<&mut CallFrame> {
        self.calls
            .last_mut()
            .ok_or_else(|| internal_error("no call in progress"))
    }

    fn callee(&self, frame: &CallFrame) -> SemanticResult<&FunctionEntry> {
        self.symbols()
            .function(&frame.class, &frame.function)
            .ok_or_else(|| SemanticError::UndefinedFunction(frame.function.clone()))
    }

    /// Opens a call to `name`, searching the target class and its ancestors.
    pub fn begin_call(&mut self, name: &str) -> SemanticResult<()> {
        let class = self.target_class();
        let owner = self
            .symbols()
            .lookup_function(&class, name)
            .ok_or_else(|| SemanticError::UndefinedFunction(name.to_string()))?;
        log::debug!("call {}.{} (from {})", owner, name, class);
        self.calls
            .push(CallFrame::new(owner, name.to_string(), CallKind::Function));
        Ok(())
    }

    /// Emits `era` for the innermost call and starts binding arguments.
    pub fn begin_param_collection(&mut self) -> SemanticResult<()> {
        let frame = self.innermost_call()?.clone();
        if let CallKind::Attribute(_) = frame.kind {
            return Err(internal_error("attribute access takes no arguments"));
        }
        let size = self.callee(&frame)?.frame_size();
        let frame = self.innermost_call_mut()?;
        frame.position = 0;
        frame.passed = 0;
        let name = frame.function.clone();
        self.emit(OpCode::Era, Slot::Name(name), Slot::Size(size), Slot::Empty);
        Ok(())
    }

    /// Binds the operand on top of the stack to the current parameter.
    pub fn pass_param(&mut self) -> SemanticResult<()> {
        let argument = self.pop_operand()?;
        let frame = self.innermost_call()?.clone();
        let callee = self.callee(&frame)?;
        let Some(expected) = callee.parameter_type(frame.position).cloned() else {
            return Err(SemanticError::TooManyArguments {
                function: frame.function,
                expected: callee.param_count,
            });
        };
        if argument.is_void() {
            return Err(SemanticError::NoValue);
        }
        if argument.data_type != expected {
            return Err(SemanticError::ArgumentMismatch {
                function: frame.function,
                position: frame.position + 1,
                expected,
                found: argument.data_type,
            });
        }
        self.emit(
            OpCode::Param,
            argument.slot(),
            Slot::Empty,
            Slot::Position(frame.position),
        );
        self.innermost_call_mut()?.passed += 1;
        Ok(())
    }

    /// Moves to the next parameter after a comma.
    pub fn advance_param(&mut self) -> SemanticResult<()> {
        let frame = self.innermost_call()?.clone();
        let expected = self.callee(&frame)?.param_count;
        let frame = self.innermost_call_mut()?;
        frame.position += 1;
        if frame.position >= expected {
            return Err(SemanticError::TooManyArguments {
                function: frame.function.clone(),
                expected,
            });
        }
        Ok(())
    }

    /// Checks the argument count and emits `gosub`.
    pub fn end_param_pass(&mut self) -> SemanticResult<()> {
        let frame = self.innermost_call()?.clone();
        let expected = self.callee(&frame)?.param_count;
        if frame.passed != expected {
            return Err(SemanticError::ArgumentCountMismatch {
                function: frame.function,
                expected,
                given: frame.passed,
            });
        }
        self.emit(OpCode::Gosub, Slot::Name(frame.function), Slot::Empty, Slot::Empty);
        Ok(())
    }

    /// Reads attribute `name` of the target class.
    pub fn attribute_call(&mut self, name: &str) -> SemanticResult<()> {
        let class = self.target_class();
        let resolved =
            self.analyzer
                .resolve_in(None, &class, name, false, Visibility::Enforced)?;
        self.emit(
            OpCode::Return,
            Slot::Address(resolved.address),
            Slot::Empty,
            Slot::Empty,
        );
        self.calls.push(CallFrame::new(
            class,
            ATTRIBUTES.to_string(),
            CallKind::Attribute(resolved.data_type),
        ));
        Ok(())
    }

    /// Closes a function call or attribute access and pushes its value.
    pub fn end_call(&mut self) -> SemanticResult<()> {
        let frame = self
            .calls
            .pop()
            .ok_or_else(|| internal_error("no call in progress"))?;
        let result_type = match &frame.kind {
            CallKind::Attribute(data_type) => data_type.clone(),
            CallKind::Function => self.callee(&frame)?.return_type.clone(),
            CallKind::ParentInit => {
                return Err(internal_error("parent init closed as a value call"));
            }
        };
        self.emit(OpCode::ExitInstances, Slot::Empty, Slot::Empty, Slot::Empty);
        if result_type == DataType::Void {
            self.operands.push(Operand::void());
            return Ok(());
        }
        let temp = self.temporary(result_type)?;
        self.emit(OpCode::GetReturn, Slot::Empty, Slot::Empty, temp.slot());
        self.operands.push(temp);
        Ok(())
    }

    /// Opens a call to `init` of the declared parent class.
    pub fn call_parent(&mut self, parent: &str) -> SemanticResult<()> {
        let class = self.analyzer.current_class().to_string();
        let declared = self
            .symbols()
            .class(&class)
            .and_then(|entry| entry.parent.clone());
        match declared {
            None => {
                return Err(SemanticError::NoParentClass {
                    class,
                    parent: parent.to_string(),
                });
            }
            Some(declared) if declared != parent => {
                return Err(SemanticError::NotParentClass {
                    class,
                    parent: parent.to_string(),
                });
            }
            Some(_) => {}
        }
        if self.symbols().function(parent, "init").is_none() {
            return Err(SemanticError::UndefinedFunction("init".to_string()));
        }
        self.calls.push(CallFrame::new(
            parent.to_string(),
            "init".to_string(),
            CallKind::ParentInit,
        ));
        Ok(())
    }

    pub fn end_parent_call(&mut self) -> SemanticResult<()> {
        match self.calls.pop() {
            Some(frame) if frame.kind == CallKind::ParentInit => Ok(()),
            Some(frame) => Err(internal_error(format!(
                "call to {} closed as a parent init",
                frame.function
            ))),
            None => Err(internal_error("no call in progress")),
        }
    }

    /// Retargets the innermost call to another function of the same class.
    pub fn switch_callee_function(&mut self, name: &str) -> SemanticResult<()> {
        let class = self.innermost_call()?.class.clone();
        if name == ATTRIBUTES || self.symbols().function(&class, name).is_none() {
            return Err(SemanticError::UndefinedFunction(name.to_string()));
        }
        let frame = self.innermost_call_mut()?;
        frame.function = name.to_string();
        frame.kind = CallKind::Function;
        frame.position = 0;
        frame.passed = 0;
        Ok(())
    }

    /// Selects the instance stored in `name` as the target of the next
    /// member access.
    pub fn switch_instance(&mut self, name: &str) -> SemanticResult<()> {
        let scope = self.analyzer.scope().clone();
        let class = self
            .dispatch_class
            .clone()
            .unwrap_or_else(|| scope.class.clone());
        let resolved = self.analyzer.resolve_in(
            Some((&scope.class, &scope.function)),
            &class,
            name,
            false,
            Visibility::Instance,
        )?;
        let DataType::Class(instance_class) = resolved.data_type else {
            return Err(SemanticError::NotAnInstance {
                name: name.to_string(),
                data_type: resolved.data_type,
            });
        };
        self.emit(
            OpCode::SwitchInstance,
            Slot::Address(resolved.address),
            Slot::Empty,
            Slot::Empty,
        );
        log::debug!("dispatch on {} : {}", name, instance_class);
        self.dispatch_class = Some(instance_class);
        Ok(())
    }
}
