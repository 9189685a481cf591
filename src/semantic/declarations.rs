//! Declaration actions: classes, functions, types, variables.

use super::{
    ATTRIBUTES, ClassEntry, FunctionEntry, GLOBAL_CLASS, Scope, SemanticAnalyzer, SymbolKey,
    VariableEntry,
};
use crate::error::{SemanticError, SemanticResult, internal_error};
use crate::memory::Segment;
use crate::types::{Access, DataType};

impl SemanticAnalyzer {
    pub fn declare_class(&mut self, name: &str) -> SemanticResult<()> {
        if self.symbols.class_exists(name) {
            return Err(SemanticError::RepeatedClass(name.to_string()));
        }
        if self.scopes.len() != 1 {
            return Err(internal_error(format!(
                "class {} declared inside {}.{}",
                name,
                self.current_class(),
                self.current_function()
            )));
        }
        let entry = ClassEntry::new(name, &self.symbols.layout);
        self.symbols.classes.insert(name.to_string(), entry);
        self.scopes.push(Scope::attributes_of(name));
        log::debug!("declared class {}", name);
        Ok(())
    }

    pub fn set_parent(&mut self, parent: &str) -> SemanticResult<()> {
        let class = self.current_class().to_string();
        if parent == class {
            return Err(SemanticError::CyclicInheritance(class));
        }
        if parent == GLOBAL_CLASS || !self.symbols.class_exists(parent) {
            return Err(SemanticError::UndeclaredParent(parent.to_string()));
        }
        let entry = self
            .symbols
            .classes
            .get_mut(&class)
            .filter(|entry| !entry.is_global())
            .ok_or_else(|| internal_error(format!("parent {} given outside a class", parent)))?;
        entry.parent = Some(parent.to_string());
        log::debug!("class {} extends {}", class, parent);
        Ok(())
    }

    pub fn finish_class(&mut self) -> SemanticResult<()> {
        let scope = self.scope();
        if self.scopes.len() == 1 || scope.is_function() {
            return Err(internal_error(format!(
                "finish class while in {}.{}",
                scope.class, scope.function
            )));
        }
        self.scopes.pop();
        self.access = Access::Public;
        Ok(())
    }

    pub fn declare_function(&mut self, name: &str) -> SemanticResult<()> {
        if self.scope().is_function() {
            return Err(internal_error(format!(
                "function {} declared inside {}",
                name,
                self.current_function()
            )));
        }
        let class = self.current_class().to_string();
        if name == ATTRIBUTES || self.symbols.function(&class, name).is_some() {
            return Err(SemanticError::RedeclaredFunction(name.to_string()));
        }
        let return_type = self
            .current_type
            .clone()
            .ok_or_else(|| internal_error(format!("function {} has no declared type", name)))?;
        let entry = FunctionEntry::new(name, return_type, self.access, &self.symbols.layout);
        if let Some(class_entry) = self.symbols.classes.get_mut(&class) {
            class_entry.functions.insert(name.to_string(), entry);
        }
        self.scopes.push(Scope {
            class: class.clone(),
            function: name.to_string(),
        });
        log::debug!("declared function {}.{} ({})", class, name, self.access);
        Ok(())
    }

    pub fn set_access(&mut self, access: Access) {
        self.access = access;
    }

    pub fn declare_type(&mut self, name: &str) -> SemanticResult<()> {
        let data_type = match DataType::from_keyword(name) {
            Some(primitive) => primitive,
            None if name != GLOBAL_CLASS && self.symbols.class_exists(name) => {
                DataType::Class(name.to_string())
            }
            None => return Err(SemanticError::UnknownType(name.to_string())),
        };
        self.current_type = Some(data_type);
        Ok(())
    }

    pub fn declare_variable(&mut self, name: &str) -> SemanticResult<()> {
        let data_type = self
            .current_type
            .clone()
            .ok_or_else(|| internal_error(format!("variable {} has no declared type", name)))?;
        if data_type == DataType::Void {
            return Err(SemanticError::VoidVariable(name.to_string()));
        }
        let segment = match (self.scope().is_function(), self.current_class() == GLOBAL_CLASS) {
            (true, _) => Segment::Local,
            (false, true) => Segment::Global,
            (false, false) => Segment::Instance,
        };
        let adjustment = self.symbols.layout.adjustment(segment);
        let in_params = self.in_params;
        let access = self.access;

        let function = self.current_function_entry_mut()?;
        let key = SymbolKey::named(name);
        if function.variables.contains_key(&key) {
            return Err(SemanticError::RedeclaredVariable(name.to_string()));
        }
        let address = function
            .locals
            .next(&data_type)?
            .checked_sub(adjustment)
            .ok_or_else(|| {
                internal_error(format!(
                    "{} adjustment {} exceeds the address of {}",
                    segment, adjustment, name
                ))
            })?;
        if !in_params {
            function.local_count += 1;
        }
        // Parameters are bound by the caller; instances are allocated statically.
        let assigned = in_params || data_type.is_class();
        log::debug!(
            "declared {} {} : {} @ {} ({})",
            segment,
            name,
            data_type,
            address,
            access
        );
        function.variables.insert(
            key,
            VariableEntry {
                data_type,
                address,
                access,
                assigned,
            },
        );
        if in_params {
            self.param_counter += 1;
        }
        Ok(())
    }

    pub fn enter_parameter_list(&mut self) {
        self.in_params = true;
        self.param_counter = 0;
    }

    pub fn exit_parameter_list(&mut self) -> SemanticResult<()> {
        let count = self.param_counter;
        self.in_params = false;
        self.param_counter = 0;
        let function = self.current_function_entry_mut()?;
        function.param_count = count;
        Ok(())
    }
}
