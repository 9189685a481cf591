//! Symbol-table construction and name resolution.
//!
//! The analyzer owns the [`SymbolTable`] plus the declaration context the
//! parser drives: an explicit stack of (class, function) scopes, the type and
//! access most recently declared, and whether a parameter list is open.

pub mod cube;
pub mod symbols;
mod declarations;
mod scope;

pub use cube::{Operator, OperatorClass, semantic_cube};
pub use scope::{Resolved, Visibility};
pub use symbols::{
    ATTRIBUTES, ClassEntry, FunctionEntry, GLOBAL_CLASS, SymbolKey, SymbolTable, VariableEntry,
};

use crate::config::AddressLayout;
use crate::error::{SemanticResult, internal_error};
use crate::memory::Address;
use crate::types::{Access, DataType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub class: String,
    pub function: String,
}

impl Scope {
    fn attributes_of(class: &str) -> Self {
        Self {
            class: class.to_string(),
            function: ATTRIBUTES.to_string(),
        }
    }

    pub fn is_function(&self) -> bool {
        self.function != ATTRIBUTES
    }
}

pub struct SemanticAnalyzer {
    pub(crate) symbols: SymbolTable,
    scopes: Vec<Scope>,
    current_type: Option<DataType>,
    access: Access,
    in_params: bool,
    param_counter: usize,
}

impl SemanticAnalyzer {
    pub fn new(layout: AddressLayout) -> Self {
        Self {
            symbols: SymbolTable::new(layout),
            scopes: vec![Scope::attributes_of(GLOBAL_CLASS)],
            current_type: None,
            access: Access::Public,
            in_params: false,
            param_counter: 0,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    pub fn scope(&self) -> &Scope {
        // The global attribute scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn current_class(&self) -> &str {
        &self.scope().class
    }

    pub fn current_function(&self) -> &str {
        &self.scope().function
    }

    pub fn current_function_entry(&self) -> SemanticResult<&FunctionEntry> {
        let scope = self.scope();
        self.symbols
            .function(&scope.class, &scope.function)
            .ok_or_else(|| internal_error(format!("scope {}.{} missing", scope.class, scope.function)))
    }

    fn current_function_entry_mut(&mut self) -> SemanticResult<&mut FunctionEntry> {
        let Scope { class, function } = self.scope().clone();
        self.symbols
            .function_mut(&class, &function)
            .ok_or_else(|| internal_error(format!("scope {}.{} missing", class, function)))
    }

    /// Allocates a temporary in the current function and registers it as a
    /// variable keyed by its address.
    pub fn allocate_temporary(&mut self, data_type: &DataType) -> SemanticResult<Address> {
        let function = self.current_function_entry_mut()?;
        let address = function.temporaries.next(data_type)?;
        function.variables.insert(
            SymbolKey::Temporary(address),
            VariableEntry {
                data_type: data_type.clone(),
                address,
                access: Access::Public,
                assigned: true,
            },
        );
        function.local_count += 1;
        log::trace!("temporary {} : {} in {}", address, data_type, function.name);
        Ok(address)
    }

    /// Records the index of the first instruction of the current function.
    pub fn mark_function_start(&mut self, index: usize) -> SemanticResult<()> {
        let function = self.current_function_entry_mut()?;
        function.start = Some(index);
        Ok(())
    }

    /// Leaves the current function scope, if one is open.
    pub fn close_function_scope(&mut self) {
        if self.scopes.len() > 1 && self.scope().is_function() {
            self.scopes.pop();
        }
    }
}
