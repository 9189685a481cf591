//! Symbol table: classes own functions, functions own variables.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::config::AddressLayout;
use crate::memory::{Address, AddressAllocator, Segment};
use crate::types::{Access, DataType};

/// Pseudo-class holding global functions and global variables.
pub const GLOBAL_CLASS: &str = "#global";
/// Pseudo-function holding the attributes of a class.
pub const ATTRIBUTES: &str = "#attributes";

#[derive(Debug, Clone)]
pub struct VariableEntry {
    pub data_type: DataType,
    pub address: Address,
    pub access: Access,
    pub assigned: bool,
}

/// Key of a function's variable map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKey {
    Named(String),
    Temporary(Address),
}

impl SymbolKey {
    pub fn named(name: &str) -> Self {
        SymbolKey::Named(name.to_string())
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKey::Named(name) => write!(f, "{}", name),
            SymbolKey::Temporary(address) => write!(f, "{}", address),
        }
    }
}

impl Serialize for SymbolKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub return_type: DataType,
    pub param_count: usize,
    /// Declared locals plus temporaries.
    pub local_count: usize,
    pub start: Option<usize>,
    pub access: Access,
    /// Parameters first, in declaration order.
    pub variables: IndexMap<SymbolKey, VariableEntry>,
    pub locals: AddressAllocator,
    pub temporaries: AddressAllocator,
}

impl FunctionEntry {
    pub fn new(name: &str, return_type: DataType, access: Access, layout: &AddressLayout) -> Self {
        Self {
            name: name.to_string(),
            return_type,
            param_count: 0,
            local_count: 0,
            start: None,
            access,
            variables: IndexMap::new(),
            locals: AddressAllocator::new(Segment::Local, layout),
            temporaries: AddressAllocator::new(Segment::Temporary, layout),
        }
    }

    pub fn is_attributes(&self) -> bool {
        self.name == ATTRIBUTES
    }

    pub fn variable(&self, name: &str) -> Option<&VariableEntry> {
        self.variables.get(&SymbolKey::named(name))
    }

    /// Declared type of the parameter at `position` (zero-based).
    pub fn parameter_type(&self, position: usize) -> Option<&DataType> {
        if position >= self.param_count {
            return None;
        }
        self.variables
            .get_index(position)
            .map(|(_, variable)| &variable.data_type)
    }

    /// Activation record size: parameters plus locals and temporaries.
    pub fn frame_size(&self) -> usize {
        self.param_count + self.local_count
    }
}

#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub name: String,
    pub parent: Option<String>,
    pub functions: IndexMap<String, FunctionEntry>,
}

impl ClassEntry {
    pub fn new(name: &str, layout: &AddressLayout) -> Self {
        let mut functions = IndexMap::new();
        functions.insert(
            ATTRIBUTES.to_string(),
            FunctionEntry::new(ATTRIBUTES, DataType::Void, Access::Public, layout),
        );
        Self {
            name: name.to_string(),
            parent: None,
            functions,
        }
    }

    pub fn is_global(&self) -> bool {
        self.name == GLOBAL_CLASS
    }

    pub fn attributes(&self) -> Option<&FunctionEntry> {
        self.functions.get(ATTRIBUTES)
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub(crate) classes: IndexMap<String, ClassEntry>,
    pub(crate) layout: AddressLayout,
}

impl SymbolTable {
    pub fn new(layout: AddressLayout) -> Self {
        let mut classes = IndexMap::new();
        classes.insert(GLOBAL_CLASS.to_string(), ClassEntry::new(GLOBAL_CLASS, &layout));
        Self { classes, layout }
    }

    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    pub fn class_exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.values()
    }

    pub fn function(&self, class: &str, function: &str) -> Option<&FunctionEntry> {
        self.classes.get(class)?.functions.get(function)
    }

    pub fn function_mut(&mut self, class: &str, function: &str) -> Option<&mut FunctionEntry> {
        self.classes.get_mut(class)?.functions.get_mut(function)
    }

    /// Ancestors of `class`, nearest first. Every user class implicitly
    /// inherits from the global pseudo-class, which ends the chain.
    pub fn ancestors(&self, class: &str) -> Vec<String> {
        let mut chain = Vec::new();
        if class == GLOBAL_CLASS {
            return chain;
        }
        let mut current = self.classes.get(class).and_then(|c| c.parent.clone());
        while let Some(name) = current {
            if chain.contains(&name) || name == class {
                break;
            }
            current = self.classes.get(&name).and_then(|c| c.parent.clone());
            chain.push(name);
        }
        chain.push(GLOBAL_CLASS.to_string());
        chain
    }

    /// Finds `function` in `class` or the nearest ancestor declaring it and
    /// returns the owning class name.
    pub fn lookup_function(&self, class: &str, function: &str) -> Option<String> {
        if function == ATTRIBUTES {
            return None;
        }
        std::iter::once(class.to_string())
            .chain(self.ancestors(class))
            .find(|owner| self.function(owner, function).is_some())
    }
}
