//! Final program artifact.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use super::context::QuadGenerator;
use super::quadruple::Quadruple;
use crate::memory::Address;
use crate::semantic::{ATTRIBUTES, FunctionEntry, GLOBAL_CLASS, SymbolKey};
use crate::types::{Access, DataType, Literal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSummary {
    pub return_type: DataType,
    pub param_count: usize,
    pub local_count: usize,
    pub start: Option<usize>,
    pub access: Access,
    pub variables: IndexMap<SymbolKey, VariableSummary>,
}

impl From<&FunctionEntry> for FunctionSummary {
    fn from(entry: &FunctionEntry) -> Self {
        Self {
            return_type: entry.return_type.clone(),
            param_count: entry.param_count,
            local_count: entry.local_count,
            start: entry.start,
            access: entry.access,
            variables: entry
                .variables
                .iter()
                .map(|(key, variable)| {
                    (
                        key.clone(),
                        VariableSummary {
                            data_type: variable.data_type.clone(),
                            address: variable.address,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub parent: Option<String>,
    pub functions: IndexMap<String, FunctionSummary>,
}

/// Everything the virtual machine needs to run the program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramArtifact {
    pub symbol_table: IndexMap<String, ClassSummary>,
    /// Global attribute addresses, uninitialized at start.
    pub data_segment: BTreeSet<Address>,
    pub constant_segment: BTreeMap<Address, Literal>,
    pub quadruples: Vec<Quadruple>,
}

impl ProgramArtifact {
    pub fn function(&self, class: &str, function: &str) -> Option<&FunctionSummary> {
        self.symbol_table.get(class)?.functions.get(function)
    }

    /// Numbered, human-readable quadruple listing.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (index, quad) in self.quadruples.iter().enumerate() {
            let _ = writeln!(out, "{:>4}  {}", index, quad);
        }
        out
    }
}

impl QuadGenerator {
    /// Consumes the context and builds the artifact.
    pub fn into_artifact(self) -> ProgramArtifact {
        let constant_segment = self.constants.segment();
        let symbols = self.analyzer.into_symbols();

        let data_segment = symbols
            .function(GLOBAL_CLASS, ATTRIBUTES)
            .map(|attributes| attributes.variables.values().map(|v| v.address).collect())
            .unwrap_or_default();

        let symbol_table = symbols
            .classes()
            .map(|class| {
                let functions = class
                    .functions
                    .iter()
                    .filter(|(name, _)| !(class.is_global() && name.as_str() == ATTRIBUTES))
                    .map(|(name, entry)| (name.clone(), FunctionSummary::from(entry)))
                    .collect();
                (
                    class.name.clone(),
                    ClassSummary {
                        parent: class.parent.clone(),
                        functions,
                    },
                )
            })
            .collect();

        log::debug!(
            "artifact: {} quadruples, {} constants",
            self.quadruples.len(),
            constant_segment.len()
        );
        ProgramArtifact {
            symbol_table,
            data_segment,
            constant_segment,
            quadruples: self.quadruples,
        }
    }
}
