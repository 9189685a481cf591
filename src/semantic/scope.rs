//! Identifier resolution across function, class and ancestor scopes.

use super::{ATTRIBUTES, SemanticAnalyzer, SymbolKey};
use crate::error::{SemanticError, SemanticResult};
use crate::memory::Address;
use crate::types::{Access, DataType};

/// Whether private attributes of ancestor classes are hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Plain lookups from code inside a class.
    Enforced,
    /// Lookups of an instance identifier being dispatched on.
    Instance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub data_type: DataType,
    pub address: Address,
}

impl SemanticAnalyzer {
    /// Resolves `name` from the current class and function.
    pub fn resolve(&mut self, name: &str, mark_assigned: bool) -> SemanticResult<Resolved> {
        let scope = self.scope().clone();
        self.resolve_in(
            Some((&scope.class, &scope.function)),
            &scope.class,
            name,
            mark_assigned,
            Visibility::Enforced,
        )
    }

    /// Searches the variables of `local` (a class and function pair), then
    /// the attributes of `class`, then the attributes of each ancestor of
    /// `class`. The first scope declaring `name` decides the outcome.
    pub fn resolve_in(
        &mut self,
        local: Option<(&str, &str)>,
        class: &str,
        name: &str,
        mark_assigned: bool,
        visibility: Visibility,
    ) -> SemanticResult<Resolved> {
        let mut candidates: Vec<(String, String, bool)> = Vec::new();
        if let Some((owner, function)) = local {
            candidates.push((owner.to_string(), function.to_string(), false));
        }
        candidates.push((class.to_string(), ATTRIBUTES.to_string(), false));
        for ancestor in self.symbols.ancestors(class) {
            candidates.push((ancestor, ATTRIBUTES.to_string(), visibility == Visibility::Enforced));
        }

        let key = SymbolKey::named(name);
        for (owner, function, check_access) in candidates {
            let Some(variable) = self
                .symbols
                .function_mut(&owner, &function)
                .and_then(|f| f.variables.get_mut(&key))
            else {
                continue;
            };
            if check_access && variable.access == Access::Private {
                return Err(SemanticError::PrivateAccess(name.to_string()));
            }
            if mark_assigned {
                variable.assigned = true;
            }
            if !variable.assigned {
                return Err(SemanticError::UsedBeforeAssignment(name.to_string()));
            }
            log::trace!("resolved {} in {}.{} @ {}", name, owner, function, variable.address);
            return Ok(Resolved {
                data_type: variable.data_type.clone(),
                address: variable.address,
            });
        }
        Err(SemanticError::NotInScope(name.to_string()))
    }
}
