//! Operands on the evaluation stack and the constant pool.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::quadruple::Slot;
use crate::config::AddressLayout;
use crate::error::SemanticResult;
use crate::memory::{Address, AddressAllocator, Segment};
use crate::types::{DataType, Literal};

/// A resolved value: its source token, type and address.
///
/// `void` call results and pending `read` input carry no address.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub raw: String,
    pub data_type: DataType,
    pub address: Option<Address>,
}

impl Operand {
    pub fn new(raw: impl Into<String>, data_type: DataType, address: Address) -> Self {
        Self {
            raw: raw.into(),
            data_type,
            address: Some(address),
        }
    }

    pub fn temporary(data_type: DataType, address: Address) -> Self {
        Self::new(address.to_string(), data_type, address)
    }

    /// Marker pushed for calls that return nothing.
    pub fn void() -> Self {
        Self {
            raw: "void".to_string(),
            data_type: DataType::Void,
            address: None,
        }
    }

    pub fn read() -> Self {
        Self {
            raw: "read".to_string(),
            data_type: DataType::Read,
            address: None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.data_type == DataType::Void
    }

    pub fn slot(&self) -> Slot {
        match self.address {
            Some(address) => Slot::Address(address),
            None => Slot::Empty,
        }
    }
}

/// Literal constants, one address per distinct value.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    addresses: IndexMap<Literal, Address>,
    allocator: AddressAllocator,
}

impl ConstantPool {
    pub fn new(layout: &AddressLayout) -> Self {
        Self {
            addresses: IndexMap::new(),
            allocator: AddressAllocator::new(Segment::Constant, layout),
        }
    }

    pub fn intern(&mut self, literal: &Literal) -> SemanticResult<Address> {
        if let Some(address) = self.addresses.get(literal) {
            return Ok(*address);
        }
        let address = self.allocator.next(&literal.data_type())?;
        log::debug!("constant {} @ {}", literal, address);
        self.addresses.insert(literal.clone(), address);
        Ok(address)
    }

    pub fn address_of(&self, literal: &Literal) -> Option<Address> {
        self.addresses.get(literal).copied()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Address to value, the inverse of the pool.
    pub fn segment(&self) -> BTreeMap<Address, Literal> {
        self.addresses
            .iter()
            .map(|(literal, address)| (*address, literal.clone()))
            .collect()
    }
}
