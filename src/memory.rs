//! Segmented virtual address space.
//!
//! Every segment is split into one sub-range per [`TypeSlot`], so the segment
//! and the type of an address can be recovered from its value alone (see
//! [`AddressLayout::classify`]).

use std::fmt;

use serde::Serialize;

use crate::config::AddressLayout;
use crate::error::{SemanticError, SemanticResult};
use crate::types::DataType;

pub type Address = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// Attributes of the global pseudo-class.
    Global,
    /// Attributes declared on a class.
    Instance,
    /// Parameters and declared locals.
    Local,
    /// Compiler-generated temporaries.
    Temporary,
    /// Literal constants.
    Constant,
}

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Global,
        Segment::Instance,
        Segment::Local,
        Segment::Temporary,
        Segment::Constant,
    ];
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Global => "global",
            Segment::Instance => "instance",
            Segment::Local => "local",
            Segment::Temporary => "temporary",
            Segment::Constant => "constant",
        };
        write!(f, "{}", name)
    }
}

/// Sub-range of a segment reserved for one family of types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSlot {
    Int,
    Float,
    Bool,
    Char,
    /// Class instances in variable segments, string literals in the
    /// constant segment.
    Reference,
}

impl TypeSlot {
    pub const COUNT: usize = 5;

    pub fn of(data_type: &DataType) -> Option<TypeSlot> {
        match data_type {
            DataType::Int => Some(TypeSlot::Int),
            DataType::Float => Some(TypeSlot::Float),
            DataType::Bool => Some(TypeSlot::Bool),
            DataType::Char => Some(TypeSlot::Char),
            DataType::Str | DataType::Class(_) => Some(TypeSlot::Reference),
            DataType::Read | DataType::Void => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<TypeSlot> {
        match index {
            0 => Some(TypeSlot::Int),
            1 => Some(TypeSlot::Float),
            2 => Some(TypeSlot::Bool),
            3 => Some(TypeSlot::Char),
            4 => Some(TypeSlot::Reference),
            _ => None,
        }
    }
}

/// Issues unique addresses within one segment.
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    segment: Segment,
    base: Address,
    width: u32,
    used: [u32; TypeSlot::COUNT],
}

impl AddressAllocator {
    pub fn new(segment: Segment, layout: &AddressLayout) -> Self {
        // Attribute segments are allocated from the local band and shifted
        // down afterwards by the caller.
        let base = match segment {
            Segment::Global | Segment::Instance | Segment::Local => layout.local_base,
            Segment::Temporary => layout.temporary_base,
            Segment::Constant => layout.constant_base,
        };
        Self {
            segment,
            base,
            width: layout.sub_range_width,
            used: [0; TypeSlot::COUNT],
        }
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn next(&mut self, data_type: &DataType) -> SemanticResult<Address> {
        let slot = TypeSlot::of(data_type).ok_or_else(|| {
            SemanticError::Internal(format!("no address range for type {}", data_type))
        })?;
        let start = (slot.index() as u32)
            .checked_mul(self.width)
            .and_then(|offset| self.base.checked_add(offset));
        let used = &mut self.used[slot.index()];
        let address = start.and_then(|start| start.checked_add(*used));
        match address {
            Some(address) if *used < self.width => {
                *used += 1;
                Ok(address)
            }
            _ => Err(SemanticError::AddressOverflow {
                segment: self.segment,
                data_type: data_type.clone(),
                limit: start
                    .and_then(|start| start.checked_add(self.width.saturating_sub(1)))
                    .unwrap_or(Address::MAX),
            }),
        }
    }

    /// Number of addresses handed out for a slot so far.
    pub fn allocated(&self, slot: TypeSlot) -> u32 {
        self.used[slot.index()]
    }
}
