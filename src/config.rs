//! Compiler configuration, loaded from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QuadraError, QuadraResult};
use crate::memory::{Address, Segment, TypeSlot};

/// Numeric layout of the virtual address space.
///
/// Attribute addresses are allocated from the local band and then shifted
/// down by `instance_adjustment` (class attributes) or `global_adjustment`
/// (attributes of the global pseudo-class).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressLayout {
    pub sub_range_width: u32,
    pub local_base: Address,
    pub temporary_base: Address,
    pub constant_base: Address,
    pub instance_adjustment: Address,
    pub global_adjustment: Address,
}

impl Default for AddressLayout {
    fn default() -> Self {
        Self {
            sub_range_width: 1000,
            local_base: 15000,
            temporary_base: 20000,
            constant_base: 25000,
            instance_adjustment: 5000,
            global_adjustment: 10000,
        }
    }
}

impl AddressLayout {
    /// Addresses spanned by one segment, or `None` if that exceeds `u32`.
    fn band_size(&self) -> Option<u32> {
        self.sub_range_width.checked_mul(TypeSlot::COUNT as u32)
    }

    /// First address of a segment band.
    pub fn segment_base(&self, segment: Segment) -> Address {
        match segment {
            Segment::Global => self.local_base.saturating_sub(self.global_adjustment),
            Segment::Instance => self.local_base.saturating_sub(self.instance_adjustment),
            Segment::Local => self.local_base,
            Segment::Temporary => self.temporary_base,
            Segment::Constant => self.constant_base,
        }
    }

    /// Offset subtracted from a local-band address for attributes.
    pub fn adjustment(&self, segment: Segment) -> Address {
        match segment {
            Segment::Global => self.global_adjustment,
            Segment::Instance => self.instance_adjustment,
            _ => 0,
        }
    }

    /// Recovers the segment and type slot of an address.
    pub fn classify(&self, address: Address) -> Option<(Segment, TypeSlot)> {
        let band_size = self.band_size()?;
        Segment::ALL.iter().find_map(|&segment| {
            let base = self.segment_base(segment);
            if address < base || address - base >= band_size {
                return None;
            }
            let slot = ((address - base) / self.sub_range_width) as usize;
            TypeSlot::from_index(slot).map(|slot| (segment, slot))
        })
    }

    /// Checks that every segment band fits in the address space and that no
    /// two bands overlap.
    pub fn validate(&self) -> QuadraResult<()> {
        if self.sub_range_width == 0 {
            return Err(QuadraError::Config(
                "sub_range_width must be positive".to_string(),
            ));
        }
        if self.global_adjustment > self.local_base
            || self.instance_adjustment > self.local_base
        {
            return Err(QuadraError::Config(
                "attribute adjustments must not exceed local_base".to_string(),
            ));
        }
        let band_size = self.band_size().ok_or_else(|| {
            QuadraError::Config(format!(
                "sub_range_width {} is too large for {} type ranges",
                self.sub_range_width,
                TypeSlot::COUNT
            ))
        })?;
        let mut bands = Vec::with_capacity(Segment::ALL.len());
        for segment in Segment::ALL {
            let base = self.segment_base(segment);
            let end = base.checked_add(band_size).ok_or_else(|| {
                QuadraError::Config(format!(
                    "{} segment starting at {} runs past the last address {}",
                    segment,
                    base,
                    Address::MAX
                ))
            })?;
            bands.push((segment, base, end));
        }
        bands.sort_by_key(|&(_, base, _)| base);
        for pair in bands.windows(2) {
            let (low, low_base, low_end) = pair[0];
            let (high, high_base, _) = pair[1];
            if low_end > high_base {
                return Err(QuadraError::Config(format!(
                    "{} segment ({}..{}) overlaps {} segment (starts at {})",
                    low, low_base, low_end, high, high_base
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub layout: AddressLayout,
}

impl CompilerConfig {
    pub fn from_toml_str(source: &str) -> QuadraResult<Self> {
        let config: CompilerConfig =
            toml::from_str(source).map_err(|e| QuadraError::Config(e.to_string()))?;
        config.layout.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> QuadraResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| QuadraError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_disjoint() {
        let layout = AddressLayout::default();
        layout.validate().unwrap();
        assert_eq!(layout.segment_base(Segment::Global), 5000);
        assert_eq!(layout.segment_base(Segment::Instance), 10000);
    }

    #[test]
    fn classify_recovers_segment_and_type() {
        let layout = AddressLayout::default();
        assert_eq!(
            layout.classify(15000),
            Some((Segment::Local, TypeSlot::Int))
        );
        assert_eq!(
            layout.classify(21003),
            Some((Segment::Temporary, TypeSlot::Float))
        );
        assert_eq!(
            layout.classify(12500),
            Some((Segment::Instance, TypeSlot::Bool))
        );
        assert_eq!(
            layout.classify(29999),
            Some((Segment::Constant, TypeSlot::Reference))
        );
        assert_eq!(layout.classify(42), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CompilerConfig::from_toml_str(
            r#"
            [layout]
            sub_range_width = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.layout.sub_range_width, 500);
        assert_eq!(config.layout.local_base, 15000);
    }

    #[test]
    fn overlapping_layout_is_rejected() {
        let result = CompilerConfig::from_toml_str(
            r#"
            [layout]
            temporary_base = 16000
            "#,
        );
        assert!(matches!(result, Err(QuadraError::Config(_))));
    }

    #[test]
    fn oversized_sub_range_is_rejected() {
        let result = CompilerConfig::from_toml_str("[layout]\nsub_range_width = 4000000000\n");
        assert!(matches!(result, Err(QuadraError::Config(_))));
    }

    #[test]
    fn band_past_the_address_space_is_rejected() {
        let result = CompilerConfig::from_toml_str("[layout]\nconstant_base = 4294967000\n");
        assert!(matches!(result, Err(QuadraError::Config(_))));

        // The last band may end exactly at the top of the address space.
        let fits = AddressLayout {
            constant_base: Address::MAX - 5000,
            ..AddressLayout::default()
        };
        fits.validate().unwrap();
        assert_eq!(
            fits.classify(Address::MAX - 1),
            Some((Segment::Constant, TypeSlot::Reference))
        );
    }

    #[test]
    fn adjustment_above_local_base_is_rejected() {
        let layout = AddressLayout {
            global_adjustment: 20000,
            ..AddressLayout::default()
        };
        assert!(matches!(layout.validate(), Err(QuadraError::Config(_))));
    }
}
