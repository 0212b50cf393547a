//! Value-to-name lookup table.

use crate::parser::EnumDefinition;

/// Name stored in slots no enumerator uses.
pub const UNUSED_ENUM: &str = "UNUSED_ENUM";

/// Number of slots, one per possible `u8` value.
pub const TABLE_SIZE: usize = 256;

/// A 256-entry table mapping enum value to enumerator name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTable {
    slots: Vec<String>,
}

impl EnumTable {
    /// Build the table for a parsed enum.
    ///
    /// When several enumerators share a value the last declared one is kept.
    pub fn from_definition(definition: &EnumDefinition) -> Self {
        let mut slots = vec![UNUSED_ENUM.to_string(); TABLE_SIZE];
        for entry in &definition.entries {
            let slot = &mut slots[entry.value as usize];
            if slot != UNUSED_ENUM {
                tracing::warn!(
                    value = entry.value,
                    kept = %entry.name,
                    replaced = %slot,
                    "duplicate enum value"
                );
            }
            *slot = entry.name.clone();
        }
        Self { slots }
    }

    /// Name for `value`.
    pub fn get(&self, value: u8) -> &str {
        &self.slots[value as usize]
    }

    /// All slots in value order.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// `(value, name)` of every used slot.
    pub fn used(&self) -> impl Iterator<Item = (u8, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() != UNUSED_ENUM)
            .map(|(value, name)| (value as u8, name.as_str()))
    }
}
