//! Inventory of items on hand.

use std::collections::HashMap;

/// Quantities on hand, keyed by item name.
///
/// Absent entries read as zero. Quantities never go negative: setting a
/// negative value stores zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Items and their quantities
    items: HashMap<String, u64>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count of a specific item.
    #[must_use]
    pub fn count(&self, item: &str) -> u64 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Checks if the inventory contains at least the given amount.
    #[must_use]
    pub fn has(&self, item: &str, amount: u64) -> bool {
        self.count(item) >= amount
    }

    /// Sets the quantity on hand, clamping negatives to zero.
    pub fn set(&mut self, item: impl Into<String>, quantity: i64) {
        let clamped = u64::try_from(quantity).unwrap_or(0);
        self.items.insert(item.into(), clamped);
    }

    /// Drops the entry for an item. Returns the previous quantity.
    pub fn remove(&mut self, item: &str) -> Option<u64> {
        self.items.remove(item)
    }

    /// Number of tracked entries (including explicit zeros).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no entries are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns an iterator over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.items.iter().map(|(name, &count)| (name.as_str(), count))
    }
}
