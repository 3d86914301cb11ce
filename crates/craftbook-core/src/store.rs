//! Recipe store: item definitions plus inventory.
//!
//! The store is plain data access. It never derives anything from the graph
//! and never checks references: an ingredient may name an item that does not
//! exist (it resolves as a basic leaf), and deleting an item leaves its
//! dependents untouched.

use std::collections::HashMap;

use craftbook_common::{StoreError, StoreResult};
use tracing::debug;

use crate::inventory::Inventory;
use crate::item::{ItemMetadata, ItemRecord, RecipeDraft};

/// How a name resolves when walking the recipe graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    /// Basic item, or a name the store does not know.
    Leaf,
    /// Recipe with at least one ingredient.
    Composite(&'a ItemRecord),
}

/// Record and inventory sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    /// Number of item records.
    pub recipes: usize,
    /// Number of inventory entries.
    pub inventory: usize,
}

impl StoreCounts {
    /// Sum of both counts.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.recipes + self.inventory
    }
}

/// Owner of every item record and of the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeStore {
    recipes: HashMap<String, ItemRecord>,
    inventory: Inventory,
}

impl RecipeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(recipes: HashMap<String, ItemRecord>, inventory: Inventory) -> Self {
        Self { recipes, inventory }
    }

    /// Writes a basic item, replacing any record of the same name.
    pub fn upsert_basic(&mut self, name: impl Into<String>, metadata: ItemMetadata) {
        let name = name.into();
        debug!("Upserting basic item '{name}'");
        self.recipes
            .insert(name.clone(), ItemRecord::basic(name, metadata));
    }

    /// Writes a recipe, replacing any record of the same name.
    ///
    /// A draft with no positive ingredient amounts is stored as a basic item.
    pub fn upsert_composite(&mut self, name: impl Into<String>, draft: RecipeDraft) {
        let name = name.into();
        let record = ItemRecord::composite(name.clone(), draft);
        debug!(
            "Upserting {} '{name}' with {} ingredient(s)",
            record.kind().display_name().to_lowercase(),
            record.ingredients().len()
        );
        self.recipes.insert(name, record);
    }

    /// Removes a record. Dependents are not updated.
    pub fn delete(&mut self, name: &str) -> Option<ItemRecord> {
        let removed = self.recipes.remove(name);
        if removed.is_some() {
            debug!("Deleted item '{name}'");
        }
        removed
    }

    /// Looks up a record by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ItemRecord> {
        self.recipes.get(name)
    }

    /// Whether a record exists under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    /// Resolves a name for graph traversal. Unknown names become leaves.
    #[must_use]
    pub fn node(&self, name: &str) -> Node<'_> {
        match self.recipes.get(name) {
            Some(record) if record.is_composite() => Node::Composite(record),
            _ => Node::Leaf,
        }
    }

    /// Every record, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &ItemRecord> {
        self.recipes.values()
    }

    /// Basic items, sorted by name.
    #[must_use]
    pub fn basic_items(&self) -> Vec<&ItemRecord> {
        self.sorted_by(ItemRecord::is_basic)
    }

    /// Recipes with ingredients, sorted by name.
    #[must_use]
    pub fn composite_recipes(&self) -> Vec<&ItemRecord> {
        self.sorted_by(ItemRecord::is_composite)
    }

    fn sorted_by<F>(&self, predicate: F) -> Vec<&ItemRecord>
    where
        F: Fn(&ItemRecord) -> bool,
    {
        let mut records: Vec<_> = self.recipes.values().filter(|r| predicate(r)).collect();
        records.sort_by(|a, b| a.name().cmp(b.name()));
        records
    }

    /// Names of records that list `name` as a direct ingredient, sorted.
    #[must_use]
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .recipes
            .values()
            .filter(|r| r.uses(name))
            .map(ItemRecord::name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Copies a record under a new name, marking the description as a copy.
    pub fn duplicate(&mut self, source: &str, target: &str) -> StoreResult<()> {
        let original = self.vacant_target(source, target)?;

        let mut copy = original.renamed(target);
        let description = copy.metadata.description.take().unwrap_or_default();
        copy.metadata.description = Some(format!("{description} (copy)").trim().to_string());

        debug!("Duplicated '{source}' as '{target}'");
        self.recipes.insert(target.to_string(), copy);
        Ok(())
    }

    /// Moves a record to a new name. Dependents keep the old name.
    pub fn rename(&mut self, old: &str, new: &str) -> StoreResult<()> {
        let moved = self.vacant_target(old, new)?.renamed(new);

        self.recipes.insert(new.to_string(), moved);
        self.recipes.remove(old);
        debug!("Renamed '{old}' to '{new}'");
        Ok(())
    }

    fn vacant_target(&self, source: &str, target: &str) -> StoreResult<&ItemRecord> {
        let record = self
            .recipes
            .get(source)
            .ok_or_else(|| StoreError::UnknownItem(source.to_string()))?;
        if self.recipes.contains_key(target) {
            return Err(StoreError::AlreadyExists(target.to_string()));
        }
        Ok(record)
    }

    /// Sets the quantity on hand, clamping negatives to zero.
    pub fn set_inventory(&mut self, name: impl Into<String>, quantity: i64) {
        self.inventory.set(name, quantity);
    }

    /// Quantity on hand; zero when absent.
    #[must_use]
    pub fn get_inventory(&self, name: &str) -> u64 {
        self.inventory.count(name)
    }

    /// The whole inventory.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Whether neither records nor inventory entries exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.inventory.is_empty()
    }

    /// Record and inventory sizes.
    #[must_use]
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            recipes: self.recipes.len(),
            inventory: self.inventory.len(),
        }
    }

    /// Drops all records and inventory.
    pub fn clear(&mut self) {
        self.recipes.clear();
        self.inventory.clear();
    }
}
