//! Exchanged store shape.
//!
//! ```json
//! {
//!   "recipes": { "Bread": { "name": "Bread", "type": "recipe",
//!                           "ingredients": { "Flour": 2 } } },
//!   "inventory": { "Flour": 10 }
//! }
//! ```
//!
//! A snapshot is validated as a whole before it replaces anything, so a
//! rejected load leaves the target store untouched.

use std::collections::{BTreeMap, HashMap};

use craftbook_common::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::inventory::Inventory;
use crate::item::ItemRecord;
use crate::store::RecipeStore;

/// Serializable copy of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Records keyed by name.
    #[serde(default)]
    pub recipes: BTreeMap<String, ItemRecord>,
    /// Stock keyed by name. Negative values are clamped on load.
    #[serde(default)]
    pub inventory: BTreeMap<String, i64>,
}

impl StoreSnapshot {
    /// Copies the current contents of a store.
    #[must_use]
    pub fn from_store(store: &RecipeStore) -> Self {
        Self {
            recipes: store
                .all()
                .map(|record| (record.name().to_string(), record.clone()))
                .collect(),
            inventory: store
                .inventory()
                .iter()
                .map(|(name, qty)| (name.to_string(), i64::try_from(qty).unwrap_or(i64::MAX)))
                .collect(),
        }
    }

    /// Parses and validates JSON text.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::MalformedInput(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Renders indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Checks every record against its key and the kind invariant.
    pub fn validate(&self) -> StoreResult<()> {
        for (key, record) in &self.recipes {
            record.validate(key)?;
        }
        Ok(())
    }

    /// Builds a store from a validated snapshot.
    pub fn into_store(self) -> StoreResult<RecipeStore> {
        self.validate()?;

        let mut inventory = Inventory::new();
        for (name, qty) in self.inventory {
            inventory.set(name, qty);
        }
        let recipes: HashMap<String, ItemRecord> = self.recipes.into_iter().collect();

        Ok(RecipeStore::from_parts(recipes, inventory))
    }
}

impl RecipeStore {
    /// Copies the store into its exchanged shape.
    #[must_use]
    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::from_store(self)
    }

    /// Replaces the whole store with a snapshot.
    ///
    /// On error the store keeps its previous contents.
    pub fn load_snapshot(&mut self, snapshot: StoreSnapshot) -> StoreResult<()> {
        match snapshot.into_store() {
            Ok(loaded) => {
                *self = loaded;
                let counts = self.counts();
                info!(
                    "Loaded {} record(s) and {} inventory entries",
                    counts.recipes, counts.inventory
                );
                Ok(())
            },
            Err(e) => {
                warn!("Rejected store snapshot: {e}");
                Err(e)
            },
        }
    }

    /// Parses JSON and replaces the store with it.
    ///
    /// On error the store keeps its previous contents.
    pub fn load_json(&mut self, json: &str) -> StoreResult<()> {
        let snapshot = StoreSnapshot::from_json(json).map_err(|e| {
            warn!("Rejected store JSON: {e}");
            e
        })?;
        self.load_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemMetadata, RecipeDraft};

    fn bakery() -> RecipeStore {
        let mut store = RecipeStore::new();
        store.upsert_basic("Flour", ItemMetadata::default().icon("fa-cube"));
        store.upsert_basic("Water", ItemMetadata::default());
        store.upsert_composite(
            "Bread",
            RecipeDraft::new()
                .base_quantity(2)
                .ingredient("Flour", 2)
                .ingredient("Water", 1)
                .metadata(ItemMetadata::default().description("Daily loaf").category("bakery")),
        );
        store.set_inventory("Flour", 10);
        store.set_inventory("Water", 0);
        store
    }

    #[test]
    fn test_round_trip() {
        let store = bakery();
        let json = store.to_snapshot().to_json_pretty().expect("serialize");

        let mut restored = RecipeStore::new();
        restored.load_json(&json).expect("load");
        assert_eq!(restored, store);

        let again = restored.to_snapshot().to_json_pretty().expect("serialize");
        assert_eq!(again, json);
    }

    #[test]
    fn test_parse_wire_format() {
        let json = r#"{
            "recipes": {
                "Flour": { "name": "Flour", "type": "basic", "icon": "fa-cube" },
                "Bread": {
                    "name": "Bread",
                    "type": "recipe",
                    "baseQuantity": 1,
                    "ingredients": { "Flour": 2, "Water": 1 },
                    "icon": "fa-bread-slice",
                    "description": "",
                    "category": "default"
                }
            },
            "inventory": { "Flour": 10, "Water": -4 }
        }"#;

        let mut store = RecipeStore::new();
        store.load_json(json).expect("load");

        assert_eq!(store.counts().recipes, 2);
        assert!(store.get("Bread").is_some_and(|r| r.is_composite()));
        assert_eq!(store.get_inventory("Flour"), 10);
        assert_eq!(store.get_inventory("Water"), 0);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot = StoreSnapshot::from_json("{}").expect("parse");
        assert!(snapshot.into_store().expect("store").is_empty());
    }

    #[test]
    fn test_rejected_load_keeps_state() {
        let mut store = bakery();
        let before = store.clone();

        let bad_shape = r#"{ "recipes": [1, 2, 3] }"#;
        assert!(matches!(
            store.load_json(bad_shape),
            Err(StoreError::MalformedInput(_))
        ));
        assert!(matches!(
            store.load_json("not json"),
            Err(StoreError::MalformedInput(_))
        ));

        let bad_record = r#"{ "recipes": { "Cake": { "name": "Cake", "type": "recipe" } } }"#;
        assert!(matches!(
            store.load_json(bad_record),
            Err(StoreError::MalformedInput(_))
        ));

        assert_eq!(store, before);
    }

    #[test]
    fn test_rejects_zero_amounts() {
        let json = r#"{ "recipes": { "Tea": {
            "name": "Tea", "type": "recipe", "ingredients": { "Leaf": 0 }
        } } }"#;
        assert!(matches!(
            StoreSnapshot::from_json(json),
            Err(StoreError::MalformedInput(_))
        ));
    }
}
