//! # Craftbook Core
//!
//! Recipe graph resolution for Craftbook.
//!
//! This crate provides the in-memory model and every derived query:
//! - Item records and the recipe store (with inventory)
//! - Expansion of a recipe into base materials
//! - Transitive dependency enumeration
//! - Maximum craftable quantity from stock
//! - JSON snapshot of the store
//! - Lock-guarded handle for multi-threaded hosts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod craftability;
pub mod dependencies;
pub mod expander;
pub mod graph;
pub mod inventory;
pub mod item;
pub mod shared;
pub mod snapshot;
pub mod store;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::craftability::*;
    pub use crate::dependencies::*;
    pub use crate::expander::*;
    pub use crate::graph::{CycleDiagnostic, ResolveLimits, DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH};
    pub use crate::inventory::*;
    pub use crate::item::*;
    pub use crate::shared::*;
    pub use crate::snapshot::*;
    pub use crate::store::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn bakery() -> RecipeStore {
        let mut store = RecipeStore::new();
        store.upsert_basic("Flour", ItemMetadata::default());
        store.upsert_basic("Water", ItemMetadata::default());
        store.upsert_basic("Sugar", ItemMetadata::default());
        store.upsert_composite(
            "Bread",
            RecipeDraft::new().ingredient("Flour", 2).ingredient("Water", 1),
        );
        store.upsert_composite(
            "Cake",
            RecipeDraft::new().ingredient("Bread", 2).ingredient("Sugar", 1),
        );
        store
    }

    #[test]
    fn test_cake_breakdown() {
        let store = bakery();
        let cake = Expander::new(&store).expand("Cake", 1).expect("expand");

        assert_eq!(cake.get("Flour"), 4);
        assert_eq!(cake.get("Water"), 2);
        assert_eq!(cake.get("Sugar"), 1);
        assert_eq!(cake.len(), 3);
    }

    #[test]
    fn test_cake_craftability_follows_stock() {
        let mut store = bakery();
        store.set_inventory("Flour", 8);
        store.set_inventory("Water", 4);
        store.set_inventory("Sugar", 1);

        let calc = CraftabilityCalculator::new(&store);
        assert_eq!(calc.max_craftable("Cake"), Ok(1));

        store.set_inventory("Sugar", 10);
        let calc = CraftabilityCalculator::new(&store);
        assert_eq!(calc.max_craftable("Cake"), Ok(2));
    }

    #[test]
    fn test_deleting_a_recipe_turns_it_into_a_leaf() {
        let mut store = bakery();
        store.delete("Bread");

        let cake = Expander::new(&store).expand("Cake", 1).expect("expand");
        assert_eq!(cake.get("Bread"), 2);
        assert_eq!(cake.get("Flour"), 0);
        assert_eq!(store.dependents("Bread"), vec!["Cake"]);
    }
}
