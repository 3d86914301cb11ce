//! Recursive expansion of a recipe into base materials.
//!
//! Expanding `quantity` units of a recipe scales every ingredient by
//! `quantity / base_quantity`, rounds up, and recurses until only basic (or
//! unknown) items remain. Rounding happens once per level, so a nested
//! recipe is always produced in whole batches of its own ingredients.

use std::collections::BTreeMap;

use craftbook_common::{ResolveError, ResolveResult};
use tracing::{debug, warn};

use crate::graph::{closes_cycle, scaled_amount, CycleDiagnostic, PathFrame, ResolveLimits};
use crate::store::{Node, RecipeStore};

/// Base materials required for a request, plus any pruned cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    totals: BTreeMap<String, u64>,
    cycles: Vec<CycleDiagnostic>,
}

impl Expansion {
    /// Required quantity per base item.
    #[must_use]
    pub fn totals(&self) -> &BTreeMap<String, u64> {
        &self.totals
    }

    /// Required quantity of one base item; zero when not required.
    #[must_use]
    pub fn get(&self, item: &str) -> u64 {
        self.totals.get(item).copied().unwrap_or(0)
    }

    /// Number of distinct base items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Whether no base item is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Iterates base items in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.totals.iter().map(|(name, &qty)| (name.as_str(), qty))
    }

    /// Branches dropped because they re-entered their own ancestry.
    #[must_use]
    pub fn cycles(&self) -> &[CycleDiagnostic] {
        &self.cycles
    }

    /// Whether any branch was dropped.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Consumes the expansion, keeping only the totals.
    #[must_use]
    pub fn into_totals(self) -> BTreeMap<String, u64> {
        self.totals
    }

    fn add(&mut self, item: &str, quantity: u64) -> ResolveResult<()> {
        let slot = self.totals.entry(item.to_string()).or_insert(0);
        *slot = slot
            .checked_add(quantity)
            .ok_or_else(|| ResolveError::QuantityOverflow {
                item: item.to_string(),
            })?;
        Ok(())
    }
}

/// Expands recipes read from a borrowed store.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    store: &'a RecipeStore,
    limits: ResolveLimits,
}

impl<'a> Expander<'a> {
    /// Creates an expander with default limits.
    #[must_use]
    pub fn new(store: &'a RecipeStore) -> Self {
        Self::with_limits(store, ResolveLimits::default())
    }

    /// Creates an expander with explicit limits.
    #[must_use]
    pub const fn with_limits(store: &'a RecipeStore, limits: ResolveLimits) -> Self {
        Self { store, limits }
    }

    /// Resolves `quantity` units of `name` into base materials.
    ///
    /// Unknown names and basic items resolve to themselves. A name that
    /// re-enters its own ancestry contributes nothing and is recorded in
    /// [`Expansion::cycles`].
    pub fn expand(&self, name: &str, quantity: u64) -> ResolveResult<Expansion> {
        let mut expansion = Expansion::default();
        self.expand_into(name, quantity, None, &mut expansion)?;
        debug!(
            "Expanded {quantity} x '{name}' into {} base item(s)",
            expansion.len()
        );
        Ok(expansion)
    }

    /// Resolves several requests into one combined expansion.
    pub fn expand_many(&self, targets: &[(&str, u64)]) -> ResolveResult<Expansion> {
        let mut expansion = Expansion::default();
        for &(name, quantity) in targets {
            self.expand_into(name, quantity, None, &mut expansion)?;
        }
        Ok(expansion)
    }

    fn expand_into<'p>(
        &self,
        name: &'p str,
        quantity: u64,
        path: Option<&'p PathFrame<'p>>,
        out: &mut Expansion,
    ) -> ResolveResult<()> {
        if let Some(cycle) = closes_cycle(path, name) {
            warn!("{cycle}");
            out.cycles.push(cycle);
            return Ok(());
        }

        let recipe = match self.store.node(name) {
            Node::Leaf => return out.add(name, quantity),
            Node::Composite(recipe) => recipe,
        };

        let frame = PathFrame::descend(path, name, self.limits)?;
        for (ingredient, &amount) in recipe.ingredients() {
            let needed = scaled_amount(amount, quantity, recipe.base_quantity()).ok_or_else(
                || ResolveError::QuantityOverflow {
                    item: ingredient.clone(),
                },
            )?;
            self.expand_into(ingredient, needed, Some(&frame), out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemMetadata, RecipeDraft};
    use proptest::prelude::*;

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

    fn totals(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_nested_expansion() {
        let store = bakery();
        let cake = Expander::new(&store).expand("Cake", 1).expect("expand");
        assert_eq!(
            cake.totals(),
            &totals(&[("Flour", 4), ("Water", 2), ("Sugar", 1)])
        );
        assert!(!cake.has_cycles());
    }

    #[test]
    fn test_basic_and_unknown_are_leaves() {
        let store = bakery();
        let expander = Expander::new(&store);
        assert_eq!(
            expander.expand("Flour", 7).expect("expand").totals(),
            &totals(&[("Flour", 7)])
        );
        assert_eq!(
            expander.expand("Ghost", 3).expect("expand").totals(),
            &totals(&[("Ghost", 3)])
        );
    }

    #[test]
    fn test_dangling_ingredient() {
        let mut store = RecipeStore::new();
        store.upsert_composite("Rope", RecipeDraft::new().base_quantity(2).ingredient("Fiber", 3));

        let rope = Expander::new(&store).expand("Rope", 5).expect("expand");
        // ceil(3 * 5 / 2) = 8
        assert_eq!(rope.totals(), &totals(&[("Fiber", 8)]));
    }

    #[test]
    fn test_ceiling_applies_per_level() {
        let mut store = RecipeStore::new();
        store.upsert_composite("Dough", RecipeDraft::new().base_quantity(3).ingredient("Flour", 1));
        store.upsert_composite("Bun", RecipeDraft::new().base_quantity(2).ingredient("Dough", 1));

        // Bun x1 -> ceil(1/2) = 1 Dough -> ceil(1/3) = 1 Flour
        let bun = Expander::new(&store).expand("Bun", 1).expect("expand");
        assert_eq!(bun.get("Flour"), 1);
    }

    #[test]
    fn test_two_node_cycle_is_empty() {
        let mut store = RecipeStore::new();
        store.upsert_composite("A", RecipeDraft::new().ingredient("B", 1));
        store.upsert_composite("B", RecipeDraft::new().ingredient("A", 1));

        let a = Expander::new(&store).expand("A", 1).expect("expand");
        assert!(a.is_empty());
        assert_eq!(a.cycles().len(), 1);
        assert_eq!(a.cycles()[0].path, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_cycle_prunes_only_its_branch() {
        let mut store = RecipeStore::new();
        store.upsert_composite(
            "A",
            RecipeDraft::new().ingredient("B", 1).ingredient("Ore", 2),
        );
        store.upsert_composite("B", RecipeDraft::new().ingredient("A", 1));

        let a = Expander::new(&store).expand("A", 1).expect("expand");
        assert_eq!(a.totals(), &totals(&[("Ore", 2)]));
        assert!(a.has_cycles());
    }

    #[test]
    fn test_shared_ingredient_across_siblings_is_not_a_cycle() {
        let mut store = RecipeStore::new();
        store.upsert_composite("Left", RecipeDraft::new().ingredient("Gear", 1));
        store.upsert_composite("Right", RecipeDraft::new().ingredient("Gear", 1));
        store.upsert_composite("Gear", RecipeDraft::new().ingredient("Iron", 2));
        store.upsert_composite(
            "Clock",
            RecipeDraft::new().ingredient("Left", 1).ingredient("Right", 1),
        );

        let clock = Expander::new(&store).expand("Clock", 1).expect("expand");
        assert_eq!(clock.totals(), &totals(&[("Iron", 4)]));
        assert!(!clock.has_cycles());
    }

    #[test]
    fn test_recursion_limit() {
        let store = bakery();
        let shallow = Expander::with_limits(&store, ResolveLimits::with_max_depth(1));

        assert!(shallow.expand("Bread", 1).is_ok());
        assert_eq!(
            shallow.expand("Cake", 1),
            Err(ResolveError::RecursionLimitExceeded {
                item: "Bread".to_string(),
                max_depth: 1,
            })
        );
    }

    #[test]
    fn test_quantity_overflow() {
        let mut store = RecipeStore::new();
        store.upsert_composite("Big", RecipeDraft::new().ingredient("Dust", u32::MAX));

        assert!(matches!(
            Expander::new(&store).expand("Big", u64::MAX),
            Err(ResolveError::QuantityOverflow { .. })
        ));
    }

    #[test]
    fn test_expand_many_sums_targets() {
        let store = bakery();
        let list = Expander::new(&store)
            .expand_many(&[("Bread", 1), ("Cake", 1)])
            .expect("expand");
        assert_eq!(
            list.totals(),
            &totals(&[("Flour", 6), ("Water", 3), ("Sugar", 1)])
        );
    }

    proptest! {
        #[test]
        fn prop_basic_expands_to_itself(q in 0u64..1_000_000_000) {
            let store = bakery();
            let flour = Expander::new(&store).expand("Flour", q).expect("expand");
            prop_assert_eq!(flour.totals(), &totals(&[("Flour", q)]));
        }

        #[test]
        fn prop_single_ingredient_scales_with_ceiling(
            amount in 1u32..1_000,
            base in 1u32..100,
            q in 0u64..100_000,
        ) {
            let mut store = RecipeStore::new();
            store.upsert_composite(
                "R",
                RecipeDraft::new().base_quantity(base).ingredient("I", amount),
            );

            let expected = (u64::from(amount) * q).div_ceil(u64::from(base));
            let r = Expander::new(&store).expand("R", q).expect("expand");
            prop_assert_eq!(r.get("I"), expected);
        }
    }
}
