//! How much of a recipe the current inventory can produce.

use craftbook_common::ResolveResult;
use tracing::debug;

use crate::expander::{Expander, Expansion};
use crate::graph::{CycleDiagnostic, ResolveLimits};
use crate::store::{Node, RecipeStore};

/// Need versus stock for one base item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementLine {
    /// Base item name.
    pub item: String,
    /// Units required.
    pub needed: u64,
    /// Units on hand.
    pub on_hand: u64,
}

impl RequirementLine {
    /// Units still missing.
    #[must_use]
    pub const fn shortfall(&self) -> u64 {
        self.needed.saturating_sub(self.on_hand)
    }

    /// Whether stock covers the need.
    #[must_use]
    pub const fn is_sufficient(&self) -> bool {
        self.on_hand >= self.needed
    }
}

/// Base materials for a request checked against the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementReport {
    /// Requested item.
    pub target: String,
    /// Requested units.
    pub quantity: u64,
    /// One line per base item, in name order.
    pub lines: Vec<RequirementLine>,
    /// Branches pruned during expansion.
    pub cycles: Vec<CycleDiagnostic>,
}

impl RequirementReport {
    /// Whether every line is covered by stock.
    #[must_use]
    pub fn is_sufficient(&self) -> bool {
        self.lines.iter().all(RequirementLine::is_sufficient)
    }

    /// Lines that are not covered.
    pub fn shortfalls(&self) -> impl Iterator<Item = &RequirementLine> {
        self.lines.iter().filter(|line| !line.is_sufficient())
    }
}

/// Computes craftable quantities from the store's inventory.
#[derive(Debug, Clone, Copy)]
pub struct CraftabilityCalculator<'a> {
    store: &'a RecipeStore,
    limits: ResolveLimits,
}

impl<'a> CraftabilityCalculator<'a> {
    /// Creates a calculator with default limits.
    #[must_use]
    pub fn new(store: &'a RecipeStore) -> Self {
        Self::with_limits(store, ResolveLimits::default())
    }

    /// Creates a calculator with explicit limits.
    #[must_use]
    pub const fn with_limits(store: &'a RecipeStore, limits: ResolveLimits) -> Self {
        Self { store, limits }
    }

    /// Maximum whole units of `name` producible from current stock.
    ///
    /// Basic, unknown, and unresolvable recipes yield zero.
    pub fn max_craftable(&self, name: &str) -> ResolveResult<u64> {
        let max = self
            .per_ingredient_capacity(name)?
            .into_iter()
            .map(|(_, possible)| possible)
            .min()
            .unwrap_or(0);
        debug!("Max craftable for '{name}': {max}");
        Ok(max)
    }

    /// Base items that cap [`Self::max_craftable`], in name order.
    pub fn limiting_ingredients(&self, name: &str) -> ResolveResult<Vec<String>> {
        let capacity = self.per_ingredient_capacity(name)?;
        let Some(min) = capacity.iter().map(|(_, possible)| *possible).min() else {
            return Ok(Vec::new());
        };
        Ok(capacity
            .into_iter()
            .filter(|(_, possible)| *possible == min)
            .map(|(item, _)| item)
            .collect())
    }

    /// Units of `name` each base item could support on its own.
    ///
    /// For one batch needing `needed` units of an item with `available` in
    /// stock, the item supports `floor(available * base_quantity / needed)`.
    fn per_ingredient_capacity(&self, name: &str) -> ResolveResult<Vec<(String, u64)>> {
        let Node::Composite(recipe) = self.store.node(name) else {
            return Ok(Vec::new());
        };

        let base = recipe.base_quantity();
        let batch = self.expander().expand(name, u64::from(base))?;

        Ok(batch
            .into_totals()
            .into_iter()
            .map(|(item, needed)| {
                let available = self.store.get_inventory(&item);
                let possible = batch_capacity(available, needed, base);
                (item, possible)
            })
            .collect())
    }

    /// Base materials for `quantity` units of `name` with stock levels.
    pub fn requirements(&self, name: &str, quantity: u64) -> ResolveResult<RequirementReport> {
        let expansion = self.expander().expand(name, quantity)?;
        Ok(self.report(name, quantity, expansion))
    }

    fn report(&self, name: &str, quantity: u64, expansion: Expansion) -> RequirementReport {
        let lines = expansion
            .iter()
            .map(|(item, needed)| RequirementLine {
                item: item.to_string(),
                needed,
                on_hand: self.store.get_inventory(item),
            })
            .collect();

        RequirementReport {
            target: name.to_string(),
            quantity,
            lines,
            cycles: expansion.cycles().to_vec(),
        }
    }

    fn expander(&self) -> Expander<'a> {
        Expander::with_limits(self.store, self.limits)
    }
}

fn batch_capacity(available: u64, needed: u64, base_quantity: u32) -> u64 {
    if needed == 0 {
        return u64::MAX;
    }
    let possible = u128::from(available) * u128::from(base_quantity) / u128::from(needed);
    u64::try_from(possible).unwrap_or(u64::MAX)
}
