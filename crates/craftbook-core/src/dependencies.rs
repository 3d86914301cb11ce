//! Transitive ingredient enumeration.

use std::collections::BTreeSet;

use craftbook_common::{ResolveError, ResolveResult};
use tracing::warn;

use crate::graph::{closes_cycle, scaled_amount, CycleDiagnostic, PathFrame, ResolveLimits};
use crate::store::{Node, RecipeStore};

/// Every ingredient name reachable from a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    names: BTreeSet<String>,
    cycles: Vec<CycleDiagnostic>,
}

impl Dependencies {
    /// Reachable names in sorted order.
    #[must_use]
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Whether `name` is reachable.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of reachable names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is reachable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Chains cut short because they re-entered their own ancestry.
    #[must_use]
    pub fn cycles(&self) -> &[CycleDiagnostic] {
        &self.cycles
    }
}

/// How a node in a [`DependencyNode`] tree resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Basic or unknown item.
    Leaf,
    /// Recipe whose children are listed.
    Composite,
    /// Name already on the ancestor chain; not expanded further.
    Cycle,
}

/// One entry of an ingredient tree with the amount needed at that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Item name.
    pub name: String,
    /// Units needed at this point of the tree.
    pub quantity: u64,
    /// How the name resolved.
    pub kind: DependencyKind,
    /// Ingredients, in name order. Empty unless `kind` is `Composite`.
    pub children: Vec<DependencyNode>,
}

/// Walks ingredient relationships without tracking totals.
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'a> {
    store: &'a RecipeStore,
    limits: ResolveLimits,
}

impl<'a> DependencyResolver<'a> {
    /// Creates a resolver with default limits.
    #[must_use]
    pub fn new(store: &'a RecipeStore) -> Self {
        Self::with_limits(store, ResolveLimits::default())
    }

    /// Creates a resolver with explicit limits.
    #[must_use]
    pub const fn with_limits(store: &'a RecipeStore, limits: ResolveLimits) -> Self {
        Self { store, limits }
    }

    /// Ingredients listed directly by `name`, in name order.
    #[must_use]
    pub fn direct_dependencies(&self, name: &str) -> Vec<&'a str> {
        match self.store.node(name) {
            Node::Leaf => Vec::new(),
            Node::Composite(recipe) => recipe.ingredients().keys().map(String::as_str).collect(),
        }
    }

    /// Transitive closure of ingredient names reachable from `name`.
    ///
    /// An ingredient that closes a cycle is included, but the walk does not
    /// descend into it again; the chain is recorded in
    /// [`Dependencies::cycles`].
    pub fn dependencies(&self, name: &str) -> ResolveResult<Dependencies> {
        let mut deps = Dependencies::default();
        self.collect(name, None, &mut deps)?;
        Ok(deps)
    }

    fn collect<'p>(
        &self,
        name: &'p str,
        path: Option<&'p PathFrame<'p>>,
        out: &mut Dependencies,
    ) -> ResolveResult<()> {
        if let Some(cycle) = closes_cycle(path, name) {
            warn!("{cycle}");
            out.cycles.push(cycle);
            return Ok(());
        }

        let Node::Composite(recipe) = self.store.node(name) else {
            return Ok(());
        };

        let frame = PathFrame::descend(path, name, self.limits)?;
        for ingredient in recipe.ingredients().keys() {
            out.names.insert(ingredient.clone());
            self.collect(ingredient, Some(&frame), out)?;
        }
        Ok(())
    }

    /// Nested ingredient tree for `quantity` units of `name`.
    ///
    /// Amounts follow the same per-level rounding as the expander.
    pub fn dependency_tree(&self, name: &str, quantity: u64) -> ResolveResult<DependencyNode> {
        self.build_node(name, quantity, None)
    }

    fn build_node<'p>(
        &self,
        name: &'p str,
        quantity: u64,
        path: Option<&'p PathFrame<'p>>,
    ) -> ResolveResult<DependencyNode> {
        let leaf = |kind| DependencyNode {
            name: name.to_string(),
            quantity,
            kind,
            children: Vec::new(),
        };

        if closes_cycle(path, name).is_some() {
            return Ok(leaf(DependencyKind::Cycle));
        }

        let Node::Composite(recipe) = self.store.node(name) else {
            return Ok(leaf(DependencyKind::Leaf));
        };

        let frame = PathFrame::descend(path, name, self.limits)?;
        let children = recipe
            .ingredients()
            .iter()
            .map(|(ingredient, &amount)| {
                let needed = scaled_amount(amount, quantity, recipe.base_quantity()).ok_or_else(
                    || ResolveError::QuantityOverflow {
                        item: ingredient.clone(),
                    },
                )?;
                self.build_node(ingredient, needed, Some(&frame))
            })
            .collect::<ResolveResult<Vec<_>>>()?;

        Ok(DependencyNode {
            children,
            ..leaf(DependencyKind::Composite)
        })
    }
}
