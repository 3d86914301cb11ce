//! Traversal state shared by every walk over the recipe graph.

use std::fmt;

use craftbook_common::{ResolveError, ResolveResult};

/// Default bound on the number of nested recipes along one ingredient chain.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Largest depth bound every walker completes on an 8 MiB stack.
pub const MAX_SUPPORTED_DEPTH: usize = 4_096;

/// Limits applied while walking the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveLimits {
    /// Maximum number of recipes on a single ancestor chain.
    pub max_depth: usize,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolveLimits {
    /// Limits with the given depth bound.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// A branch pruned because its name already appears among its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDiagnostic {
    /// Names from the top-level request down to the repeated name.
    pub path: Vec<String>,
}

impl CycleDiagnostic {
    /// The name that closed the cycle.
    #[must_use]
    pub fn repeated(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }
}

impl fmt::Display for CycleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle detected: {}", self.path.join(" -> "))
    }
}

/// One recipe on the current ancestor chain.
///
/// Frames live on the call stack and point at their parent, so each branch
/// sees exactly its own ancestors and siblings never share entries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathFrame<'p> {
    name: &'p str,
    parent: Option<&'p PathFrame<'p>>,
    depth: usize,
}

impl<'p> PathFrame<'p> {
    /// Pushes `name` below `parent`, enforcing the depth limit.
    pub(crate) fn descend(
        parent: Option<&'p PathFrame<'p>>,
        name: &'p str,
        limits: ResolveLimits,
    ) -> ResolveResult<Self> {
        let depth = parent.map_or(0, |p| p.depth) + 1;
        if depth > limits.max_depth {
            return Err(ResolveError::RecursionLimitExceeded {
                item: name.to_string(),
                max_depth: limits.max_depth,
            });
        }
        Ok(Self {
            name,
            parent,
            depth,
        })
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.ancestors().any(|frame| frame.name == name)
    }

    fn ancestors(&self) -> impl Iterator<Item = &PathFrame<'p>> {
        std::iter::successors(Some(self), |frame| frame.parent)
    }

    /// Builds the diagnostic for `name` re-entering this chain.
    pub(crate) fn cycle_to(&self, name: &str) -> CycleDiagnostic {
        let mut path: Vec<String> = self.ancestors().map(|f| f.name.to_string()).collect();
        path.reverse();
        path.push(name.to_string());
        CycleDiagnostic { path }
    }
}

/// Checks whether `name` is already on the chain ending at `path`.
pub(crate) fn closes_cycle(path: Option<&PathFrame<'_>>, name: &str) -> Option<CycleDiagnostic> {
    path.filter(|frame| frame.contains(name))
        .map(|frame| frame.cycle_to(name))
}

/// Amount of an ingredient needed for `quantity` units of a recipe that
/// yields `base_quantity` units per batch: `ceil(amount * quantity / base)`.
///
/// Exact integer arithmetic; `None` when the result exceeds `u64`.
pub(crate) fn scaled_amount(amount: u32, quantity: u64, base_quantity: u32) -> Option<u64> {
    let numerator = u128::from(amount) * u128::from(quantity);
    let base = u128::from(base_quantity.max(1));
    u64::try_from(numerator.div_ceil(base)).ok()
}
