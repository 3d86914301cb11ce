//! Item and recipe records.
//!
//! This module provides:
//! - The record kept for every named item (basic or composite)
//! - Display metadata that travels with a record but never affects resolution
//! - A builder for composite recipes before they are written to the store

use std::collections::BTreeMap;

use craftbook_common::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Yield size assumed when a recipe does not state one.
pub const DEFAULT_BASE_QUANTITY: u32 = 1;

const fn default_base_quantity() -> u32 {
    DEFAULT_BASE_QUANTITY
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_default_base_quantity(value: &u32) -> bool {
    *value == DEFAULT_BASE_QUANTITY
}

// ============================================================================
// Item Kind
// ============================================================================

/// Whether an item is irreducible or produced from other items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemKind {
    /// Leaf item with no ingredients.
    #[default]
    #[serde(rename = "basic")]
    Basic,
    /// Item produced from other items in fixed ratios.
    #[serde(rename = "recipe")]
    Composite,
}

impl ItemKind {
    /// Get display name for this kind.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Composite => "Recipe",
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Opaque display metadata. Carried through the store and snapshots as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Icon identifier chosen by the front end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ItemMetadata {
    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

// ============================================================================
// Item Record
// ============================================================================

/// A named item as held by the store.
///
/// `kind == Basic` exactly when `ingredients` is empty. Records built through
/// [`ItemRecord::basic`] and [`ItemRecord::composite`] always satisfy this;
/// records read from a snapshot are checked by [`ItemRecord::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) kind: ItemKind,
    #[serde(
        default = "default_base_quantity",
        skip_serializing_if = "is_default_base_quantity"
    )]
    pub(crate) base_quantity: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) ingredients: BTreeMap<String, u32>,
    #[serde(flatten)]
    pub(crate) metadata: ItemMetadata,
}

impl ItemRecord {
    /// Creates a basic (leaf) item.
    #[must_use]
    pub fn basic(name: impl Into<String>, metadata: ItemMetadata) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Basic,
            base_quantity: DEFAULT_BASE_QUANTITY,
            ingredients: BTreeMap::new(),
            metadata,
        }
    }

    /// Creates a record from a recipe draft.
    ///
    /// Zero amounts are dropped and a zero base quantity falls back to the
    /// default. A draft left with no ingredients becomes a basic item.
    #[must_use]
    pub fn composite(name: impl Into<String>, draft: RecipeDraft) -> Self {
        let ingredients: BTreeMap<String, u32> = draft
            .ingredients
            .into_iter()
            .filter(|(_, amount)| *amount > 0)
            .collect();
        let kind = if ingredients.is_empty() {
            ItemKind::Basic
        } else {
            ItemKind::Composite
        };

        Self {
            name: name.into(),
            kind,
            base_quantity: if draft.base_quantity == 0 {
                DEFAULT_BASE_QUANTITY
            } else {
                draft.base_quantity
            },
            ingredients,
            metadata: draft.metadata,
        }
    }

    /// Unique name of this item.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of this item.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Whether this is a leaf item.
    #[must_use]
    pub fn is_basic(&self) -> bool {
        self.kind == ItemKind::Basic
    }

    /// Whether this item is produced from ingredients.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.kind == ItemKind::Composite
    }

    /// Units produced by one pass over the ingredient list.
    #[must_use]
    pub const fn base_quantity(&self) -> u32 {
        self.base_quantity
    }

    /// Ingredient amounts per batch of `base_quantity` units.
    #[must_use]
    pub fn ingredients(&self) -> &BTreeMap<String, u32> {
        &self.ingredients
    }

    /// Whether the ingredient list mentions `name`.
    #[must_use]
    pub fn uses(&self, name: &str) -> bool {
        self.ingredients.contains_key(name)
    }

    /// Display metadata.
    #[must_use]
    pub fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }

    /// Same record under another name.
    #[must_use]
    pub(crate) fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Checks the record read from untrusted input against its map key.
    pub fn validate(&self, key: &str) -> StoreResult<()> {
        if self.name != key {
            return Err(StoreError::MalformedInput(format!(
                "record '{}' is stored under key '{key}'",
                self.name
            )));
        }

        if self.base_quantity == 0 {
            return Err(StoreError::MalformedInput(format!(
                "record '{key}' has zero baseQuantity"
            )));
        }

        if let Some((ingredient, _)) = self.ingredients.iter().find(|(_, amount)| **amount == 0) {
            return Err(StoreError::MalformedInput(format!(
                "record '{key}' needs zero of '{ingredient}'"
            )));
        }

        match (self.kind, self.ingredients.is_empty()) {
            (ItemKind::Basic, false) => Err(StoreError::MalformedInput(format!(
                "basic item '{key}' lists ingredients"
            ))),
            (ItemKind::Composite, true) => Err(StoreError::MalformedInput(format!(
                "recipe '{key}' has no ingredients"
            ))),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Recipe Draft
// ============================================================================

/// Builder for a composite recipe prior to [`crate::RecipeStore::upsert_composite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    base_quantity: u32,
    ingredients: BTreeMap<String, u32>,
    metadata: ItemMetadata,
}

impl Default for RecipeDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeDraft {
    /// Creates an empty draft yielding one unit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_quantity: DEFAULT_BASE_QUANTITY,
            ingredients: BTreeMap::new(),
            metadata: ItemMetadata::default(),
        }
    }

    /// Sets the batch yield.
    #[must_use]
    pub const fn base_quantity(mut self, quantity: u32) -> Self {
        self.base_quantity = quantity;
        self
    }

    /// Adds an ingredient. Repeating a name replaces its amount.
    #[must_use]
    pub fn ingredient(mut self, name: impl Into<String>, amount: u32) -> Self {
        self.ingredients.insert(name.into(), amount);
        self
    }

    /// Sets the display metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Rejects a recipe that would list itself as an ingredient.
    pub fn validate(&self, name: &str) -> StoreResult<()> {
        if self.ingredients.contains_key(name) {
            return Err(StoreError::SelfReference(name.to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
