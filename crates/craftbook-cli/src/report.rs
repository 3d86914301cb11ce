//! Plain-text rendering of store contents and query results.

use std::io::{self, Write};

use craftbook_core::{
    CycleDiagnostic, DependencyKind, DependencyNode, Expansion, ItemRecord, RecipeStore,
    RequirementReport,
};

/// Writes one line per record: kind, name, and ingredients for recipes.
pub fn write_records(out: &mut impl Write, title: &str, records: &[&ItemRecord]) -> io::Result<()> {
    writeln!(out, "{title} ({})", records.len())?;
    for record in records {
        if record.is_composite() {
            writeln!(
                out,
                "  {} -> {} [{}]",
                record.name(),
                record.base_quantity(),
                ingredient_list(record)
            )?;
        } else {
            writeln!(out, "  {}", record.name())?;
        }
    }
    Ok(())
}

/// Writes inventory entries in name order.
pub fn write_inventory(out: &mut impl Write, store: &RecipeStore) -> io::Result<()> {
    let mut entries: Vec<(&str, u64)> = store.inventory().iter().collect();
    entries.sort_unstable();

    writeln!(out, "Inventory ({})", entries.len())?;
    for (name, qty) in entries {
        writeln!(out, "  {name}: {qty}")?;
    }
    Ok(())
}

/// Writes every detail of one record.
pub fn write_record(out: &mut impl Write, store: &RecipeStore, record: &ItemRecord) -> io::Result<()> {
    writeln!(out, "{} ({})", record.name(), record.kind().display_name())?;

    let metadata = record.metadata();
    if let Some(icon) = &metadata.icon {
        writeln!(out, "  Icon: {icon}")?;
    }
    if let Some(category) = &metadata.category {
        writeln!(out, "  Category: {category}")?;
    }
    if let Some(description) = metadata.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "  Description: {description}")?;
    }

    if record.is_composite() {
        writeln!(out, "  Yields: {}", record.base_quantity())?;
        writeln!(out, "  Ingredients:")?;
        for (name, amount) in record.ingredients() {
            writeln!(out, "    {name} x{amount}")?;
        }
    }

    writeln!(out, "  In stock: {}", store.get_inventory(record.name()))?;

    let dependents = store.dependents(record.name());
    if !dependents.is_empty() {
        writeln!(out, "  Used by: {}", dependents.join(", "))?;
    }
    Ok(())
}

/// Writes base material totals.
pub fn write_expansion(out: &mut impl Write, heading: &str, expansion: &Expansion) -> io::Result<()> {
    writeln!(out, "{heading}")?;
    if expansion.is_empty() {
        writeln!(out, "  (nothing)")?;
    }
    for (item, qty) in expansion.iter() {
        writeln!(out, "  {item}: {qty}")?;
    }
    write_cycles(out, expansion.cycles())
}

/// Writes need, stock, and shortfall per base item.
pub fn write_requirements(out: &mut impl Write, report: &RequirementReport) -> io::Result<()> {
    writeln!(out, "Requirements for {} x{}", report.target, report.quantity)?;
    for line in &report.lines {
        if line.is_sufficient() {
            writeln!(out, "  {}: {} / {} ok", line.item, line.needed, line.on_hand)?;
        } else {
            writeln!(
                out,
                "  {}: {} / {} short {}",
                line.item,
                line.needed,
                line.on_hand,
                line.shortfall()
            )?;
        }
    }
    if report.is_sufficient() {
        writeln!(out, "All materials on hand")?;
    }
    write_cycles(out, &report.cycles)
}

/// Writes an indented ingredient tree.
pub fn write_tree(out: &mut impl Write, root: &DependencyNode) -> io::Result<()> {
    write_tree_node(out, root, 0)
}

fn write_tree_node(out: &mut impl Write, node: &DependencyNode, depth: usize) -> io::Result<()> {
    let marker = match node.kind {
        DependencyKind::Leaf => "",
        DependencyKind::Composite => ":",
        DependencyKind::Cycle => " (cycle)",
    };
    writeln!(
        out,
        "{:indent$}{} x{}{marker}",
        "",
        node.name,
        node.quantity,
        indent = depth * 2
    )?;
    for child in &node.children {
        write_tree_node(out, child, depth + 1)?;
    }
    Ok(())
}

/// Writes a warning line per pruned cycle.
pub fn write_cycles(out: &mut impl Write, cycles: &[CycleDiagnostic]) -> io::Result<()> {
    for cycle in cycles {
        writeln!(out, "warning: {cycle}")?;
    }
    Ok(())
}

fn ingredient_list(record: &ItemRecord) -> String {
    record
        .ingredients()
        .iter()
        .map(|(name, amount)| format!("{name} x{amount}"))
        .collect::<Vec<_>>()
        .join(", ")
}
