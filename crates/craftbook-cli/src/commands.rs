//! Command-line surface and dispatch.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use craftbook_common::StoreError;
use craftbook_core::{
    CraftabilityCalculator, DependencyResolver, Expander, ItemMetadata, RecipeDraft, RecipeStore,
    ResolveLimits,
};
use tracing::{debug, info};

use crate::config::CraftbookConfig;
use crate::persistence::DataFile;
use crate::report;

#[derive(Parser, Debug)]
#[command(
    name = "craftbook",
    version,
    about = "Recipe book and crafting calculator",
    long_about = "Keeps a book of basic items and recipes plus an inventory, and answers \
                  what a recipe breaks down into and how much of it can be crafted."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to craftbook.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add or replace a basic item
    Basic {
        /// Item name
        name: String,

        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Add or replace a recipe
    Recipe {
        /// Recipe name
        name: String,

        /// Ingredient as NAME=AMOUNT (repeatable)
        #[arg(long = "ingredient", short = 'i', value_parser = parse_ingredient, required = true)]
        ingredients: Vec<Ingredient>,

        /// Units produced by one batch
        #[arg(long, default_value_t = 1)]
        base: u32,

        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Delete an item or recipe
    Delete {
        /// Item name
        name: String,

        /// Delete even when other recipes use it
        #[arg(long)]
        force: bool,
    },

    /// Copy a record under a new name
    Duplicate {
        /// Existing name
        source: String,
        /// New name
        target: String,
    },

    /// Move a record to a new name
    Rename {
        /// Existing name
        old: String,
        /// New name
        new: String,
    },

    /// Set the quantity on hand (negative values become 0)
    Stock {
        /// Item name
        name: String,
        /// Quantity on hand
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// List records and inventory
    List {
        /// Only basic items
        #[arg(long, conflicts_with = "recipes")]
        basic: bool,

        /// Only recipes
        #[arg(long)]
        recipes: bool,

        /// Include inventory
        #[arg(long)]
        inventory: bool,
    },

    /// Show one record in detail
    Show {
        /// Item name
        name: String,
    },

    /// Break targets down into base materials
    Expand {
        /// Target as NAME or NAME=QUANTITY (repeatable)
        #[arg(value_parser = parse_target, required = true)]
        targets: Vec<Target>,
    },

    /// List everything an item depends on
    Deps {
        /// Item name
        name: String,

        /// Only direct ingredients
        #[arg(long)]
        direct: bool,
    },

    /// Show the nested ingredient tree
    Tree {
        /// Item name
        name: String,

        /// Units requested
        #[arg(default_value_t = 1)]
        quantity: u64,
    },

    /// How many units the inventory can produce
    Craftable {
        /// Recipe name
        name: String,

        /// Also check stock for this many units
        #[arg(long)]
        check: Option<u64>,
    },

    /// Write the store to a JSON file
    Export {
        /// Destination path
        path: PathBuf,
    },

    /// Replace the store with a JSON file
    Import {
        /// Source path
        path: PathBuf,
    },

    /// Write a backup now
    Backup,

    /// List backups, oldest first
    Backups,

    /// Replace the store with a backup
    Restore {
        /// Backup file name as shown by `backups`
        file: String,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

/// Optional display metadata for `basic` and `recipe`.
#[derive(Args, Debug, Default)]
pub struct MetadataArgs {
    /// Icon identifier
    #[arg(long)]
    icon: Option<String>,

    /// Description
    #[arg(long)]
    description: Option<String>,

    /// Category
    #[arg(long)]
    category: Option<String>,
}

impl MetadataArgs {
    fn into_metadata(self) -> ItemMetadata {
        ItemMetadata {
            icon: self.icon,
            description: self.description,
            category: self.category,
        }
    }
}

/// One `NAME=AMOUNT` ingredient argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    name: String,
    amount: u32,
}

/// One `NAME[=QUANTITY]` expansion target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    quantity: u64,
}

fn parse_ingredient(arg: &str) -> Result<Ingredient, String> {
    let (name, amount) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing ingredient name in '{arg}'"));
    }
    let amount = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount in '{arg}': {e}"))?;
    Ok(Ingredient {
        name: name.to_string(),
        amount,
    })
}

fn parse_target(arg: &str) -> Result<Target, String> {
    let (name, quantity) = match arg.rsplit_once('=') {
        Some((name, qty)) => (
            name,
            qty.trim()
                .parse()
                .map_err(|e| format!("invalid quantity in '{arg}': {e}"))?,
        ),
        None => (arg, 1),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing item name in '{arg}'"));
    }
    Ok(Target {
        name: name.to_string(),
        quantity,
    })
}

/// A loaded store together with where it lives on disk.
pub struct Session {
    config: CraftbookConfig,
    config_path: PathBuf,
    data: DataFile,
    store: RecipeStore,
}

impl Session {
    /// Loads the data file named by the configuration.
    pub fn open(config: CraftbookConfig, config_path: PathBuf) -> Result<Self> {
        let data = DataFile::from_config(&config);
        let store = data
            .load()
            .with_context(|| format!("Failed to load {}", data.path().display()))?;
        let counts = store.counts();
        debug!(
            "Opened {} with {} record(s) and {} inventory entries",
            data.path().display(),
            counts.recipes,
            counts.inventory
        );
        Ok(Self {
            config,
            config_path,
            data,
            store,
        })
    }

    fn limits(&self) -> ResolveLimits {
        self.config.limits()
    }

    /// Runs one command, writing human-readable output to `out`.
    pub fn run(&mut self, command: Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::Basic { name, metadata } => {
                self.store.upsert_basic(name.as_str(), metadata.into_metadata());
                writeln!(out, "Saved basic item '{name}'")?;
                self.commit()?;
            },
            Command::Recipe {
                name,
                ingredients,
                base,
                metadata,
            } => {
                let draft = ingredients.into_iter().fold(
                    RecipeDraft::new()
                        .base_quantity(base)
                        .metadata(metadata.into_metadata()),
                    |draft, i| draft.ingredient(i.name, i.amount),
                );
                draft.validate(&name)?;
                self.store.upsert_composite(name.as_str(), draft);
                writeln!(out, "Saved recipe '{name}'")?;
                self.commit()?;
            },
            Command::Delete { name, force } => {
                if !self.store.contains(&name) {
                    return Err(StoreError::UnknownItem(name).into());
                }
                let dependents = self.store.dependents(&name);
                if !dependents.is_empty() && !force {
                    bail!(
                        "'{name}' is used by {}; pass --force to delete anyway",
                        dependents.join(", ")
                    );
                }
                self.store.delete(&name);
                writeln!(out, "Deleted '{name}'")?;
                self.commit()?;
            },
            Command::Duplicate { source, target } => {
                self.store.duplicate(&source, &target)?;
                writeln!(out, "Duplicated '{source}' as '{target}'")?;
                self.commit()?;
            },
            Command::Rename { old, new } => {
                self.store.rename(&old, &new)?;
                writeln!(out, "Renamed '{old}' to '{new}'")?;
                self.commit()?;
            },
            Command::Stock { name, quantity } => {
                self.store.set_inventory(name.as_str(), quantity);
                writeln!(out, "{name}: {}", self.store.get_inventory(&name))?;
                self.commit()?;
            },
            Command::List {
                basic,
                recipes,
                inventory,
            } => {
                if !recipes {
                    report::write_records(out, "Basic items", &self.store.basic_items())?;
                }
                if !basic {
                    report::write_records(out, "Recipes", &self.store.composite_recipes())?;
                }
                if inventory {
                    report::write_inventory(out, &self.store)?;
                }
            },
            Command::Show { name } => {
                let record = self
                    .store
                    .get(&name)
                    .ok_or_else(|| StoreError::UnknownItem(name.clone()))?;
                report::write_record(out, &self.store, record)?;
                if record.is_composite() {
                    let max = CraftabilityCalculator::with_limits(&self.store, self.limits())
                        .max_craftable(&name)?;
                    writeln!(out, "  Craftable: {max}")?;
                }
            },
            Command::Expand { targets } => {
                let expander = Expander::with_limits(&self.store, self.limits());
                let requests: Vec<(&str, u64)> = targets
                    .iter()
                    .map(|t| (t.name.as_str(), t.quantity))
                    .collect();
                let heading = targets
                    .iter()
                    .map(|t| format!("{} x{}", t.name, t.quantity))
                    .collect::<Vec<_>>()
                    .join(" + ");
                let expansion = expander.expand_many(&requests)?;
                report::write_expansion(out, &heading, &expansion)?;
            },
            Command::Deps { name, direct } => {
                let resolver = DependencyResolver::with_limits(&self.store, self.limits());
                if direct {
                    for dep in resolver.direct_dependencies(&name) {
                        writeln!(out, "{dep}")?;
                    }
                } else {
                    let deps = resolver.dependencies(&name)?;
                    for dep in deps.names() {
                        writeln!(out, "{dep}")?;
                    }
                    report::write_cycles(out, deps.cycles())?;
                }
            },
            Command::Tree { name, quantity } => {
                let tree = DependencyResolver::with_limits(&self.store, self.limits())
                    .dependency_tree(&name, quantity)?;
                report::write_tree(out, &tree)?;
            },
            Command::Craftable { name, check } => {
                let calc = CraftabilityCalculator::with_limits(&self.store, self.limits());
                let max = calc.max_craftable(&name)?;
                writeln!(out, "{name}: {max} craftable")?;
                let limiting = calc.limiting_ingredients(&name)?;
                if !limiting.is_empty() {
                    writeln!(out, "Limited by: {}", limiting.join(", "))?;
                }
                if let Some(quantity) = check {
                    let report = calc.requirements(&name, quantity)?;
                    report::write_requirements(out, &report)?;
                }
            },
            Command::Export { path } => {
                self.data.export_to(&self.store, &path)?;
                writeln!(out, "Exported to {}", path.display())?;
            },
            Command::Import { path } => {
                self.store = self
                    .data
                    .import_from(&path)
                    .with_context(|| format!("Failed to import {}", path.display()))?;
                writeln!(out, "Imported {}", path.display())?;
                self.commit()?;
            },
            Command::Backup => {
                let path = self.data.create_backup(&self.store)?;
                writeln!(out, "Backup written to {}", path.display())?;
            },
            Command::Backups => {
                for path in self.data.list_backups()? {
                    if let Some(name) = path.file_name() {
                        writeln!(out, "{}", name.to_string_lossy())?;
                    }
                }
            },
            Command::Restore { file } => {
                self.store = self.data.restore_backup(&file)?;
                self.data.save(&self.store)?;
                writeln!(out, "Restored {file}")?;
            },
            Command::Config { write } => {
                let text = toml::to_string_pretty(&self.config)?;
                write!(out, "{text}")?;
                if write {
                    self.config.save_to(&self.config_path).with_context(|| {
                        format!("Failed to write {}", self.config_path.display())
                    })?;
                }
            },
        }
        Ok(())
    }

    /// Saves the data file and, when enabled, writes a backup.
    fn commit(&self) -> Result<()> {
        self.data
            .save(&self.store)
            .with_context(|| format!("Failed to save {}", self.data.path().display()))?;
        if self.config.auto_backup {
            let path = self.data.create_backup(&self.store)?;
            info!("Auto-backup: {}", path.display());
        }
        Ok(())
    }
}

/// Resolves the configuration path from the command line.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(CraftbookConfig::default_path)
}

/// Loads configuration and runs the parsed command.
pub fn execute(cli: Cli, config_path: &Path, out: &mut impl Write) -> Result<()> {
    let config = CraftbookConfig::load_from(config_path);
    let mut session = Session::open(config, config_path.to_path_buf())?;
    session.run(cli.command, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(dir: &TempDir) -> Session {
        let config = CraftbookConfig {
            data_file: dir.path().join("craftbook.json"),
            backup_dir: dir.path().join("backups"),
            max_backups: 3,
            ..CraftbookConfig::default()
        };
        Session::open(config, dir.path().join("craftbook.toml")).expect("open")
    }

    fn run(session: &mut Session, args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("craftbook").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        session.run(cli.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn bakery(session: &mut Session) {
        run(session, &["basic", "Flour"]).expect("flour");
        run(session, &["basic", "Water"]).expect("water");
        run(session, &["recipe", "Bread", "-i", "Flour=2", "-i", "Water=1"]).expect("bread");
        run(session, &["recipe", "Cake", "-i", "Bread=2", "-i", "Sugar=1"]).expect("cake");
    }

    #[test]
    fn test_parse_ingredient() {
        assert_eq!(
            parse_ingredient("Flour=2"),
            Ok(Ingredient {
                name: "Flour".to_string(),
                amount: 2
            })
        );
        assert_eq!(
            parse_ingredient("a=b=3").map(|i| i.name),
            Ok("a=b".to_string())
        );
        assert!(parse_ingredient("Flour").is_err());
        assert!(parse_ingredient("=2").is_err());
        assert!(parse_ingredient("Flour=-1").is_err());
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("Cake").map(|t| t.quantity), Ok(1));
        assert_eq!(parse_target("Cake=4").map(|t| t.quantity), Ok(4));
        assert!(parse_target("Cake=x").is_err());
    }

    #[test]
    fn test_mutations_persist_and_back_up() {
        let dir = TempDir::new().expect("temp dir");
        let mut first = session(&dir);
        bakery(&mut first);

        let reopened = session(&dir);
        assert_eq!(reopened.store, first.store);
        assert_eq!(first.data.list_backups().expect("backups").len(), 3);
    }

    #[test]
    fn test_expand_and_tree() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);
        bakery(&mut session);

        let text = run(&mut session, &["expand", "Cake"]).expect("expand");
        assert_eq!(text, "Cake x1\n  Flour: 4\n  Sugar: 1\n  Water: 2\n");

        let text = run(&mut session, &["expand", "Cake=2", "Bread"]).expect("expand many");
        assert!(text.starts_with("Cake x2 + Bread x1\n"));
        assert!(text.contains("  Flour: 10\n"));

        let text = run(&mut session, &["tree", "Cake", "3"]).expect("tree");
        assert!(text.contains("  Bread x6:\n    Flour x12\n"));
    }

    #[test]
    fn test_craftable_with_stock() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);
        bakery(&mut session);
        run(&mut session, &["stock", "Flour", "10"]).expect("stock");
        run(&mut session, &["stock", "Water", "-3"]).expect("stock");
        assert_eq!(session.store.get_inventory("Water"), 0);
        run(&mut session, &["stock", "Water", "5"]).expect("stock");

        let text = run(&mut session, &["craftable", "Bread", "--check", "6"]).expect("craftable");
        assert!(text.starts_with("Bread: 5 craftable\n"));
        assert!(text.contains("Flour: 12 / 10 short 2"));
    }

    #[test]
    fn test_delete_requires_force_for_used_items() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);
        bakery(&mut session);

        assert!(run(&mut session, &["delete", "Bread"]).is_err());
        assert!(session.store.get("Bread").is_some());

        run(&mut session, &["delete", "Bread", "--force"]).expect("forced delete");
        assert!(session.store.get("Bread").is_none());

        // Cake still lists Bread, but there is no record left to delete.
        let err = run(&mut session, &["delete", "Bread"]).expect_err("missing");
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::UnknownItem(name)) if name == "Bread"
        ));
    }

    #[test]
    fn test_self_referencing_recipe_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);

        let err = run(&mut session, &["recipe", "Loop", "-i", "Loop=1"]).expect_err("rejected");
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::SelfReference(_))
        ));
        assert!(session.store.is_empty());
    }

    #[test]
    fn test_duplicate_rename_and_deps() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);
        bakery(&mut session);

        run(&mut session, &["duplicate", "Bread", "Rolls"]).expect("duplicate");
        run(&mut session, &["rename", "Rolls", "Buns"]).expect("rename");
        assert!(run(&mut session, &["rename", "Buns", "Cake"]).is_err());

        let text = run(&mut session, &["deps", "Cake"]).expect("deps");
        assert_eq!(text, "Bread\nFlour\nSugar\nWater\n");
        let text = run(&mut session, &["deps", "Cake", "--direct"]).expect("direct");
        assert_eq!(text, "Bread\nSugar\n");

        let text = run(&mut session, &["list", "--recipes"]).expect("list");
        assert!(text.starts_with("Recipes (3)\n  Bread"));
    }

    #[test]
    fn test_export_import_restore() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);
        bakery(&mut session);
        let export = dir.path().join("export.json");
        let export_arg = export.to_string_lossy().to_string();

        run(&mut session, &["export", &export_arg]).expect("export");
        let saved = session.store.clone();
        run(&mut session, &["delete", "Cake"]).expect("delete");
        run(&mut session, &["import", &export_arg]).expect("import");
        assert_eq!(session.store, saved);

        let listing = run(&mut session, &["backups"]).expect("backups");
        let newest = listing.lines().last().expect("a backup").to_string();
        run(&mut session, &["stock", "Flour", "99"]).expect("stock");
        run(&mut session, &["restore", &newest]).expect("restore");
        assert_eq!(session.store, saved);
    }

    #[test]
    fn test_config_write() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = session(&dir);

        let text = run(&mut session, &["config", "--write"]).expect("config");
        assert!(text.contains("max_backups = 3"));
        let written = CraftbookConfig::load_from(dir.path().join("craftbook.toml"));
        assert_eq!(written.max_backups, 3);
    }
}
