//! Dataset inspection CLI.
//!
//! # Responsibility
//! - Render core derived views of an exported dataset as plain text.
//! - Exercise `shelfmap_core` wiring independently from the UI runtime.

use clap::{Args, Parser, Subcommand};
use log::warn;
use shelfmap_core::{
    aggregate, build_topology, expanded_ids, filter_tree, history_timeline, load_dataset,
    resolve_log_level, EntryChanges, NodeId, PlacementFilter, PlacementNode, SearchQuery,
    TopologyNode, WarehouseDataset,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "shelfmap", version, about = "Inspect warehouse datasets")]
struct Cli {
    /// trace|debug|info|warn|error; falls back to SHELFMAP_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the unit / storage group / cell group tree.
    Topology {
        dataset: PathBuf,
        /// Only show branches matching this text.
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Print the instance placement tree.
    Placement {
        dataset: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the audit history, newest first.
    History { dataset: PathBuf },
    /// Report reference problems in the dataset.
    Check { dataset: PathBuf },
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    unit: Option<NodeId>,
    #[arg(long)]
    storage_group: Option<NodeId>,
    #[arg(long)]
    cell_group: Option<NodeId>,
    #[arg(long)]
    cell: Option<NodeId>,
    #[arg(long)]
    item: Option<NodeId>,
    #[arg(long)]
    variant: Option<NodeId>,
    #[arg(long)]
    instance: Option<NodeId>,
    #[arg(long)]
    task: Option<NodeId>,
    #[arg(long)]
    only_unplaced: bool,
}

impl From<FilterArgs> for PlacementFilter {
    fn from(value: FilterArgs) -> Self {
        Self {
            unit_id: value.unit,
            storage_group_id: value.storage_group,
            cell_group_id: value.cell_group,
            cell_id: value.cell,
            item_id: value.item,
            variant_id: value.variant,
            instance_id: value.instance,
            task_id: value.task,
            only_unplaced: value.only_unplaced,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = resolve_log_level(cli.log_level.as_deref());
        if let Err(err) = shelfmap_core::init_logging(&level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Topology { dataset, query } => {
            let dataset = open(&dataset)?;
            let trees = build_topology(&dataset.units, &dataset.storage_groups, &dataset.cell_groups);
            let query = SearchQuery::new(query);
            let expanded = expanded_ids(&trees, &query);
            for tree in filter_tree(&trees, &query) {
                let marker = if expanded.contains(&tree.unit.id) { "+" } else { "-" };
                println!("{marker} {} [{}]", tree.unit.name, tree.unit.alias);
                print_topology(&tree.children, 1);
            }
        }
        Command::Placement { dataset, filter } => {
            let dataset = open(&dataset)?;
            let roots = aggregate(&dataset.instances, &PlacementFilter::from(filter));
            if roots.is_empty() {
                println!("no instances");
            }
            print_placement(&roots, 0);
        }
        Command::History { dataset } => {
            let dataset = open(&dataset)?;
            for item in history_timeline(&dataset.audit_entries) {
                let actor = item.actor_name.as_deref().unwrap_or("unknown");
                println!("{} {} by {actor}", item.timestamp, item.entry_id);
                print_changes(&item.changes);
            }
        }
        Command::Check { dataset } => {
            let dataset = open(&dataset)?;
            let issues = dataset.integrity_report();
            for issue in &issues {
                println!("{issue}");
            }
            if !issues.is_empty() {
                return Err(format!("{} integrity issue(s)", issues.len()));
            }
            println!("ok");
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<WarehouseDataset, String> {
    let dataset = load_dataset(path).map_err(|err| err.to_string())?;
    let issues = dataset.integrity_report();
    if !issues.is_empty() {
        warn!(
            "event=dataset_integrity module=cli status=degraded issues={}",
            issues.len()
        );
    }
    Ok(dataset)
}

fn print_topology(nodes: &[TopologyNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match node {
            TopologyNode::StorageGroup { group, children } => {
                println!("{indent}{} [{}]", group.name, group.alias);
                print_topology(children, depth + 1);
            }
            TopologyNode::CellGroup { group } => {
                println!("{indent}{} [{}] cells={}", group.name, group.alias, group.cell_count);
            }
        }
    }
}

fn print_placement(nodes: &[PlacementNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        if node.is_leaf() {
            let slot = [node.row, node.level, node.position]
                .iter()
                .map(|value| value.map_or("-".to_string(), |v| v.to_string()))
                .collect::<Vec<_>>()
                .join("/");
            println!("{indent}* {} {} @ {slot}", node.name, node.id);
        } else {
            println!("{indent}{} ({})", node.name, node.instance_count);
            print_placement(&node.children, depth + 1);
        }
    }
}

fn print_changes(changes: &EntryChanges) {
    match changes {
        EntryChanges::Created(fields) => {
            for field in fields {
                println!("  + {}: {}", field.field, field.value);
            }
        }
        EntryChanges::Removed(fields) => {
            for field in fields {
                println!("  - {}: {}", field.field, field.value);
            }
        }
        EntryChanges::Updated(diffs) => {
            for diff in diffs {
                println!(
                    "  ~ {}: {} -> {}",
                    diff.dotted_path(),
                    display_side(diff.old_value.as_ref()),
                    display_side(diff.new_value.as_ref())
                );
            }
        }
        EntryChanges::Unchanged => println!("  (no snapshot)"),
    }
}

fn display_side(value: Option<&serde_json::Value>) -> String {
    value.map_or("(absent)".to_string(), ToString::to_string)
}
