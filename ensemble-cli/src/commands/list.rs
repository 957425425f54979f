//! `ensemble list <modules-dir>` — dry discovery.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ensemble_loader::{discover, DiscoveredUnit};

/// Show the workers a modules directory would provide, without starting any.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory holding worker manifests (`*.yaml`) and executables.
    pub modules_dir: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct WorkerRow {
    #[tabled(rename = "worker")]
    name: String,
    #[tabled(rename = "source")]
    kind: String,
    #[tabled(rename = "command")]
    command: String,
    #[tabled(rename = "issue")]
    #[serde(skip_serializing_if = "String::is_empty")]
    issue: String,
}

impl From<&DiscoveredUnit> for WorkerRow {
    fn from(unit: &DiscoveredUnit) -> Self {
        Self {
            name: unit.name.to_string(),
            kind: unit.source.kind().to_string(),
            command: unit.unit.describe(),
            issue: unit.unit.validate().err().unwrap_or_default(),
        }
    }
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let units = discover(&self.modules_dir).with_context(|| {
            format!(
                "failed to discover workers in '{}'",
                self.modules_dir.display()
            )
        })?;
        let rows: Vec<WorkerRow> = units.iter().map(WorkerRow::from).collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize worker list")?
            );
            return Ok(());
        }

        if rows.is_empty() {
            println!("No workers found in '{}'.", self.modules_dir.display());
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
