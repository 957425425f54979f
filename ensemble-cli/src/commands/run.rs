//! `ensemble run <modules-dir>` — load workers, then hand over to the console.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use ensemble_console::{start_blocking, ConsoleConfig, SessionEnd, DEFAULT_PROMPT};
use ensemble_core::ProcessRegistry;
use ensemble_loader::{discover, DiscoveredUnit};

/// Load every worker in a modules directory and start the operator console.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory holding worker manifests (`*.yaml`) and executables.
    pub modules_dir: PathBuf,

    /// How long `enable` waits for a worker to crash on start, in milliseconds.
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub settle_ms: u64,

    /// Prompt printed before each command.
    #[arg(long, default_value = DEFAULT_PROMPT)]
    pub prompt: String,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = ConsoleConfig::default()
            .with_settle_timeout(Duration::from_millis(self.settle_ms))
            .with_prompt(self.prompt);

        // Load phase: any failure here stops before the console starts.
        let units = discover(&self.modules_dir).with_context(|| {
            format!(
                "failed to discover workers in '{}'",
                self.modules_dir.display()
            )
        })?;
        let registry = ProcessRegistry::new(config.settle_timeout);
        let count = registry
            .populate(units.into_iter().map(DiscoveredUnit::into_pair))
            .context("failed to register workers")?;

        println!(
            "✓ Loaded {} worker(s) from '{}'",
            count,
            self.modules_dir.display()
        );
        println!("  Commands: enable <name> | disable <name> | list");

        match start_blocking(registry, &config).context("console exited with error")? {
            SessionEnd::Signal => println!("stopped by signal; workers terminated"),
            SessionEnd::EndOfInput => println!("input closed; workers terminated"),
        }
        Ok(())
    }
}
