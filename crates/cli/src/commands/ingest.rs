//! Ingest command handler.

use super::{open_system, print_json};
use clap::Args;
use lectern_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Ingest course documents into the index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Folder of course documents (default: the configured docs path)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Remove all indexed courses first
    #[arg(long)]
    pub clear: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let system = open_system(config).await?;
        let dir = match &self.path {
            Some(path) => config.workspace.join(path),
            None => system.config().docs_dir(&config.workspace),
        };

        let stats = system.ingest_folder(&dir, self.clear).await?;

        if self.json {
            print_json(&stats)
        } else {
            println!(
                "Added {} course(s) ({} chunks); {} already indexed, {} failed",
                stats.courses_added, stats.chunks_added, stats.skipped_existing, stats.failed
            );
            Ok(())
        }
    }
}
