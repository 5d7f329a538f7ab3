//! Search command handler.

use super::{open_system, print_json};
use clap::Args;
use lectern_core::{config::AppConfig, AppResult};

/// Search course content without the reasoning service
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Search query
    pub query: String,

    /// Course name (partial names are matched)
    #[arg(long)]
    pub course: Option<String>,

    /// Lesson number
    #[arg(long)]
    pub lesson: Option<u32>,

    /// Number of results (default: configured maxResults)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let system = open_system(config).await?;
        let results = system
            .search(&self.query, self.course.as_deref(), self.lesson, self.top_k)
            .await?;

        let Some(results) = results else {
            println!(
                "No course found matching '{}'",
                self.course.as_deref().unwrap_or_default()
            );
            return Ok(());
        };

        if self.json {
            return print_json(&results);
        }

        if results.is_empty() {
            println!("No relevant content found.");
        }
        for result in &results {
            println!("[{}] score {:.3}", result.chunk.label(), result.score);
            if let Some(link) = &result.link {
                println!("{}", link);
            }
            println!("{}", result.chunk.content.trim());
            println!();
        }

        Ok(())
    }
}
