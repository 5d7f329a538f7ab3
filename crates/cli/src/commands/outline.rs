//! Outline command handler.

use super::open_system;
use clap::Args;
use lectern_core::{config::AppConfig, AppResult};

/// Show a course outline
#[derive(Args, Debug)]
pub struct OutlineCommand {
    /// Course name (partial names are matched)
    pub course: String,
}

impl OutlineCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing outline command for '{}'", self.course);

        let system = open_system(config).await?;
        println!("{}", system.outline(&self.course).await?);
        Ok(())
    }
}
