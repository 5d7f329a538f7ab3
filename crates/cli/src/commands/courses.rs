//! Courses command handler.

use super::{open_system, print_json};
use clap::Args;
use lectern_core::{config::AppConfig, AppResult};

/// List indexed courses
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing courses command");

        let system = open_system(config).await?;
        let analytics = system.course_analytics()?;

        if self.json {
            return print_json(&analytics);
        }

        println!("{} course(s)", analytics.total_courses);
        for title in &analytics.course_titles {
            println!("  - {}", title);
        }
        Ok(())
    }
}
