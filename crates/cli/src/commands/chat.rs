//! Chat command handler: an interactive loop over one session.

use super::{ingest_on_startup, open_system, print_answer};
use clap::Args;
use lectern_core::{config::AppConfig, AppError, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Resume an existing session id
    #[arg(short, long)]
    pub session: Option<String>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let system = open_system(config).await?;
        ingest_on_startup(&system).await?;

        let analytics = system.course_analytics()?;
        println!(
            "{} course(s) loaded. Type a question, or 'exit' to quit.",
            analytics.total_courses
        );

        let session_id = system.sessions().get_or_create(self.session.as_deref()).await;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let Some(line) = lines.next_line().await.map_err(AppError::Io)? else {
                break;
            };
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if matches!(query, "exit" | "quit") {
                break;
            }

            match system.answer(query, Some(&session_id)).await {
                Ok(response) => print_answer(&response),
                Err(e) => {
                    tracing::error!("Answer failed: {}", e);
                    eprintln!("Error: {}", e);
                }
            }
            println!();
        }

        Ok(())
    }
}
