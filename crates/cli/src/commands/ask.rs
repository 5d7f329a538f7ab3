//! Ask command handler.

use super::{ingest_on_startup, open_system, print_answer, print_json};
use clap::Args;
use lectern_core::{config::AppConfig, AppResult};

/// Ask one question about the courses
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Continue an existing session
    #[arg(short, long)]
    pub session: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let system = open_system(config).await?;
        ingest_on_startup(&system).await?;

        let response = system.answer(&self.query, self.session.as_deref()).await?;

        if self.json {
            print_json(&response)
        } else {
            print_answer(&response);
            tracing::debug!("Session: {}", response.session_id);
            Ok(())
        }
    }
}
