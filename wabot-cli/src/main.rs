//! wabot CLI: inspect and edit bot settings, list conversations. Config from env.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dashboard_client::{ClientConfig, HttpDashboardClient};
use tracing::{error, info};
use wabot_cli::commands;
use wabot_cli::{Cli, Commands};
use wabot_core::{init_tracing, LogConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Validation needs no backend or credentials.
    if let Commands::Validate { file } = &cli.command {
        let violations = commands::validate_file(file)?;
        if violations.is_empty() {
            println!("{}: OK", file.display());
            return Ok(());
        }
        for v in &violations {
            println!("{}", v);
        }
        anyhow::bail!("{} violation(s) in {}", violations.len(), file.display());
    }

    let config = ClientConfig::load()?;
    config.validate()?;
    let log_config = LogConfig::default().with_file(&config.log_file);
    init_tracing(&log_config).context("Initialize logging")?;
    info!(api_base_url = %config.api_base_url, user_id = %config.user_id, "wabot starting");

    let client = Arc::new(HttpDashboardClient::new(&config)?);
    let session = config.session();

    let result = match cli.command {
        Commands::ShowSettings { json } => {
            commands::show_settings(client.as_ref(), session, json).await
        }
        Commands::ApplyTemplate { template, dry_run } => {
            commands::apply_template(client.as_ref(), session, template, dry_run).await
        }
        Commands::Conversations { limit, unread } => {
            commands::list_conversations(client, session, limit, unread).await
        }
        Commands::Validate { .. } => Ok(String::new()),
    };

    match result {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "command failed");
            Err(e)
        }
    }
}
