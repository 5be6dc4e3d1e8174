//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flow_config::TemplateKind;

#[derive(Parser, Debug)]
#[command(name = "wabot")]
#[command(about = "WhatsApp bot dashboard CLI: settings and conversations", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the saved bot settings (config from env: API_BASE_URL, AUTH_TOKEN, USER_ID).
    ShowSettings {
        /// Print the raw `botSettings` JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Reset the bot flow to a template preset and save it.
    ApplyTemplate {
        /// consultorio | barberia | servicios | custom
        template: TemplateKind,
        /// Print the document that would be saved without saving it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Check a `botSettings` JSON file against the save-time rules.
    Validate { file: PathBuf },
    /// List conversations, most recent first.
    Conversations {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only conversations with unread messages.
        #[arg(long)]
        unread: bool,
    },
}
