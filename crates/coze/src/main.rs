//! coze - command-line client for the Coze platform
//!
//! Main entry point for the coze CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{chat, conversation, dataset, document, message};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// coze - chat with Coze bots and manage conversations and knowledge bases
#[derive(Parser)]
#[command(name = "coze")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Personal access token
    #[arg(long, global = true, env = "COZE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL (default: https://api.coze.cn)
    #[arg(long, global = true, env = "COZE_API_BASE")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with a bot
    Chat(chat::ChatArgs),

    /// Conversation management
    Conversation(conversation::ConversationArgs),

    /// Message management
    Message(message::MessageArgs),

    /// Knowledge base management
    Dataset(dataset::DatasetArgs),

    /// Knowledge document management
    Document(document::DocumentArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "coze=debug,coze_client=debug,info"
    } else {
        "coze=info,coze_client=warn,warn"
    };

    let log_dir = dirs::cache_dir()
        .map(|d| d.join("coze").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "coze.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "coze=trace,coze_client=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        token: cli.token,
        base_url: cli.base_url,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Conversation(args) => conversation::run(args, &ctx).await,
        Commands::Message(args) => message::run(args, &ctx).await,
        Commands::Dataset(args) => dataset::run(args, &ctx).await,
        Commands::Document(args) => document::run(args, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_about_comes_from_doc_comment() {
        let command = Cli::command();
        let about = command.get_about().map(|about| about.to_string());
        assert_eq!(
            about.as_deref(),
            Some("coze - chat with Coze bots and manage conversations and knowledge bases")
        );
        command.debug_assert();
    }
}
