//! CLI command handlers.

pub mod chat;
pub mod conversation;
pub mod dataset;
pub mod document;
pub mod message;

use anyhow::{Context as _, Result};
use console::Style;
use coze_client::CozeClient;
use serde::Serialize;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Access token.
    pub token: Option<String>,
    /// API base URL override.
    pub base_url: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Build an API client from the global flags.
    pub fn client(&self) -> Result<CozeClient> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .context("No access token: pass --token or set COZE_API_TOKEN")?;

        let mut builder = CozeClient::builder().auth_token(token);
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url);
        }
        let client = builder.build()?;
        tracing::debug!(base_url = %client.base_url(), "Using Coze API");
        Ok(client)
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a `✓` confirmation line.
pub fn print_done(message: impl std::fmt::Display) {
    let green = Style::new().green();
    println!("{} {}", green.apply_to("✓"), message);
}

/// Print a bold header with a rule under it.
pub fn print_header(title: &str) {
    let dim = Style::new().dim();
    println!("{}", console::style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
}

/// Shorten text to one line of at most `max_len` characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Split a `KEY=VALUE` argument.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}
