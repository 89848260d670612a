//! Conversation command - conversation management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use coze_client::{CreateConversationRequest, ListConversationsQuery, Message};

use super::{Context, print_done, print_header, print_json};

/// Arguments for the conversation command.
#[derive(Args, Debug)]
pub struct ConversationArgs {
    #[command(subcommand)]
    pub command: ConversationCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConversationCommand {
    /// Create a conversation
    Create {
        /// Bind the conversation to a bot
        #[arg(short, long, env = "COZE_BOT_ID")]
        bot: Option<String>,

        /// Seed the conversation with a user message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show a conversation
    Get {
        /// Conversation ID
        id: String,
    },

    /// List the conversations of a bot
    List {
        /// Bot whose conversations to list
        #[arg(short, long, env = "COZE_BOT_ID")]
        bot: String,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "20")]
        size: u32,
    },

    /// Clear a conversation's context
    Clear {
        /// Conversation ID
        id: String,
    },
}

/// Run the conversation command.
pub async fn run(args: ConversationArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let conversations = client.conversations();
    let dim = Style::new().dim();

    match args.command {
        ConversationCommand::Create { bot, message } => {
            let request = CreateConversationRequest {
                messages: message.map(Message::user_text).into_iter().collect(),
                bot_id: bot,
                ..Default::default()
            };
            let conversation = conversations.create(&request).await?;
            if ctx.json_output {
                print_json(&conversation)?;
            } else {
                print_done(format!("Conversation created: {}", conversation.id));
            }
        }
        ConversationCommand::Get { id } => {
            let conversation = conversations.retrieve(&id).await?;
            if ctx.json_output {
                print_json(&conversation)?;
            } else {
                print_header("Conversation");
                println!("ID:       {}", conversation.id);
                if let Some(created_at) = conversation.created_at {
                    println!("Created:  {}", created_at);
                }
                if let Some(section) = &conversation.last_section_id {
                    println!("Section:  {}", section);
                }
            }
        }
        ConversationCommand::List { bot, page, size } => {
            let list = conversations
                .list(&ListConversationsQuery {
                    bot_id: bot,
                    page_num: Some(page),
                    page_size: Some(size),
                })
                .await?;
            if ctx.json_output {
                print_json(&list)?;
            } else {
                print_header("Conversations");
                if list.conversations.is_empty() {
                    println!("{}", dim.apply_to("No conversations found"));
                }
                for conversation in &list.conversations {
                    let created = conversation
                        .created_at
                        .map(|t| t.to_string())
                        .unwrap_or_default();
                    println!("{}  {}", conversation.id, dim.apply_to(created));
                }
                if list.has_more {
                    println!();
                    println!("{}", dim.apply_to(format!("More on page {}", page + 1)));
                }
            }
        }
        ConversationCommand::Clear { id } => {
            let section = conversations.clear(&id).await?;
            if ctx.json_output {
                print_json(&section)?;
            } else {
                print_done(format!("Context cleared, new section: {}", section.id));
            }
        }
    }

    Ok(())
}
