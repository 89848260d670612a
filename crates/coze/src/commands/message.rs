//! Message command - conversation message management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use coze_client::{
    CreateMessageRequest, ListMessagesRequest, Message, MessageRole, UpdateMessageRequest,
};

use super::{Context, print_done, print_header, print_json, truncate};

/// Arguments for the message command.
#[derive(Args, Debug)]
pub struct MessageArgs {
    #[command(subcommand)]
    pub command: MessageCommand,
}

#[derive(Subcommand, Debug)]
pub enum MessageCommand {
    /// Add a user message to a conversation
    Create {
        /// Conversation ID
        conversation: String,

        /// Message text
        content: String,
    },

    /// List messages of a conversation
    List {
        /// Conversation ID
        conversation: String,

        /// Only messages of this chat
        #[arg(long)]
        chat: Option<String>,

        /// Maximum messages to show
        #[arg(short, long, default_value = "20")]
        limit: u32,

        /// Oldest first
        #[arg(long)]
        asc: bool,
    },

    /// Show a message
    Get {
        /// Conversation ID
        conversation: String,

        /// Message ID
        id: String,
    },

    /// Replace a message's text
    Update {
        /// Conversation ID
        conversation: String,

        /// Message ID
        id: String,

        /// New text
        content: String,
    },

    /// Delete a message
    Delete {
        /// Conversation ID
        conversation: String,

        /// Message ID
        id: String,
    },
}

/// Run the message command.
pub async fn run(args: MessageArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let messages = client.messages();

    match args.command {
        MessageCommand::Create {
            conversation,
            content,
        } => {
            let message = messages
                .create(&conversation, &CreateMessageRequest::user_text(content))
                .await?;
            print_message_result(&message, "Message created", ctx)?;
        }
        MessageCommand::List {
            conversation,
            chat,
            limit,
            asc,
        } => {
            let request = ListMessagesRequest {
                order: Some(if asc { "asc" } else { "desc" }.to_string()),
                chat_id: chat,
                limit: Some(limit),
                ..Default::default()
            };
            let page = messages.list(&conversation, &request).await?;
            if ctx.json_output {
                print_json(&page)?;
            } else {
                let dim = Style::new().dim();
                print_header("Messages");
                if page.data.is_empty() {
                    println!("{}", dim.apply_to("No messages found"));
                }
                for message in &page.data {
                    print_message_line(message);
                }
                if page.has_more {
                    println!();
                    println!("{}", dim.apply_to("... more messages available"));
                }
            }
        }
        MessageCommand::Get { conversation, id } => {
            let message = messages.retrieve(&conversation, &id).await?;
            if ctx.json_output {
                print_json(&message)?;
            } else {
                print_header("Message");
                print_message_line(&message);
                println!();
                println!("{}", message.content);
            }
        }
        MessageCommand::Update {
            conversation,
            id,
            content,
        } => {
            let request = UpdateMessageRequest {
                content: Some(content),
                ..Default::default()
            };
            let message = messages.update(&conversation, &id, &request).await?;
            print_message_result(&message, "Message updated", ctx)?;
        }
        MessageCommand::Delete { conversation, id } => {
            let message = messages.delete(&conversation, &id).await?;
            print_message_result(&message, "Message deleted", ctx)?;
        }
    }

    Ok(())
}

fn print_message_result(message: &Message, action: &str, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return print_json(message);
    }
    let dim = Style::new().dim();
    print_done(format!(
        "{}: {}",
        action,
        dim.apply_to(message.id.as_deref().unwrap_or("-"))
    ));
    Ok(())
}

fn print_message_line(message: &Message) {
    let dim = Style::new().dim();
    let role = match message.role {
        MessageRole::User => Style::new().cyan().apply_to("user"),
        MessageRole::Assistant => Style::new().green().apply_to("assistant"),
        _ => dim.apply_to("other"),
    };
    println!(
        "{} {:<9} {:<13} {}",
        dim.apply_to(format!("[{}]", message.id.as_deref().unwrap_or("-"))),
        role,
        message.message_type.as_str(),
        truncate(&message.content, 60)
    );
}
