//! Chat command - send a message to a bot.
//!
//! Streams the answer by default. `--poll` waits for the chat to finish and
//! prints the answer afterwards; `--no-wait` only starts the chat.

use std::io::Write;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use coze_client::{
    Chat, ChatEvent, ChatRequest, CozeClient, EventPayload, Message, MessageType, PollOptions,
};
use futures::StreamExt;

use super::{Context, parse_key_value, print_json};

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// The message to send
    #[arg(required = true)]
    pub prompt: String,

    /// Bot to chat with
    #[arg(short, long, env = "COZE_BOT_ID")]
    pub bot: String,

    /// Caller-defined user identifier
    #[arg(short, long, env = "COZE_USER_ID", default_value = "coze-cli")]
    pub user: String,

    /// Continue an existing conversation
    #[arg(short, long)]
    pub conversation: Option<String>,

    /// Prompt variable, as KEY=VALUE (repeatable)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Wait for the result by polling instead of streaming
    #[arg(long, conflicts_with = "no_wait")]
    pub poll: bool,

    /// Seconds between status checks when polling
    #[arg(long, default_value = "1", requires = "poll")]
    pub interval: u64,

    /// Seconds to wait before giving up when polling
    #[arg(long, default_value = "300", requires = "poll")]
    pub timeout: u64,

    /// Start the chat and return immediately
    #[arg(long)]
    pub no_wait: bool,
}

impl ChatArgs {
    fn request(&self) -> ChatRequest {
        let mut request = ChatRequest::new(&self.bot, &self.user)
            .with_message(Message::user_text(&self.prompt));
        if let Some(conversation) = &self.conversation {
            request = request.with_conversation(conversation);
        }
        for (name, value) in &self.vars {
            request = request.with_variable(name, value);
        }
        request
    }
}

/// Run the chat command.
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let request = args.request();

    if ctx.verbose {
        let dim = Style::new().dim();
        eprintln!("{}", dim.apply_to(format!("Bot: {}", args.bot)));
        if let Some(conversation) = &args.conversation {
            eprintln!("{}", dim.apply_to(format!("Conversation: {}", conversation)));
        }
    }

    if args.no_wait {
        start(&client, &request, ctx).await
    } else if args.poll {
        let options = PollOptions::default()
            .with_interval(Duration::from_secs(args.interval))
            .with_timeout(Duration::from_secs(args.timeout));
        poll(&client, &request, options, ctx).await
    } else {
        stream(&client, &request, ctx).await
    }
}

async fn start(client: &CozeClient, request: &ChatRequest, ctx: &Context) -> Result<()> {
    let body = client.chat().create(request).await?;
    let chat = body.get("data").and_then(Chat::from_value).unwrap_or_default();

    if ctx.json_output {
        print_json(&chat)?;
    } else {
        let dim = Style::new().dim();
        println!("Chat started: {}", chat.id);
        println!("{}", dim.apply_to(format!("Conversation: {}", chat.conversation_id)));
        println!("{}", dim.apply_to(format!("Status: {}", chat.status)));
    }
    Ok(())
}

async fn poll(
    client: &CozeClient,
    request: &ChatRequest,
    options: PollOptions,
    ctx: &Context,
) -> Result<()> {
    let chat = client.chat().create_and_poll_with(request, options).await?;

    let messages = if chat.is_completed() {
        client
            .chat()
            .list_messages(&chat.conversation_id, &chat.id)
            .await?
    } else {
        Vec::new()
    };

    if ctx.json_output {
        return print_json(&serde_json::json!({ "chat": chat, "messages": messages }));
    }

    for message in messages
        .iter()
        .filter(|m| m.message_type == MessageType::Answer)
    {
        println!("{}", message.content);
    }
    report_chat(&chat, ctx)
}

async fn stream(client: &CozeClient, request: &ChatRequest, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();
    let mut events = client.chat().stream(request).await?;
    let mut has_output = false;
    let mut in_reasoning = false;

    while let Some(event) = events.next().await {
        let event = event?;

        if ctx.json_output {
            println!("{}", event_json(&event)?);
            if event.is_error() {
                bail!("The server reported an error");
            }
            continue;
        }

        if event.is_message_delta() {
            let Some(message) = event.message() else {
                continue;
            };
            if message.message_type != MessageType::Answer {
                continue;
            }
            if let Some(reasoning) = message.reasoning_content.as_deref().filter(|r| !r.is_empty())
            {
                print!("{}", dim.apply_to(reasoning));
                in_reasoning = true;
            }
            if !message.content.is_empty() {
                if in_reasoning {
                    println!();
                    in_reasoning = false;
                }
                print!("{}", message.content);
            }
            std::io::stdout().flush()?;
            has_output = true;
        } else if event.is_error() {
            if has_output {
                println!();
            }
            let detail = event
                .raw()
                .and_then(|raw| raw.get("msg"))
                .and_then(|msg| msg.as_str())
                .unwrap_or("unknown error");
            bail!("Chat error: {}", detail);
        } else if let Some(chat) = event.chat().filter(|c| c.is_terminal() || c.requires_action()) {
            if has_output {
                println!();
                has_output = false;
            }
            report_chat(chat, ctx)?;
        } else if event.is_done() && has_output {
            println!();
        }
    }

    Ok(())
}

/// Print the final status line for a settled chat.
fn report_chat(chat: &Chat, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();

    if chat.is_failed() {
        let detail = chat
            .last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "no details".to_string());
        bail!("Chat failed: {}", detail);
    }

    if chat.requires_action() {
        let yellow = Style::new().yellow();
        eprintln!("{}", yellow.apply_to("Chat is waiting for tool outputs:"));
        if let Some(action) = &chat.required_action {
            for call in action.tool_calls() {
                eprintln!(
                    "  {} {}({})",
                    dim.apply_to(&call.id),
                    call.function.name,
                    call.function.arguments
                );
            }
        }
        return Ok(());
    }

    if ctx.verbose {
        let usage = chat.usage.unwrap_or_default();
        eprintln!(
            "{}",
            dim.apply_to(format!(
                "[chat {} in {} | {} tokens: {} in, {} out]",
                chat.id, chat.conversation_id, usage.token_count, usage.input_count, usage.output_count
            ))
        );
    }
    Ok(())
}

/// One JSON line per streamed event.
fn event_json(event: &ChatEvent) -> Result<String> {
    let data = match &event.payload {
        Some(EventPayload::Message(message)) => serde_json::to_value(message)?,
        Some(EventPayload::Chat(chat)) => serde_json::to_value(chat)?,
        Some(EventPayload::Raw(raw)) => raw.clone(),
        None => serde_json::Value::Null,
    };
    Ok(serde_json::json!({ "event": event.kind.as_str(), "data": data }).to_string())
}
