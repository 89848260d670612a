//! HTTP client SDK for the Coze conversational AI platform.
//!
//! This crate provides a typed client for the Coze open API: chats with
//! streaming or polling, conversations, messages and knowledge bases.
//!
//! # Example
//!
//! ```no_run
//! use coze_client::{ChatRequest, CozeClient, Message, Result};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<()> {
//! let client = CozeClient::builder()
//!     .auth_token("pat_xxx")
//!     .build()?;
//!
//! let request = ChatRequest::new("7370000000000", "user-1")
//!     .with_message(Message::user_text("Tell me a story"));
//!
//! // Stream a response
//! let mut events = client.chat().stream(&request).await?;
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     if event.is_message_delta() {
//!         if let Some(message) = event.message() {
//!             print!("{}", message.content);
//!         }
//!     }
//!     if let Some(chat) = event.chat().filter(|_| event.is_chat_completed()) {
//!         println!("\n[{} tokens]", chat.usage.unwrap_or_default().token_count);
//!     }
//! }
//!
//! // Or wait for the final result
//! let chat = client.chat().create_and_poll(&request).await?;
//! let messages = client.chat().list_messages(&chat.conversation_id, &chat.id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Chat**: create, stream, retrieve, create-and-poll, tool outputs, cancel
//! - **Conversations**: create, retrieve, list, clear
//! - **Messages**: create, list, retrieve, modify, delete
//! - **Datasets**: create, list, update, delete, processing progress
//! - **Documents**: create, list, update, delete

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod poll;
pub mod stream;
pub mod transport;
pub mod types;

pub use auth::{Auth, TokenAuth};
pub use client::{ClientBuilder, CozeClient, BASE_URL_CN, BASE_URL_COM};
pub use error::{Error, Result};
pub use poll::{Clock, PollOptions, TokioClock};
pub use stream::{parse_event, ChatEventStream, SseDecoder};
pub use transport::{ApiRequest, ByteStream, HttpTransport, Transport};
pub use types::*;

#[cfg(any(test, feature = "testing"))]
pub use transport::MockTransport;
