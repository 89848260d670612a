//! Request and response types for the Coze API.
//!
//! Response models are lenient: missing fields fall back to defaults and
//! unrecognized enum strings are kept verbatim, so a newer server never breaks
//! decoding of an otherwise usable snapshot.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Declares a string-backed enum that round-trips unknown values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this client does not recognize, kept verbatim.
            Other(String),
        }

        impl $name {
            /// The wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Other(value) => value,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $( $wire => Self::$variant, )+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(value) => value,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Decode a JSON object into a typed model.
///
/// Returns `None` for non-objects and for objects that do not fit the model.
pub(crate) fn decode_object<T: DeserializeOwned>(value: &serde_json::Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(error = %e, "Response object did not match the expected model");
            None
        }
    }
}

// Knowledge endpoints are called with `Agw-Js-Conv: str`, which turns 64-bit
// integers into strings, so numeric fields there accept either form.

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i64<E: serde::de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            IntOrString::Int(n) => Ok(n),
            IntOrString::Str(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    IntOrString::deserialize(deserializer)?.into_i64()
}

fn lenient_opt_int<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    Option::<IntOrString>::deserialize(deserializer)?
        .map(IntOrString::into_i64)
        .transpose()
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => n.to_string(),
        IntOrString::Str(s) => s,
    })
}

// Chat and message snapshots are always built, whatever shape individual
// fields arrive in: null means default, timestamps may be numeric strings and
// an empty `meta_data` may be sent as `[]`.

fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn loose_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn loose_meta_data<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<HashMap<String, serde_json::Value>>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(fields) => Some(fields.into_iter().collect()),
        _ => None,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

wire_enum! {
    /// Who sent a message.
    MessageRole {
        User => "user",
        Assistant => "assistant",
    }
}

wire_enum! {
    /// What a message represents within a chat.
    MessageType {
        Question => "question",
        Answer => "answer",
        FunctionCall => "function_call",
        ToolResponse => "tool_response",
        FollowUp => "follow_up",
        Verbose => "verbose",
    }
}

wire_enum! {
    /// How `Message::content` is encoded.
    ContentType {
        Text => "text",
        /// JSON-encoded list of [`ObjectContent`] items.
        ObjectString => "object_string",
        Card => "card",
    }
}

impl Default for MessageRole {
    fn default() -> Self {
        MessageRole::Other(String::new())
    }
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Other(String::new())
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Text
    }
}

/// A conversation message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender role.
    #[serde(default, deserialize_with = "null_default")]
    pub role: MessageRole,
    /// Message type.
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub message_type: MessageType,
    /// Message body, encoded per `content_type`.
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    /// Encoding of `content`.
    #[serde(default, deserialize_with = "null_default")]
    pub content_type: ContentType,
    /// Message ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Conversation the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Bot that produced or received the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// Chat (job) the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Free-form metadata.
    #[serde(
        default,
        deserialize_with = "loose_meta_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_data: Option<HashMap<String, serde_json::Value>>,
    /// Creation time (unix seconds).
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    /// Last update time (unix seconds).
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<i64>,
    /// Chain-of-thought text emitted by deep-thinking models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl Message {
    /// A user question with plain text content.
    pub fn user_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            message_type: MessageType::Question,
            content: content.into(),
            content_type: ContentType::Text,
            ..Default::default()
        }
    }

    /// An assistant answer with plain text content, for seeding history.
    pub fn assistant_answer(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            message_type: MessageType::Answer,
            content: content.into(),
            content_type: ContentType::Text,
            ..Default::default()
        }
    }

    /// A multimodal user question built from content objects.
    pub fn user_objects(objects: &[ObjectContent]) -> Result<Self> {
        Ok(Self {
            role: MessageRole::User,
            message_type: MessageType::Question,
            content: serde_json::to_string(objects)?,
            content_type: ContentType::ObjectString,
            ..Default::default()
        })
    }

    /// Whether the message carries non-empty reasoning content.
    pub fn has_reasoning_content(&self) -> bool {
        self.reasoning_content
            .as_deref()
            .is_some_and(|text| !text.is_empty())
    }
}

/// One item of an `object_string` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectContent {
    /// Text segment.
    Text { text: String },
    /// Image, referenced by uploaded file ID or URL.
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_url: Option<String>,
    },
    /// Generic file, referenced by uploaded file ID or URL.
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_url: Option<String>,
    },
}

impl ObjectContent {
    /// Text segment.
    pub fn text(text: impl Into<String>) -> Self {
        ObjectContent::Text { text: text.into() }
    }

    /// Image referenced by an uploaded file ID.
    pub fn image_by_id(file_id: impl Into<String>) -> Self {
        ObjectContent::Image {
            file_id: Some(file_id.into()),
            file_url: None,
        }
    }

    /// Image referenced by URL.
    pub fn image_by_url(url: impl Into<String>) -> Self {
        ObjectContent::Image {
            file_id: None,
            file_url: Some(url.into()),
        }
    }
}

/// Request to add a message to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    /// Sender role.
    pub role: MessageRole,
    /// Message body.
    pub content: String,
    /// Encoding of `content`.
    pub content_type: ContentType,
    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<HashMap<String, String>>,
}

impl CreateMessageRequest {
    /// A plain text message from the user.
    pub fn user_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            content_type: ContentType::Text,
            meta_data: None,
        }
    }
}

/// Filters for listing messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMessagesRequest {
    /// Sort order, `asc` or `desc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Only messages of this chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Page backwards from this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_id: Option<String>,
    /// Page forwards from this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_id: Option<String>,
    /// Page size (server maximum 50).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A page of messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageList {
    /// Messages in this page.
    #[serde(default)]
    pub data: Vec<Message>,
    /// ID of the first message in this page.
    #[serde(default)]
    pub first_id: Option<String>,
    /// ID of the last message in this page.
    #[serde(default)]
    pub last_id: Option<String>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
}

/// Request to modify a message. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMessageRequest {
    /// New body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// New metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<HashMap<String, String>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

wire_enum! {
    /// Lifecycle status of a chat job.
    ChatStatus {
        Created => "created",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        RequiresAction => "requires_action",
        Canceled => "canceled",
    }
}

impl Default for ChatStatus {
    fn default() -> Self {
        ChatStatus::Other(String::new())
    }
}

/// Token usage of a chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Total tokens.
    #[serde(default, deserialize_with = "null_default")]
    pub token_count: u64,
    /// Completion tokens.
    #[serde(default, deserialize_with = "null_default")]
    pub output_count: u64,
    /// Prompt tokens.
    #[serde(default, deserialize_with = "null_default")]
    pub input_count: u64,
}

/// Error reported for a failed chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    /// Error code; zero when no error occurred.
    #[serde(default, deserialize_with = "null_default")]
    pub code: i64,
    /// Error message.
    #[serde(default, deserialize_with = "null_default")]
    pub msg: String,
}

impl LastError {
    /// Whether this describes an actual error.
    pub fn is_error(&self) -> bool {
        self.code != 0 || !self.msg.is_empty()
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.msg, self.code)
    }
}

/// Action the client must take before a chat can continue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    /// Action type, currently always `submit_tool_outputs`.
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub action_type: String,
    /// Tool calls awaiting output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_tool_outputs: Option<SubmitToolOutputs>,
}

impl RequiredAction {
    /// Tool calls the client is expected to answer.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.submit_tool_outputs
            .as_ref()
            .map(|s| s.tool_calls.as_slice())
            .unwrap_or_default()
    }
}

/// Tool calls requested by a chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    /// Pending tool calls.
    #[serde(default, deserialize_with = "null_default")]
    pub tool_calls: Vec<ToolCall>,
}

/// A single tool invocation requested by the bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID, echoed back in [`ToolOutput::tool_call_id`].
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    /// Call type, e.g. `function`.
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub call_type: String,
    /// Function to invoke.
    #[serde(default, deserialize_with = "null_default")]
    pub function: ToolCallFunction,
}

/// Function name and JSON-encoded arguments of a tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// JSON-encoded arguments.
    #[serde(default, deserialize_with = "null_default")]
    pub arguments: String,
}

/// Output for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The [`ToolCall::id`] being answered.
    pub tool_call_id: String,
    /// Tool result.
    pub output: String,
}

impl ToolOutput {
    /// Create a tool output.
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}

/// Point-in-time snapshot of a chat job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat ID.
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    /// Conversation the chat runs in.
    #[serde(default, deserialize_with = "null_default")]
    pub conversation_id: String,
    /// Bot handling the chat.
    #[serde(default, deserialize_with = "null_default")]
    pub bot_id: String,
    /// Current status.
    #[serde(default, deserialize_with = "null_default")]
    pub status: ChatStatus,
    /// Creation time (unix seconds).
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    /// Completion time (unix seconds).
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<i64>,
    /// Failure time (unix seconds).
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub failed_at: Option<i64>,
    /// Token usage, reported once the chat finishes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Failure details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    /// Pending tool calls when status is `requires_action`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    /// Free-form metadata.
    #[serde(
        default,
        deserialize_with = "loose_meta_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_data: Option<HashMap<String, serde_json::Value>>,
}

impl Chat {
    /// Decode a chat snapshot from the `data` object of a response.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        decode_object(value)
    }

    /// Status is `completed`.
    pub fn is_completed(&self) -> bool {
        self.status == ChatStatus::Completed
    }

    /// Status is `failed`.
    pub fn is_failed(&self) -> bool {
        self.status == ChatStatus::Failed
    }

    /// Status is `requires_action`.
    pub fn requires_action(&self) -> bool {
        self.status == ChatStatus::RequiresAction
    }

    /// No further transitions will happen on their own.
    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failed()
    }
}

/// Parameters for starting a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Bot to chat with.
    pub bot_id: String,
    /// Caller-defined user identifier.
    pub user_id: String,
    /// Messages appended to the conversation before the bot runs.
    #[serde(default)]
    pub additional_messages: Vec<Message>,
    /// Existing conversation to continue. Sent as a query parameter.
    #[serde(skip)]
    pub conversation_id: Option<String>,
    /// Whether to persist the exchange in the conversation history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save_history: Option<bool>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<HashMap<String, String>>,
    /// Values for the bot's prompt variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_variables: Option<HashMap<String, String>>,
    /// Custom input parameters for workflow-backed bots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl ChatRequest {
    /// Create a chat request with no messages.
    pub fn new(bot_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Append a message.
    pub fn with_message(mut self, message: Message) -> Self {
        self.additional_messages.push(message);
        self
    }

    /// Continue an existing conversation.
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Set whether the exchange is saved to history.
    pub fn with_auto_save_history(mut self, save: bool) -> Self {
        self.auto_save_history = Some(save);
        self
    }

    /// Set a prompt variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_variables
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// The conversation ID, if set and non-empty.
    pub(crate) fn conversation(&self) -> Option<&str> {
        self.conversation_id.as_deref().filter(|id| !id.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming events
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a streamed chat event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatEventKind {
    ChatCreated,
    ChatInProgress,
    ChatCompleted,
    ChatFailed,
    ChatRequiresAction,
    MessageDelta,
    MessageCompleted,
    AudioDelta,
    Error,
    Done,
    /// Unrecognized event name, kept verbatim (`unknown` when empty).
    Unknown(String),
}

impl ChatEventKind {
    /// Map an SSE `event:` name to a kind.
    ///
    /// Names are accepted with or without the `conversation.` prefix.
    pub fn from_name(name: &str) -> Self {
        let short = name.strip_prefix("conversation.").unwrap_or(name);
        match short {
            "chat.created" => Self::ChatCreated,
            "chat.in_progress" => Self::ChatInProgress,
            "chat.completed" => Self::ChatCompleted,
            "chat.failed" => Self::ChatFailed,
            "chat.requires_action" => Self::ChatRequiresAction,
            "message.delta" => Self::MessageDelta,
            "message.completed" => Self::MessageCompleted,
            "audio.delta" => Self::AudioDelta,
            "error" if short.len() == name.len() => Self::Error,
            "done" if short.len() == name.len() => Self::Done,
            "" if name.is_empty() => Self::Unknown("unknown".to_string()),
            _ => Self::Unknown(name.to_string()),
        }
    }

    /// The wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChatCreated => "conversation.chat.created",
            Self::ChatInProgress => "conversation.chat.in_progress",
            Self::ChatCompleted => "conversation.chat.completed",
            Self::ChatFailed => "conversation.chat.failed",
            Self::ChatRequiresAction => "conversation.chat.requires_action",
            Self::MessageDelta => "conversation.message.delta",
            Self::MessageCompleted => "conversation.message.completed",
            Self::AudioDelta => "conversation.audio.delta",
            Self::Error => "error",
            Self::Done => "done",
            Self::Unknown(name) => name,
        }
    }

    /// Kinds whose payload is a chat snapshot.
    pub fn is_chat(&self) -> bool {
        matches!(
            self,
            Self::ChatCreated
                | Self::ChatInProgress
                | Self::ChatCompleted
                | Self::ChatFailed
                | Self::ChatRequiresAction
        )
    }

    /// Kinds whose payload is a message snapshot.
    pub fn is_message(&self) -> bool {
        matches!(self, Self::MessageDelta | Self::MessageCompleted)
    }
}

impl fmt::Display for ChatEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload attached to a chat event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Message snapshot for `message.*` events.
    Message(Message),
    /// Chat snapshot for `chat.*` events.
    Chat(Chat),
    /// Undecoded JSON for `error`, audio and unrecognized events.
    Raw(serde_json::Value),
}

/// One event of a streamed chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    /// Event kind.
    pub kind: ChatEventKind,
    /// Payload, absent for `done` and for undecodable data.
    pub payload: Option<EventPayload>,
}

impl ChatEvent {
    /// Create an event.
    pub fn new(kind: ChatEventKind, payload: Option<EventPayload>) -> Self {
        Self { kind, payload }
    }

    /// The end-of-stream marker.
    pub fn done() -> Self {
        Self::new(ChatEventKind::Done, None)
    }

    /// This event ends the stream.
    pub fn is_done(&self) -> bool {
        self.kind == ChatEventKind::Done
    }

    /// This is an incremental message delta.
    pub fn is_message_delta(&self) -> bool {
        self.kind == ChatEventKind::MessageDelta
    }

    /// The chat finished successfully.
    pub fn is_chat_completed(&self) -> bool {
        self.kind == ChatEventKind::ChatCompleted
    }

    /// The server reported an error.
    pub fn is_error(&self) -> bool {
        self.kind == ChatEventKind::Error
    }

    /// Message payload, if any.
    pub fn message(&self) -> Option<&Message> {
        match &self.payload {
            Some(EventPayload::Message(message)) => Some(message),
            _ => None,
        }
    }

    /// Chat payload, if any.
    pub fn chat(&self) -> Option<&Chat> {
        match &self.payload {
            Some(EventPayload::Chat(chat)) => Some(chat),
            _ => None,
        }
    }

    /// Raw JSON payload, if any.
    pub fn raw(&self) -> Option<&serde_json::Value> {
        match &self.payload {
            Some(EventPayload::Raw(value)) => Some(value),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversations
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation ID.
    #[serde(default)]
    pub id: String,
    /// Creation time (unix seconds).
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    /// Free-form metadata.
    #[serde(
        default,
        deserialize_with = "loose_meta_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_data: Option<HashMap<String, serde_json::Value>>,
    /// Current context section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_section_id: Option<String>,
}

/// Request to create a conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    /// Initial messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<HashMap<String, String>>,
    /// Bot to bind the conversation to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// Channel (999 Chat SDK, 1024 API).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,
}

/// Query for listing conversations of a bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListConversationsQuery {
    /// Bot whose conversations to list.
    pub bot_id: String,
    /// Page number, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// A page of conversations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationList {
    /// Conversations in this page.
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
}

/// Result of clearing a conversation's context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSection {
    /// The new section.
    #[serde(default)]
    pub id: String,
    /// Conversation the section belongs to.
    #[serde(default)]
    pub conversation_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Datasets
// ─────────────────────────────────────────────────────────────────────────────

/// Content format of a dataset or document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i64")]
pub enum DocumentFormatType {
    /// txt, pdf, doc, docx, ...
    Document,
    /// xlsx, csv
    Table,
    Image,
}

impl From<DocumentFormatType> for i64 {
    fn from(value: DocumentFormatType) -> Self {
        match value {
            DocumentFormatType::Document => 0,
            DocumentFormatType::Table => 1,
            DocumentFormatType::Image => 2,
        }
    }
}

impl DocumentFormatType {
    /// Parse the numeric wire value.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Document),
            1 => Some(Self::Table),
            2 => Some(Self::Image),
            _ => None,
        }
    }
}

/// Dataset enablement status.
pub mod dataset_status {
    pub const ENABLED: i64 = 1;
    pub const DISABLED: i64 = 3;
}

/// A knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset ID.
    #[serde(default, deserialize_with = "lenient_id")]
    pub dataset_id: String,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Owning space.
    #[serde(default, deserialize_with = "lenient_id")]
    pub space_id: String,
    /// See [`dataset_status`].
    #[serde(default, deserialize_with = "lenient_int")]
    pub status: i64,
    /// See [`DocumentFormatType`].
    #[serde(default, deserialize_with = "lenient_int")]
    pub format_type: i64,
    /// Whether the caller may edit the dataset.
    #[serde(default)]
    pub can_edit: bool,
    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Number of documents.
    #[serde(default, deserialize_with = "lenient_int")]
    pub doc_count: i64,
    /// Number of retrieval hits.
    #[serde(default, deserialize_with = "lenient_int")]
    pub hit_count: i64,
    /// Number of slices.
    #[serde(default, deserialize_with = "lenient_int")]
    pub slice_count: i64,
    /// Total size of all files, as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_file_size: Option<String>,
    /// Creation time (unix seconds).
    #[serde(default, deserialize_with = "lenient_opt_int", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    /// Last update time (unix seconds).
    #[serde(default, deserialize_with = "lenient_opt_int", skip_serializing_if = "Option::is_none")]
    pub update_time: Option<i64>,
}

impl Dataset {
    /// The format as an enum, if recognized.
    pub fn format(&self) -> Option<DocumentFormatType> {
        DocumentFormatType::from_i64(self.format_type)
    }
}

/// Request to create a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatasetRequest {
    /// Name.
    pub name: String,
    /// Owning space.
    pub space_id: String,
    /// Content format.
    pub format_type: DocumentFormatType,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Uploaded icon file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// Result of creating a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedDataset {
    /// New dataset ID.
    #[serde(default, deserialize_with = "lenient_id")]
    pub dataset_id: String,
}

/// Query for listing datasets of a space.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatasetsQuery {
    /// Space to list.
    pub space_id: String,
    /// Name filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Format filter (see [`DocumentFormatType`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_type: Option<i64>,
    /// Page number, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// A page of datasets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetList {
    /// Total number of matching datasets.
    #[serde(default, deserialize_with = "lenient_int")]
    pub total_count: i64,
    /// Datasets in this page.
    #[serde(default)]
    pub dataset_list: Vec<Dataset>,
}

/// Request to update a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDatasetRequest {
    /// New name (required by the server).
    pub name: String,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New icon file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// Processing progress of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentProgress {
    /// Document ID.
    #[serde(default, deserialize_with = "lenient_id")]
    pub document_id: String,
    /// Document name.
    #[serde(default)]
    pub document_name: String,
    /// Percentage complete.
    #[serde(default, deserialize_with = "lenient_int")]
    pub progress: i64,
    /// See [`DocumentStatus`].
    #[serde(default, deserialize_with = "lenient_int")]
    pub status: i64,
    /// Estimated seconds remaining.
    #[serde(default, deserialize_with = "lenient_opt_int", skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<i64>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_descript: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProgressData {
    #[serde(default)]
    pub data: Vec<DocumentProgress>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Documents
// ─────────────────────────────────────────────────────────────────────────────

/// Processing status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Parse the numeric wire value.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Processing),
            1 => Some(Self::Completed),
            9 => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A file in a knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    #[serde(default, deserialize_with = "lenient_id")]
    pub document_id: String,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Number of characters.
    #[serde(default, deserialize_with = "lenient_int")]
    pub char_count: i64,
    /// Number of slices.
    #[serde(default, deserialize_with = "lenient_int")]
    pub slice_count: i64,
    /// File size in bytes.
    #[serde(default, deserialize_with = "lenient_int")]
    pub size: i64,
    /// See [`DocumentFormatType`].
    #[serde(default, deserialize_with = "lenient_int")]
    pub format_type: i64,
    /// 0 local file, 1 web page.
    #[serde(default, deserialize_with = "lenient_int")]
    pub source_type: i64,
    /// See [`DocumentStatus`].
    #[serde(default, deserialize_with = "lenient_int")]
    pub status: i64,
    /// File extension.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Number of retrieval hits.
    #[serde(default, deserialize_with = "lenient_int")]
    pub hit_count: i64,
    /// Auto-update interval in hours.
    #[serde(default, deserialize_with = "lenient_int")]
    pub update_interval: i64,
    /// 0 no auto update, 1 auto update.
    #[serde(default, deserialize_with = "lenient_int")]
    pub update_type: i64,
    /// Creation time (unix seconds).
    #[serde(default, deserialize_with = "lenient_opt_int", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    /// Last update time (unix seconds).
    #[serde(default, deserialize_with = "lenient_opt_int", skip_serializing_if = "Option::is_none")]
    pub update_time: Option<i64>,
}

impl Document {
    /// The status as an enum, if recognized.
    pub fn document_status(&self) -> Option<DocumentStatus> {
        DocumentStatus::from_i64(self.status)
    }

    /// Still being processed.
    pub fn is_processing(&self) -> bool {
        self.document_status() == Some(DocumentStatus::Processing)
    }

    /// Processing finished.
    pub fn is_completed(&self) -> bool {
        self.document_status() == Some(DocumentStatus::Completed)
    }

    /// Processing failed.
    pub fn is_failed(&self) -> bool {
        self.document_status() == Some(DocumentStatus::Failed)
    }
}

const SOURCE_LOCAL_FILE: i64 = 0;
const SOURCE_WEB_PAGE: i64 = 1;
const SOURCE_UPLOADED_FILE: i64 = 5;

const UPDATE_NONE: i64 = 0;
const UPDATE_AUTO: i64 = 1;

/// Where a new document's content comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Base64-encoded file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_base64: Option<String>,
    /// File extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Web page to crawl.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    /// Previously uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_id: Option<i64>,
    /// 0 local file, 1 web page, 5 uploaded file.
    pub document_source: i64,
}

/// Refresh policy for web page documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRule {
    /// 0 no auto update, 1 auto update.
    pub update_type: i64,
    /// Interval in hours (minimum 24).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u32>,
}

impl UpdateRule {
    /// Refresh every `hours` hours, or never when `None`.
    pub fn every(hours: Option<u32>) -> Self {
        match hours {
            Some(hours) => Self {
                update_type: UPDATE_AUTO,
                update_interval: Some(hours),
            },
            None => Self {
                update_type: UPDATE_NONE,
                update_interval: None,
            },
        }
    }
}

/// Description of a document to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBase {
    /// Document name.
    pub name: String,
    /// Content source.
    pub source_info: SourceInfo,
    /// Refresh policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<UpdateRule>,
}

impl DocumentBase {
    /// A local file; `content` is the raw file bytes.
    pub fn local_file(name: impl Into<String>, content: &[u8], file_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_info: SourceInfo {
                file_base64: Some(base64::engine::general_purpose::STANDARD.encode(content)),
                file_type: Some(file_type.into()),
                document_source: SOURCE_LOCAL_FILE,
                ..Default::default()
            },
            update_rule: None,
        }
    }

    /// A web page, optionally refreshed every `update_interval` hours.
    pub fn web_page(
        name: impl Into<String>,
        url: impl Into<String>,
        update_interval: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            source_info: SourceInfo {
                web_url: Some(url.into()),
                document_source: SOURCE_WEB_PAGE,
                ..Default::default()
            },
            update_rule: Some(UpdateRule::every(update_interval)),
        }
    }

    /// An image previously uploaded through the files API.
    pub fn image(name: impl Into<String>, file_id: i64) -> Self {
        Self {
            name: name.into(),
            source_info: SourceInfo {
                source_file_id: Some(file_id),
                document_source: SOURCE_UPLOADED_FILE,
                ..Default::default()
            },
            update_rule: None,
        }
    }
}

/// How documents are split into slices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkStrategy {
    /// 0 automatic, 1 custom.
    pub chunk_type: i64,
    /// Custom separator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Maximum tokens per slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    /// Collapse consecutive whitespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_extra_spaces: Option<bool>,
    /// Strip URLs and email addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_urls_emails: Option<bool>,
}

/// Request to add documents to a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDocumentsRequest {
    /// Target dataset.
    pub dataset_id: String,
    /// Documents to create.
    pub document_bases: Vec<DocumentBase>,
    /// Slicing strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_strategy: Option<ChunkStrategy>,
    /// Content format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<DocumentFormatType>,
}

/// Request to list documents of a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDocumentsRequest {
    /// Dataset to list.
    pub dataset_id: String,
    /// Page number, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// A page of documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    /// Documents in this page (or created by the request).
    #[serde(default)]
    pub document_infos: Vec<Document>,
    /// Total number of documents.
    #[serde(default, deserialize_with = "lenient_int")]
    pub total: i64,
}

/// Request to update a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    /// Document to update.
    pub document_id: String,
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    /// New refresh policy (web pages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<UpdateRule>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_status_round_trips_unknown_values() {
        let status: ChatStatus = serde_json::from_value(json!("in_progress")).unwrap();
        assert_eq!(status, ChatStatus::InProgress);

        let status: ChatStatus = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(status, ChatStatus::Other("paused".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("paused"));
    }

    #[test]
    fn test_chat_from_value_with_defaults() {
        let chat = Chat::from_value(&json!({
            "id": "c1",
            "conversation_id": "v1",
            "bot_id": "b1",
            "status": "completed",
            "usage": {"token_count": 30, "input_count": 10, "output_count": 20}
        }))
        .unwrap();

        assert!(chat.is_completed());
        assert!(chat.is_terminal());
        assert_eq!(chat.usage.unwrap().token_count, 30);
        assert_eq!(chat.created_at, None);

        let empty = Chat::from_value(&json!({})).unwrap();
        assert_eq!(empty.id, "");
        assert!(!empty.is_terminal());
    }

    #[test]
    fn test_chat_from_value_rejects_non_objects() {
        assert!(Chat::from_value(&json!(null)).is_none());
        assert!(Chat::from_value(&json!([1, 2])).is_none());
        assert!(Chat::from_value(&json!("completed")).is_none());
    }

    #[test]
    fn test_chat_from_value_tolerates_loose_fields() {
        let chat = Chat::from_value(&json!({
            "id": "c1",
            "conversation_id": "v1",
            "bot_id": null,
            "status": "completed",
            "created_at": "1700000000",
            "completed_at": 1700000005.0,
            "failed_at": "",
            "meta_data": [],
            "last_error": {"code": 0, "msg": null}
        }))
        .unwrap();

        assert!(chat.is_completed());
        assert_eq!(chat.bot_id, "");
        assert_eq!(chat.created_at, Some(1_700_000_000));
        assert_eq!(chat.completed_at, Some(1_700_000_005));
        assert_eq!(chat.failed_at, None);
        assert_eq!(chat.meta_data, None);
        assert!(!chat.last_error.unwrap().is_error());

        let chat = Chat::from_value(&json!({"id": "c2", "status": null})).unwrap();
        assert_eq!(chat.status, ChatStatus::default());
    }

    #[test]
    fn test_message_tolerates_null_content() {
        let message: Message = serde_json::from_value(json!({
            "role": "assistant",
            "type": null,
            "content": null,
            "content_type": null,
            "reasoning_content": "thinking...",
            "meta_data": [],
            "created_at": "1700000000"
        }))
        .unwrap();

        assert_eq!(message.content, "");
        assert_eq!(message.content_type, ContentType::Text);
        assert_eq!(message.message_type, MessageType::default());
        assert!(message.has_reasoning_content());
        assert_eq!(message.meta_data, None);
        assert_eq!(message.created_at, Some(1_700_000_000));

        let conversation: Conversation =
            serde_json::from_value(json!({"id": "v1", "created_at": "1700000000", "meta_data": {"k": "v"}}))
                .unwrap();
        assert_eq!(conversation.created_at, Some(1_700_000_000));
        assert_eq!(conversation.meta_data.unwrap()["k"], "v");
    }

    #[test]
    fn test_required_action_tool_calls() {
        let chat = Chat::from_value(&json!({
            "id": "c1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "weather", "arguments": "{\"city\":\"Paris\"}"}
                    }]
                }
            }
        }))
        .unwrap();

        assert!(chat.requires_action());
        assert!(!chat.is_terminal());
        let calls = chat.required_action.as_ref().unwrap().tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "weather");
    }

    #[test]
    fn test_user_text_message_serialization() {
        let value = serde_json::to_value(Message::user_text("hello")).unwrap();
        assert_eq!(
            value,
            json!({"role": "user", "type": "question", "content": "hello", "content_type": "text"})
        );
    }

    #[test]
    fn test_user_objects_message() {
        let message = Message::user_objects(&[
            ObjectContent::text("what is this?"),
            ObjectContent::image_by_url("https://example.com/cat.png"),
        ])
        .unwrap();

        assert_eq!(message.content_type, ContentType::ObjectString);
        let decoded: serde_json::Value = serde_json::from_str(&message.content).unwrap();
        assert_eq!(
            decoded,
            json!([
                {"type": "text", "text": "what is this?"},
                {"type": "image", "file_url": "https://example.com/cat.png"}
            ])
        );
    }

    #[test]
    fn test_message_reasoning_content() {
        let message: Message = serde_json::from_value(json!({
            "role": "assistant",
            "type": "answer",
            "content": "",
            "reasoning_content": "thinking..."
        }))
        .unwrap();
        assert!(message.has_reasoning_content());
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content_type, ContentType::Text);
    }

    #[test]
    fn test_chat_request_skips_conversation_id_in_body() {
        let request = ChatRequest::new("bot", "user")
            .with_message(Message::user_text("hi"))
            .with_conversation("conv_1");
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("conversation_id").is_none());
        assert!(value.get("auto_save_history").is_none());
        assert_eq!(value["bot_id"], "bot");
        assert_eq!(request.conversation(), Some("conv_1"));

        let empty = ChatRequest::new("bot", "user").with_conversation("");
        assert_eq!(empty.conversation(), None);
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(
            ChatEventKind::from_name("conversation.chat.completed"),
            ChatEventKind::ChatCompleted
        );
        assert_eq!(
            ChatEventKind::from_name("message.delta"),
            ChatEventKind::MessageDelta
        );
        assert_eq!(ChatEventKind::from_name("error"), ChatEventKind::Error);
        assert_eq!(
            ChatEventKind::from_name("conversation.done"),
            ChatEventKind::Unknown("conversation.done".to_string())
        );
        assert_eq!(
            ChatEventKind::from_name(""),
            ChatEventKind::Unknown("unknown".to_string())
        );
        assert_eq!(
            ChatEventKind::ChatRequiresAction.as_str(),
            "conversation.chat.requires_action"
        );
    }

    #[test]
    fn test_document_lenient_numbers() {
        let document: Document = serde_json::from_value(json!({
            "document_id": "7345",
            "name": "guide.pdf",
            "char_count": "1024",
            "size": 2048,
            "status": "1",
            "create_time": "1718000000"
        }))
        .unwrap();

        assert_eq!(document.char_count, 1024);
        assert_eq!(document.size, 2048);
        assert!(document.is_completed());
        assert_eq!(document.create_time, Some(1_718_000_000));
    }

    #[test]
    fn test_document_base_builders() {
        let local = DocumentBase::local_file("notes", b"hello", "txt");
        assert_eq!(local.source_info.file_base64.as_deref(), Some("aGVsbG8="));
        assert_eq!(local.source_info.document_source, 0);

        let web = DocumentBase::web_page("site", "https://example.com", Some(24));
        assert_eq!(
            serde_json::to_value(&web).unwrap(),
            json!({
                "name": "site",
                "source_info": {"web_url": "https://example.com", "document_source": 1},
                "update_rule": {"update_type": 1, "update_interval": 24}
            })
        );

        let static_page = DocumentBase::web_page("site", "https://example.com", None);
        assert_eq!(static_page.update_rule, Some(UpdateRule::every(None)));

        let image = DocumentBase::image("cat", 42);
        assert_eq!(image.source_info.source_file_id, Some(42));
        assert_eq!(image.source_info.document_source, 5);
    }

    #[test]
    fn test_format_type_serializes_as_number() {
        let request = CreateDatasetRequest {
            name: "kb".to_string(),
            space_id: "s1".to_string(),
            format_type: DocumentFormatType::Table,
            description: None,
            file_id: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "kb", "space_id": "s1", "format_type": 1})
        );
    }
}
