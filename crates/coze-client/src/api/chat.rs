//! Chat API.

use serde::Serialize;

use crate::client::CozeClient;
use crate::error::Result;
use crate::poll::{self, PollOptions};
use crate::stream::ChatEventStream;
use crate::transport::ApiRequest;
use crate::types::{Chat, ChatRequest, Message, ToolOutput};

/// Request body for `/v3/chat`.
#[derive(Serialize)]
struct ChatBody<'a> {
    #[serde(flatten)]
    request: &'a ChatRequest,
    stream: bool,
}

#[derive(Serialize)]
struct ToolOutputsBody<'a> {
    tool_outputs: &'a [ToolOutput],
    stream: bool,
}

#[derive(Serialize)]
struct ChatRef<'a> {
    conversation_id: &'a str,
    chat_id: &'a str,
}

/// Chat API client.
pub struct ChatApi {
    client: CozeClient,
}

impl ChatApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    fn chat_request(request: &ChatRequest, stream: bool) -> Result<ApiRequest> {
        let mut api_request = ApiRequest::post("/v3/chat").json(&ChatBody { request, stream })?;
        if let Some(conversation_id) = request.conversation() {
            api_request = api_request.query("conversation_id", conversation_id);
        }
        Ok(api_request)
    }

    fn tool_outputs_request(
        conversation_id: &str,
        chat_id: &str,
        tool_outputs: &[ToolOutput],
        stream: bool,
    ) -> Result<ApiRequest> {
        Ok(ApiRequest::post("/v3/chat/submit_tool_outputs")
            .query("conversation_id", conversation_id)
            .query("chat_id", chat_id)
            .json(&ToolOutputsBody {
                tool_outputs,
                stream,
            })?)
    }

    /// Start a chat without streaming.
    ///
    /// Returns the decoded response body; its `data` field holds the initial
    /// [`Chat`] snapshot.
    pub async fn create(&self, request: &ChatRequest) -> Result<serde_json::Value> {
        tracing::debug!(bot_id = %request.bot_id, "Creating chat");
        self.client.send(Self::chat_request(request, false)?).await
    }

    /// Start a chat and stream its events.
    pub async fn stream(&self, request: &ChatRequest) -> Result<ChatEventStream> {
        tracing::debug!(bot_id = %request.bot_id, "Streaming chat");
        self.client
            .send_stream(Self::chat_request(request, true)?)
            .await
    }

    /// Fetch the current snapshot of a chat.
    ///
    /// Returns the decoded response body; its `data` field holds the [`Chat`].
    pub async fn retrieve(&self, conversation_id: &str, chat_id: &str) -> Result<serde_json::Value> {
        self.client
            .send(
                ApiRequest::get("/v3/chat/retrieve")
                    .query("conversation_id", conversation_id)
                    .query("chat_id", chat_id),
            )
            .await
    }

    /// Start a chat and poll until it completes, fails or requires action.
    ///
    /// Polls once a second for up to five minutes.
    pub async fn create_and_poll(&self, request: &ChatRequest) -> Result<Chat> {
        self.create_and_poll_with(request, PollOptions::default())
            .await
    }

    /// Like [`create_and_poll`](Self::create_and_poll) with custom options.
    pub async fn create_and_poll_with(
        &self,
        request: &ChatRequest,
        options: PollOptions,
    ) -> Result<Chat> {
        poll::create_and_poll(self, request, &options).await
    }

    /// Answer the tool calls of a chat in `requires_action`.
    pub async fn submit_tool_outputs(
        &self,
        conversation_id: &str,
        chat_id: &str,
        tool_outputs: &[ToolOutput],
    ) -> Result<serde_json::Value> {
        self.client
            .send(Self::tool_outputs_request(
                conversation_id,
                chat_id,
                tool_outputs,
                false,
            )?)
            .await
    }

    /// Answer tool calls and stream the rest of the chat.
    pub async fn submit_tool_outputs_stream(
        &self,
        conversation_id: &str,
        chat_id: &str,
        tool_outputs: &[ToolOutput],
    ) -> Result<ChatEventStream> {
        self.client
            .send_stream(Self::tool_outputs_request(
                conversation_id,
                chat_id,
                tool_outputs,
                true,
            )?)
            .await
    }

    /// Cancel a running chat.
    pub async fn cancel(&self, conversation_id: &str, chat_id: &str) -> Result<serde_json::Value> {
        self.client
            .send(ApiRequest::post("/v3/chat/cancel").json(&ChatRef {
                conversation_id,
                chat_id,
            })?)
            .await
    }

    /// List the messages a chat produced.
    pub async fn list_messages(&self, conversation_id: &str, chat_id: &str) -> Result<Vec<Message>> {
        self.client
            .send_data(
                ApiRequest::get("/v3/chat/message/list")
                    .query("conversation_id", conversation_id)
                    .query("chat_id", chat_id),
            )
            .await
    }
}
