//! Conversations API.

use crate::api::MessagesApi;
use crate::client::CozeClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{
    Conversation, ConversationList, ConversationSection, CreateConversationRequest,
    ListConversationsQuery,
};

/// Conversations API client.
pub struct ConversationsApi {
    client: CozeClient,
}

impl ConversationsApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Create a conversation, optionally seeded with messages.
    pub async fn create(&self, request: &CreateConversationRequest) -> Result<Conversation> {
        self.client
            .send_data(ApiRequest::post("/v1/conversation/create").json(request)?)
            .await
    }

    /// Get a conversation by ID.
    pub async fn retrieve(&self, conversation_id: &str) -> Result<Conversation> {
        self.client
            .send_data(
                ApiRequest::get("/v1/conversation/retrieve")
                    .query("conversation_id", conversation_id),
            )
            .await
    }

    /// List the conversations of a bot.
    pub async fn list(&self, query: &ListConversationsQuery) -> Result<ConversationList> {
        self.client
            .send_data(ApiRequest::get("/v1/conversations").query_from(query)?)
            .await
    }

    /// Clear a conversation's context by starting a new section.
    pub async fn clear(&self, conversation_id: &str) -> Result<ConversationSection> {
        self.client
            .send_data(ApiRequest::post(format!(
                "/v1/conversations/{}/clear",
                conversation_id
            )))
            .await
    }

    /// Access the messages of conversations.
    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use crate::types::Message;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, CozeClient) {
        let mock = Arc::new(MockTransport::new());
        let client = CozeClient::with_shared_transport(mock.clone());
        (mock, client)
    }

    #[tokio::test]
    async fn test_create_with_messages() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "data": {"id": "v1", "created_at": 1700000000}}));

        let request = CreateConversationRequest {
            messages: vec![Message::user_text("hello")],
            bot_id: Some("b1".to_string()),
            ..Default::default()
        };
        let conversation = client.conversations().create(&request).await.unwrap();

        assert_eq!(conversation.id, "v1");
        assert_eq!(conversation.created_at, Some(1700000000));
        let sent = &mock.requests()[0];
        assert_eq!(sent.path, "/v1/conversation/create");
        assert_eq!(sent.body.as_ref().unwrap()["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_list_query_and_page() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "data": {
            "conversations": [{"id": "v1"}, {"id": "v2"}],
            "has_more": true
        }}));

        let page = client
            .conversations()
            .list(&ListConversationsQuery {
                bot_id: "b1".to_string(),
                page_num: Some(1),
                page_size: Some(20),
            })
            .await
            .unwrap();

        assert_eq!(page.conversations.len(), 2);
        assert!(page.has_more);
        assert_eq!(
            mock.requests()[0].query,
            vec![
                ("bot_id".to_string(), "b1".to_string()),
                ("page_num".to_string(), "1".to_string()),
                ("page_size".to_string(), "20".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_retrieve_and_clear() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "data": {"id": "v1"}}))
            .push_json(json!({"code": 0, "data": {"id": "s2", "conversation_id": "v1"}}));

        let conversation = client.conversations().retrieve("v1").await.unwrap();
        assert_eq!(conversation.id, "v1");

        let section = client.conversations().clear("v1").await.unwrap();
        assert_eq!(section.id, "s2");

        let requests = mock.requests();
        assert_eq!(requests[0].path, "/v1/conversation/retrieve");
        assert_eq!(requests[1].path, "/v1/conversations/v1/clear");
    }
}
