//! Conversation messages API.

use crate::client::CozeClient;
use crate::error::{Error, Result};
use crate::transport::ApiRequest;
use crate::types::{
    CreateMessageRequest, ListMessagesRequest, Message, MessageList, UpdateMessageRequest,
};

/// Messages API client.
pub struct MessagesApi {
    client: CozeClient,
}

impl MessagesApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Add a message to a conversation without running the bot.
    pub async fn create(
        &self,
        conversation_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<Message> {
        self.client
            .send_data(
                ApiRequest::post("/v1/conversation/message/create")
                    .query("conversation_id", conversation_id)
                    .json(request)?,
            )
            .await
    }

    /// List messages of a conversation.
    pub async fn list(
        &self,
        conversation_id: &str,
        request: &ListMessagesRequest,
    ) -> Result<MessageList> {
        self.client
            .send_body(
                ApiRequest::post("/v1/conversation/message/list")
                    .query("conversation_id", conversation_id)
                    .json(request)?,
            )
            .await
    }

    /// Get a message by ID.
    pub async fn retrieve(&self, conversation_id: &str, message_id: &str) -> Result<Message> {
        self.client
            .send_data(Self::addressed(
                ApiRequest::get("/v1/conversation/message/retrieve"),
                conversation_id,
                message_id,
            ))
            .await
    }

    /// Modify a message.
    pub async fn update(
        &self,
        conversation_id: &str,
        message_id: &str,
        request: &UpdateMessageRequest,
    ) -> Result<Message> {
        let request = Self::addressed(
            ApiRequest::post("/v1/conversation/message/modify"),
            conversation_id,
            message_id,
        )
        .json(request)?;

        // This endpoint answers under `message` rather than `data`.
        let mut body = self.client.send(request).await?;
        let message = ["message", "data"]
            .into_iter()
            .filter_map(|field| body.get_mut(field).map(serde_json::Value::take))
            .find(|value| value.is_object())
            .ok_or(Error::MissingData("message"))?;
        Ok(serde_json::from_value(message)?)
    }

    /// Delete a message, returning it.
    pub async fn delete(&self, conversation_id: &str, message_id: &str) -> Result<Message> {
        self.client
            .send_data(Self::addressed(
                ApiRequest::post("/v1/conversation/message/delete"),
                conversation_id,
                message_id,
            ))
            .await
    }

    fn addressed(request: ApiRequest, conversation_id: &str, message_id: &str) -> ApiRequest {
        request
            .query("conversation_id", conversation_id)
            .query("message_id", message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use crate::types::MessageRole;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, CozeClient) {
        let mock = Arc::new(MockTransport::new());
        let client = CozeClient::with_shared_transport(mock.clone());
        (mock, client)
    }

    #[tokio::test]
    async fn test_create_message() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "data": {
            "id": "m1", "conversation_id": "v1", "role": "user", "type": "question",
            "content": "hi", "content_type": "text"
        }}));

        let message = client
            .messages()
            .create("v1", &CreateMessageRequest::user_text("hi"))
            .await
            .unwrap();

        assert_eq!(message.id.as_deref(), Some("m1"));
        assert_eq!(message.role, MessageRole::User);
        let sent = &mock.requests()[0];
        assert_eq!(sent.path, "/v1/conversation/message/create");
        assert_eq!(
            sent.query,
            vec![("conversation_id".to_string(), "v1".to_string())]
        );
        assert_eq!(sent.body.as_ref().unwrap()["content"], "hi");
    }

    #[tokio::test]
    async fn test_list_reads_top_level_page() {
        let (mock, client) = setup();
        mock.push_json(json!({
            "code": 0,
            "data": [{"id": "m2", "content": "b"}, {"id": "m1", "content": "a"}],
            "first_id": "m2",
            "last_id": "m1",
            "has_more": false
        }));

        let page = client
            .conversations()
            .messages()
            .list(
                "v1",
                &ListMessagesRequest {
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.first_id.as_deref(), Some("m2"));
        assert!(!page.has_more);
        assert_eq!(mock.requests()[0].body.as_ref().unwrap(), &json!({"limit": 2}));
    }

    #[tokio::test]
    async fn test_update_reads_message_field() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "message": {"id": "m1", "content": "edited"}}))
            .push_json(json!({"code": 0, "data": {"id": "m1", "content": "again"}}))
            .push_json(json!({"code": 0}));

        let request = UpdateMessageRequest {
            content: Some("edited".to_string()),
            ..Default::default()
        };
        let message = client.messages().update("v1", "m1", &request).await.unwrap();
        assert_eq!(message.content, "edited");

        let message = client.messages().update("v1", "m1", &request).await.unwrap();
        assert_eq!(message.content, "again");

        let err = client.messages().update("v1", "m1", &request).await.unwrap_err();
        assert!(matches!(err, Error::MissingData("message")));

        let sent = &mock.requests()[0];
        assert_eq!(sent.path, "/v1/conversation/message/modify");
        assert!(sent
            .query
            .contains(&("message_id".to_string(), "m1".to_string())));
    }

    #[tokio::test]
    async fn test_retrieve_and_delete() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "data": {"id": "m1"}}))
            .push_json(json!({"code": 0, "data": {"id": "m1"}}));

        client.messages().retrieve("v1", "m1").await.unwrap();
        client.messages().delete("v1", "m1").await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, reqwest::Method::GET);
        assert_eq!(requests[1].path, "/v1/conversation/message/delete");
    }
}
