//! Knowledge documents API.
//!
//! These endpoints live outside the versioned API and return bare bodies
//! (no `data` wrapper). They are called with `Agw-Js-Conv: str` so 64-bit IDs
//! arrive as strings.

use serde::Serialize;

use crate::client::CozeClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{
    CreateDocumentsRequest, Document, DocumentList, ListDocumentsRequest, UpdateDocumentRequest,
};

const JS_CONV_HEADER: &str = "Agw-Js-Conv";

#[derive(Serialize)]
struct DocumentIds<'a> {
    document_ids: &'a [String],
}

/// Documents API client.
pub struct DocumentsApi {
    client: CozeClient,
}

impl DocumentsApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    fn request(action: &str) -> ApiRequest {
        ApiRequest::post(format!("/open_api/knowledge/document/{}", action))
            .header(JS_CONV_HEADER, "str")
    }

    /// Add documents to a dataset. Processing continues in the background.
    pub async fn create(&self, request: &CreateDocumentsRequest) -> Result<Vec<Document>> {
        let created: DocumentList = self
            .client
            .send_body(Self::request("create").json(request)?)
            .await?;
        Ok(created.document_infos)
    }

    /// List documents of a dataset.
    pub async fn list(&self, request: &ListDocumentsRequest) -> Result<DocumentList> {
        self.client
            .send_body(Self::request("list").json(request)?)
            .await
    }

    /// Rename a document or change its refresh policy.
    pub async fn update(&self, request: &UpdateDocumentRequest) -> Result<()> {
        self.client
            .send(Self::request("update").json(request)?)
            .await?;
        Ok(())
    }

    /// Delete documents.
    pub async fn delete(&self, document_ids: &[String]) -> Result<()> {
        self.client
            .send(Self::request("delete").json(&DocumentIds { document_ids })?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use crate::types::{DocumentBase, DocumentStatus};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, CozeClient) {
        let mock = Arc::new(MockTransport::new());
        let client = CozeClient::with_shared_transport(mock.clone());
        (mock, client)
    }

    #[tokio::test]
    async fn test_create_sends_conversion_header() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "msg": "", "document_infos": [
            {"document_id": "7400000000000000001", "name": "notes.txt", "status": 0}
        ]}));

        let documents = client
            .datasets()
            .documents()
            .create(&CreateDocumentsRequest {
                dataset_id: "d1".to_string(),
                document_bases: vec![DocumentBase::local_file("notes.txt", b"hello", "txt")],
                chunk_strategy: None,
                format_type: None,
            })
            .await
            .unwrap();

        assert_eq!(documents[0].document_id, "7400000000000000001");
        assert_eq!(documents[0].document_status(), Some(DocumentStatus::Processing));

        let sent = &mock.requests()[0];
        assert_eq!(sent.path, "/open_api/knowledge/document/create");
        assert_eq!(
            sent.headers,
            vec![("Agw-Js-Conv".to_string(), "str".to_string())]
        );
        assert_eq!(
            sent.body.as_ref().unwrap()["document_bases"][0]["source_info"]["file_base64"],
            "aGVsbG8="
        );
    }

    #[tokio::test]
    async fn test_list_documents() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "total": "2", "document_infos": [
            {"document_id": "1", "status": 1, "size": "1024"},
            {"document_id": 2, "status": 9}
        ]}));

        let page = client
            .documents()
            .list(&ListDocumentsRequest {
                dataset_id: "d1".to_string(),
                page: Some(1),
                size: Some(10),
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.document_infos[0].is_completed());
        assert_eq!(page.document_infos[0].size, 1024);
        assert_eq!(page.document_infos[1].document_id, "2");
        assert!(page.document_infos[1].is_failed());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (mock, client) = setup();
        mock.push_json(json!({"code": 0, "msg": ""}))
            .push_json(json!({"code": 0, "msg": ""}))
            .push_json(json!({"code": 1002, "msg": "document not found"}));

        client
            .documents()
            .update(&UpdateDocumentRequest {
                document_id: "1".to_string(),
                document_name: Some("renamed".to_string()),
                update_rule: None,
            })
            .await
            .unwrap();
        client.documents().delete(&["1".to_string()]).await.unwrap();
        let err = client
            .documents()
            .delete(&["1".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.api_code(), Some(1002));
        let requests = mock.requests();
        assert_eq!(requests[0].path, "/open_api/knowledge/document/update");
        assert_eq!(
            requests[1].body.as_ref().unwrap(),
            &json!({"document_ids": ["1"]})
        );
    }
}
