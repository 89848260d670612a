//! Knowledge datasets API.

use serde::Serialize;

use crate::api::DocumentsApi;
use crate::client::CozeClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{
    CreateDatasetRequest, CreatedDataset, DatasetList, DocumentProgress, ListDatasetsQuery,
    ProgressData, UpdateDatasetRequest,
};

#[derive(Serialize)]
struct DocumentIds<'a> {
    document_ids: &'a [String],
}

/// Datasets API client.
pub struct DatasetsApi {
    client: CozeClient,
}

impl DatasetsApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Create a dataset.
    pub async fn create(&self, request: &CreateDatasetRequest) -> Result<CreatedDataset> {
        self.client
            .send_data(ApiRequest::post("/v1/datasets").json(request)?)
            .await
    }

    /// List datasets of a space.
    pub async fn list(&self, query: &ListDatasetsQuery) -> Result<DatasetList> {
        self.client
            .send_data(ApiRequest::get("/v1/datasets").query_from(query)?)
            .await
    }

    /// Rename or re-describe a dataset. Unset fields are cleared server side.
    pub async fn update(&self, dataset_id: &str, request: &UpdateDatasetRequest) -> Result<()> {
        self.client
            .send(ApiRequest::put(format!("/v1/datasets/{}", dataset_id)).json(request)?)
            .await?;
        Ok(())
    }

    /// Delete a dataset and all its documents.
    pub async fn delete(&self, dataset_id: &str) -> Result<()> {
        self.client
            .send(ApiRequest::delete(format!("/v1/datasets/{}", dataset_id)))
            .await?;
        Ok(())
    }

    /// Get the processing progress of documents.
    pub async fn process(
        &self,
        dataset_id: &str,
        document_ids: &[String],
    ) -> Result<Vec<DocumentProgress>> {
        let progress: ProgressData = self
            .client
            .send_data(
                ApiRequest::post(format!("/v1/datasets/{}/process", dataset_id))
                    .json(&DocumentIds { document_ids })?,
            )
            .await?;
        Ok(progress.data)
    }

    /// Access the documents of datasets.
    pub fn documents(&self) -> DocumentsApi {
        DocumentsApi::new(self.client.clone())
    }
}
