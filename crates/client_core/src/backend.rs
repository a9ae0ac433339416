//! The query backend as the controllers see it, and its HTTP implementation.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{SampleDataset, TableDescriptor, TableName, UploadFile},
    protocol::{
        ErrorDetail, ExportTableRequest, FileUploadResponse, GenerateDataReceipt,
        GenerateDataRequest, GenerateDataResponse, QueryExportRequest, QueryRequest,
        QueryResponse, QueryResult, RandomQuery, RandomQueryResponse, Row, SchemaResponse,
        UploadReceipt,
    },
};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_LLM_PROVIDER: &str = "openai";

/// Every call settles exactly once with a result or an error whose message is
/// fit to show the user.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn execute_query(&self, text: &str) -> Result<QueryResult>;
    async fn generate_random_query(&self) -> Result<RandomQuery>;
    async fn upload_file(&self, file: &UploadFile) -> Result<UploadReceipt>;
    async fn fetch_schema(&self) -> Result<Vec<TableDescriptor>>;
    async fn delete_table(&self, table: &TableName) -> Result<()>;
    async fn generate_table_data(&self, table: &TableName) -> Result<GenerateDataReceipt>;
    async fn export_results_csv(&self, rows: &[Row], columns: &[String]) -> Result<Vec<u8>>;
    async fn export_table_csv(&self, table: &TableName) -> Result<Vec<u8>>;
    async fn fetch_sample(&self, sample: SampleDataset) -> Result<UploadFile>;
}

pub struct HttpBackend {
    http: Client,
    base_url: Url,
    llm_provider: String,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(server_url).with_context(|| format!("invalid server url: {server_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("server url cannot carry paths: {server_url}"));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            llm_provider: DEFAULT_LLM_PROVIDER.to_string(),
        })
    }

    pub fn with_llm_provider(mut self, llm_provider: impl Into<String>) -> Self {
        self.llm_provider = llm_provider.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn error_detail(response: Response) -> Option<String> {
    response
        .json::<ErrorDetail>()
        .await
        .ok()
        .map(|body| body.detail)
}

/// Passes 2xx responses through. Anything else fails with the backend's
/// `detail` message when the body carries one.
async fn accepted(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    match error_detail(response).await {
        Some(detail) if !detail.is_empty() => Err(anyhow!(detail)),
        _ => Err(anyhow!("request to {url} failed with status {status}")),
    }
}

/// Sends `request` and decodes its JSON body.
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    Ok(accepted(request.send().await?).await?.json().await?)
}

async fn send_bytes(request: RequestBuilder) -> Result<Vec<u8>> {
    Ok(accepted(request.send().await?).await?.bytes().await?.to_vec())
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn execute_query(&self, text: &str) -> Result<QueryResult> {
        let response: QueryResponse = send_json(
            self.http
                .post(self.endpoint(&["api", "query"]))
                .json(&QueryRequest {
                    query: text.to_string(),
                    llm_provider: self.llm_provider.clone(),
                }),
        )
        .await?;
        Ok(response.into_result()?)
    }

    async fn generate_random_query(&self) -> Result<RandomQuery> {
        let response: RandomQueryResponse =
            send_json(self.http.get(self.endpoint(&["api", "generate-random-query"]))).await?;
        Ok(response.into())
    }

    async fn upload_file(&self, file: &UploadFile) -> Result<UploadReceipt> {
        let mut part = multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .with_context(|| format!("invalid content type: {content_type}"))?;
        }
        let form = multipart::Form::new().part("file", part);

        let response: FileUploadResponse = send_json(
            self.http
                .post(self.endpoint(&["api", "upload"]))
                .multipart(form),
        )
        .await?;
        Ok(response.into_receipt()?)
    }

    async fn fetch_schema(&self) -> Result<Vec<TableDescriptor>> {
        let response: SchemaResponse =
            send_json(self.http.get(self.endpoint(&["api", "schema"]))).await?;
        Ok(response.into_tables()?)
    }

    async fn delete_table(&self, table: &TableName) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "table", table.as_str()]))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            warn!(table = %table, %status, ?detail, "table deletion rejected");
            return Err(anyhow!("Failed to remove table"));
        }
        Ok(())
    }

    async fn generate_table_data(&self, table: &TableName) -> Result<GenerateDataReceipt> {
        let response: GenerateDataResponse = send_json(
            self.http
                .post(self.endpoint(&["api", "generate-data"]))
                .json(&GenerateDataRequest {
                    table_name: table.clone(),
                }),
        )
        .await?;
        Ok(response.into_receipt()?)
    }

    async fn export_results_csv(&self, rows: &[Row], columns: &[String]) -> Result<Vec<u8>> {
        send_bytes(
            self.http
                .post(self.endpoint(&["api", "export", "query"]))
                .json(&QueryExportRequest {
                    data: rows.to_vec(),
                    columns: columns.to_vec(),
                }),
        )
        .await
    }

    async fn export_table_csv(&self, table: &TableName) -> Result<Vec<u8>> {
        send_bytes(
            self.http
                .post(self.endpoint(&["api", "export", "table"]))
                .json(&ExportTableRequest {
                    table_name: table.clone(),
                }),
        )
        .await
    }

    async fn fetch_sample(&self, sample: SampleDataset) -> Result<UploadFile> {
        let file_name = sample.file_name();
        let response = self
            .http
            .get(self.endpoint(&["sample-data", file_name]))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            debug!(file_name, status = %response.status(), "sample data unavailable");
            return Err(anyhow!("Failed to load sample data"));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        let mut file = UploadFile::new(file_name, bytes.to_vec());
        file.content_type = content_type;
        Ok(file)
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
