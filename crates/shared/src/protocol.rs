//! JSON bodies exchanged with the query backend, plus the settled results the
//! console core works with once backend-side `error` fields are folded into
//! failures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{ColumnDescriptor, TableDescriptor, TableName},
    error::ApiException,
};

/// Returned by the random-query endpoint when the database is still empty.
pub const NO_TABLES_SENTINEL: &str = "No tables found in database";

pub type Row = Map<String, Value>;

fn take_error(error: Option<String>) -> Result<(), ApiException> {
    match error {
        Some(message) if !message.is_empty() => Err(ApiException::from_message(message)),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub llm_provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub sql: String,
    #[serde(default)]
    pub results: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub execution_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub execution_time_ms: f64,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl QueryResponse {
    pub fn into_result(self) -> Result<QueryResult, ApiException> {
        take_error(self.error)?;
        Ok(QueryResult {
            sql: self.sql,
            columns: self.columns,
            rows: self.results,
            execution_time_ms: self.execution_time_ms,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomQueryResponse {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Unlike the other endpoints, the random-query text is meaningful even when
/// an error accompanies it, so the error is carried alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomQuery {
    pub query: String,
    pub error: Option<String>,
}

impl RandomQuery {
    pub fn is_no_tables_sentinel(&self) -> bool {
        self.error.as_deref() == Some(NO_TABLES_SENTINEL)
    }
}

impl From<RandomQueryResponse> for RandomQuery {
    fn from(value: RandomQueryResponse) -> Self {
        Self {
            query: value.query,
            error: value.error.filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub table_name: String,
    #[serde(default)]
    pub table_schema: HashMap<String, String>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub sample_data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub table_name: TableName,
    pub row_count: u64,
}

impl FileUploadResponse {
    pub fn into_receipt(self) -> Result<UploadReceipt, ApiException> {
        take_error(self.error)?;
        Ok(UploadReceipt {
            table_name: TableName(self.table_name),
            row_count: self.row_count,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub row_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
    #[serde(default)]
    pub total_tables: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SchemaResponse {
    pub fn into_tables(self) -> Result<Vec<TableDescriptor>, ApiException> {
        take_error(self.error)?;
        Ok(self
            .tables
            .into_iter()
            .map(|table| TableDescriptor {
                name: TableName(table.name),
                row_count: table.row_count,
                columns: table
                    .columns
                    .into_iter()
                    .map(|column| ColumnDescriptor {
                        name: column.name,
                        column_type: column.column_type,
                    })
                    .collect(),
            })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDataRequest {
    pub table_name: TableName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDataResponse {
    #[serde(default)]
    pub rows_added: u64,
    #[serde(default)]
    pub new_row_count: u64,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateDataReceipt {
    pub rows_added: u64,
    pub new_row_count: u64,
    pub table_name: TableName,
}

impl GenerateDataResponse {
    pub fn into_receipt(self) -> Result<GenerateDataReceipt, ApiException> {
        take_error(self.error)?;
        Ok(GenerateDataReceipt {
            rows_added: self.rows_added,
            new_row_count: self.new_row_count,
            table_name: TableName(self.table_name),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTableRequest {
    pub table_name: TableName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExportRequest {
    pub data: Vec<Row>,
    pub columns: Vec<String>,
}

/// Error body produced by the backend for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
