//! Recording view and scripted backend shared by the controller tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{ColumnDescriptor, SampleDataset, TableDescriptor, TableName, UploadFile},
    protocol::{GenerateDataReceipt, QueryResult, RandomQuery, Row, UploadReceipt},
};

use crate::{
    backend::BackendApi,
    drag_zone::ZoneId,
    view::{Affordance, AffordanceState, BannerId, InteractionView},
    CoreOptions, InteractionCore,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ViewEvent {
    Affordance(Affordance, AffordanceState),
    QueryText(String),
    Focused,
    OverlayShown(ZoneId),
    OverlayHidden(ZoneId),
    Results { query: String, rows: usize },
    ResultsVisible(bool),
    Tables(Vec<String>),
    Error(String),
    Success(BannerId, String),
    Dismissed(BannerId),
    DialogClosed,
    Confirm(String),
    Download { file_name: String, bytes: usize },
}

pub(crate) struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    query_text: Mutex<String>,
    confirm_answer: bool,
}

impl RecordingView {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_confirm(true)
    }

    pub(crate) fn with_confirm(confirm_answer: bool) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            query_text: Mutex::new(String::new()),
            confirm_answer,
        })
    }

    pub(crate) fn type_query(&self, text: &str) {
        *self.query_text.lock().expect("query text") = text.to_string();
    }

    pub(crate) fn current_query(&self) -> String {
        self.query_text.lock().expect("query text").clone()
    }

    pub(crate) fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().expect("events").clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn successes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Success(_, message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn affordance(&self, affordance: &Affordance) -> Option<AffordanceState> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                ViewEvent::Affordance(a, state) if &a == affordance => Some(state),
                _ => None,
            })
    }

    pub(crate) fn overlay_visible(&self, zone: &ZoneId) -> bool {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                ViewEvent::OverlayShown(z) if &z == zone => Some(true),
                ViewEvent::OverlayHidden(z) if &z == zone => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn record(&self, event: ViewEvent) {
        self.events.lock().expect("events").push(event);
    }
}

impl InteractionView for RecordingView {
    fn set_affordance(&self, affordance: &Affordance, state: AffordanceState) {
        self.record(ViewEvent::Affordance(affordance.clone(), state));
    }

    fn query_text(&self) -> String {
        self.current_query()
    }

    fn set_query_text(&self, text: &str) {
        self.type_query(text);
        self.record(ViewEvent::QueryText(text.to_string()));
    }

    fn focus_query_input(&self) {
        self.record(ViewEvent::Focused);
    }

    fn show_drop_overlay(&self, zone: &ZoneId) {
        self.record(ViewEvent::OverlayShown(zone.clone()));
    }

    fn hide_drop_overlay(&self, zone: &ZoneId) {
        self.record(ViewEvent::OverlayHidden(zone.clone()));
    }

    fn render_results(&self, query: &str, result: &QueryResult) {
        self.record(ViewEvent::Results {
            query: query.to_string(),
            rows: result.rows.len(),
        });
    }

    fn set_results_visible(&self, visible: bool) {
        self.record(ViewEvent::ResultsVisible(visible));
    }

    fn render_tables(&self, tables: &[TableDescriptor]) {
        self.record(ViewEvent::Tables(
            tables.iter().map(|t| t.name.to_string()).collect(),
        ));
    }

    fn show_error(&self, message: &str) {
        self.record(ViewEvent::Error(message.to_string()));
    }

    fn show_success(&self, banner: BannerId, message: &str) {
        self.record(ViewEvent::Success(banner, message.to_string()));
    }

    fn dismiss_success(&self, banner: BannerId) {
        self.record(ViewEvent::Dismissed(banner));
    }

    fn close_upload_dialog(&self) {
        self.record(ViewEvent::DialogClosed);
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.record(ViewEvent::Confirm(prompt.to_string()));
        self.confirm_answer
    }

    fn deliver_download(&self, file_name: &str, bytes: &[u8]) {
        self.record(ViewEvent::Download {
            file_name: file_name.to_string(),
            bytes: bytes.len(),
        });
    }
}

/// A full core wired to a scripted backend and a recording view.
pub(crate) struct Harness {
    pub(crate) backend: Arc<ScriptedBackend>,
    pub(crate) view: Arc<RecordingView>,
    pub(crate) core: InteractionCore,
}

impl Harness {
    pub(crate) fn new(backend: ScriptedBackend) -> Self {
        Self::with_view(backend, RecordingView::new())
    }

    pub(crate) fn with_view(backend: ScriptedBackend, view: Arc<RecordingView>) -> Self {
        let backend = Arc::new(backend);
        let core = InteractionCore::new(
            backend.clone() as Arc<dyn BackendApi>,
            view.clone() as Arc<dyn InteractionView>,
            CoreOptions::default(),
        );
        Self {
            backend,
            view,
            core,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BackendCall {
    ExecuteQuery(String),
    RandomQuery,
    Upload(String),
    FetchSchema,
    DeleteTable(String),
    GenerateData(String),
    ExportResults(usize),
    ExportTable(String),
    FetchSample(String),
}

/// Backend double. Failures and latencies are configured per call kind;
/// every call is logged in order.
pub(crate) struct ScriptedBackend {
    pub(crate) calls: Mutex<Vec<BackendCall>>,
    pub(crate) latency: Duration,
    pub(crate) generate_latency: HashMap<TableName, Duration>,
    pub(crate) tables: Vec<TableDescriptor>,
    pub(crate) rows: Vec<Row>,
    pub(crate) random: RandomQuery,
    pub(crate) query_error: Option<String>,
    pub(crate) random_error: Option<String>,
    pub(crate) upload_error: Option<String>,
    pub(crate) schema_error: Option<String>,
    pub(crate) delete_error: Option<String>,
    pub(crate) generate_error: Option<String>,
    pub(crate) export_error: Option<String>,
    pub(crate) sample_error: Option<String>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            generate_latency: HashMap::new(),
            tables: vec![table("users", 10)],
            rows: vec![row("id", 1), row("id", 2)],
            random: RandomQuery {
                query: "How many users signed up last week?".to_string(),
                error: None,
            },
            query_error: None,
            random_error: None,
            upload_error: None,
            schema_error: None,
            delete_error: None,
            generate_error: None,
            export_error: None,
            sample_error: None,
        }
    }
}

impl ScriptedBackend {
    pub(crate) fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    async fn enter(&self, call: BackendCall, latency: Duration) {
        self.calls.lock().expect("calls").push(call);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

fn settle<T>(error: &Option<String>, value: impl FnOnce() -> T) -> Result<T> {
    match error {
        Some(message) => Err(anyhow!(message.clone())),
        None => Ok(value()),
    }
}

pub(crate) fn table(name: &str, row_count: u64) -> TableDescriptor {
    TableDescriptor {
        name: TableName::new(name),
        row_count,
        columns: vec![ColumnDescriptor {
            name: "id".to_string(),
            column_type: "INTEGER".to_string(),
        }],
    }
}

pub(crate) fn row(column: &str, value: i64) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), value.into());
    row
}

pub(crate) fn csv_file(name: &str) -> UploadFile {
    UploadFile::new(name, b"id,name\n1,ada\n".to_vec()).with_content_type("text/csv")
}

#[async_trait]
impl BackendApi for ScriptedBackend {
    async fn execute_query(&self, text: &str) -> Result<QueryResult> {
        self.enter(BackendCall::ExecuteQuery(text.to_string()), self.latency)
            .await;
        settle(&self.query_error, || QueryResult {
            sql: "SELECT * FROM users".to_string(),
            columns: vec!["id".to_string()],
            rows: self.rows.clone(),
            execution_time_ms: 1.5,
        })
    }

    async fn generate_random_query(&self) -> Result<RandomQuery> {
        self.enter(BackendCall::RandomQuery, self.latency).await;
        settle(&self.random_error, || self.random.clone())
    }

    async fn upload_file(&self, file: &UploadFile) -> Result<UploadReceipt> {
        self.enter(BackendCall::Upload(file.file_name.clone()), self.latency)
            .await;
        settle(&self.upload_error, || UploadReceipt {
            table_name: TableName::new(
                file.file_name
                    .rsplit_once('.')
                    .map_or(file.file_name.as_str(), |(stem, _)| stem),
            ),
            row_count: 1,
        })
    }

    async fn fetch_schema(&self) -> Result<Vec<TableDescriptor>> {
        self.enter(BackendCall::FetchSchema, self.latency).await;
        settle(&self.schema_error, || self.tables.clone())
    }

    async fn delete_table(&self, table: &TableName) -> Result<()> {
        self.enter(BackendCall::DeleteTable(table.to_string()), self.latency)
            .await;
        settle(&self.delete_error, || ())
    }

    async fn generate_table_data(&self, table: &TableName) -> Result<GenerateDataReceipt> {
        let latency = self
            .generate_latency
            .get(table)
            .copied()
            .unwrap_or(self.latency);
        self.enter(BackendCall::GenerateData(table.to_string()), latency)
            .await;
        settle(&self.generate_error, || GenerateDataReceipt {
            rows_added: 50,
            new_row_count: 60,
            table_name: table.clone(),
        })
    }

    async fn export_results_csv(&self, rows: &[Row], _columns: &[String]) -> Result<Vec<u8>> {
        self.enter(BackendCall::ExportResults(rows.len()), self.latency)
            .await;
        settle(&self.export_error, || b"id\n1\n2\n".to_vec())
    }

    async fn export_table_csv(&self, table: &TableName) -> Result<Vec<u8>> {
        self.enter(BackendCall::ExportTable(table.to_string()), self.latency)
            .await;
        settle(&self.export_error, || b"id\n1\n".to_vec())
    }

    async fn fetch_sample(&self, sample: SampleDataset) -> Result<UploadFile> {
        self.enter(
            BackendCall::FetchSample(sample.file_name().to_string()),
            self.latency,
        )
        .await;
        settle(&self.sample_error, || {
            UploadFile::new(sample.file_name(), b"[]".to_vec())
        })
    }
}
