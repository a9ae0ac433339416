//! CSV downloads of the current result set or of a whole table.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use shared::{domain::TableName, protocol::QueryResult};
use tracing::{info, warn};

use crate::{backend::BackendApi, view::InteractionView};

pub const RESULTS_EXPORT_FILE_NAME: &str = "query_results.csv";

pub fn table_export_file_name(table: &TableName) -> String {
    format!("{table}_export.csv")
}

/// The last rendered result set and whether the results panel is expanded.
#[derive(Clone)]
pub struct ResultsPanel {
    last: Arc<Mutex<Option<QueryResult>>>,
    visible: Arc<AtomicBool>,
}

impl Default for ResultsPanel {
    fn default() -> Self {
        Self {
            last: Arc::new(Mutex::new(None)),
            visible: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl ResultsPanel {
    pub fn store(&self, result: QueryResult) {
        *self.lock() = Some(result);
        self.visible.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn current(&self) -> Option<QueryResult> {
        self.lock().clone()
    }

    /// Export is offered only for a non-empty result set.
    pub fn exportable(&self) -> bool {
        self.lock().as_ref().is_some_and(|result| !result.is_empty())
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    /// Flips the panel between shown and hidden, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.visible.fetch_xor(true, Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Option<QueryResult>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Delivered { file_name: String, bytes: usize },
    /// Nothing to export; no backend call was made.
    Unavailable,
    Failed(String),
}

#[derive(Clone)]
pub struct ExportController {
    backend: Arc<dyn BackendApi>,
    view: Arc<dyn InteractionView>,
    panel: ResultsPanel,
}

impl ExportController {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        view: Arc<dyn InteractionView>,
        panel: ResultsPanel,
    ) -> Self {
        Self {
            backend,
            view,
            panel,
        }
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    pub fn toggle_results(&self) -> bool {
        let visible = self.panel.toggle();
        self.view.set_results_visible(visible);
        visible
    }

    pub async fn export_results(&self) -> ExportOutcome {
        let Some(result) = self.panel.current().filter(|result| !result.is_empty()) else {
            return ExportOutcome::Unavailable;
        };
        match self
            .backend
            .export_results_csv(&result.rows, &result.columns)
            .await
        {
            Ok(bytes) => self.deliver(RESULTS_EXPORT_FILE_NAME.to_string(), bytes),
            Err(err) => {
                warn!("result export failed: {err:#}");
                self.fail("Failed to export results")
            }
        }
    }

    pub async fn export_table(&self, table: &TableName) -> ExportOutcome {
        match self.backend.export_table_csv(table).await {
            Ok(bytes) => self.deliver(table_export_file_name(table), bytes),
            Err(err) => {
                warn!(table = %table, "table export failed: {err:#}");
                self.fail("Failed to export table")
            }
        }
    }

    fn deliver(&self, file_name: String, bytes: Vec<u8>) -> ExportOutcome {
        info!(file_name = %file_name, bytes = bytes.len(), "csv export ready");
        self.view.deliver_download(&file_name, &bytes);
        ExportOutcome::Delivered {
            file_name,
            bytes: bytes.len(),
        }
    }

    fn fail(&self, message: &str) -> ExportOutcome {
        self.view.show_error(message);
        ExportOutcome::Failed(message.to_string())
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
