//! Upload path shared by the file picker, drop surfaces and the sample-data
//! shortcuts.

use std::sync::Arc;

use shared::{
    domain::{DataFileKind, SampleDataset, UploadFile},
    protocol::UploadReceipt,
};
use tracing::{debug, info, warn};

use crate::{
    backend::BackendApi,
    error::{failure_message, ClientError},
    schema::SchemaRefresher,
    single_flight::{OperationKey, SingleFlight},
    view::{Affordance, AffordanceGuard, Banners, InteractionView},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed(UploadReceipt),
    /// Another upload was still in flight.
    Dropped,
    /// Refused locally; no backend call was made.
    Rejected(ClientError),
    Failed(String),
}

pub fn validate_data_file(file: &UploadFile) -> Result<DataFileKind, ClientError> {
    file.kind().ok_or_else(|| ClientError::InvalidFileType {
        file_name: file.file_name.clone(),
    })
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    backend: Arc<dyn BackendApi>,
    view: Arc<dyn InteractionView>,
    flights: SingleFlight,
    banners: Banners,
    schema: SchemaRefresher,
}

impl UploadOrchestrator {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        view: Arc<dyn InteractionView>,
        flights: SingleFlight,
        banners: Banners,
        schema: SchemaRefresher,
    ) -> Self {
        Self {
            backend,
            view,
            flights,
            banners,
            schema,
        }
    }

    pub async fn upload_from_picker(&self, file: UploadFile) -> UploadOutcome {
        if let Err(err) = validate_data_file(&file) {
            self.view.show_error(&err.to_string());
            return UploadOutcome::Rejected(err);
        }
        self.upload_file(file).await
    }

    /// Uploads an already validated file.
    pub async fn upload_file(&self, file: UploadFile) -> UploadOutcome {
        let Some(_flight) = self.flights.try_enter(OperationKey::Upload) else {
            debug!(file_name = %file.file_name, "upload already running; file dropped");
            return UploadOutcome::Dropped;
        };
        self.transfer(file).await
    }

    /// Fetches one of the bundled datasets and uploads it. `sample` is the
    /// dataset name carried by the dialog shortcut.
    pub async fn load_sample(&self, sample: &str) -> UploadOutcome {
        let sample = match sample.parse::<SampleDataset>() {
            Ok(sample) => sample,
            Err(err) => {
                let err = ClientError::from(err);
                self.view.show_error(&err.to_string());
                return UploadOutcome::Rejected(err);
            }
        };

        let Some(_flight) = self.flights.try_enter(OperationKey::Upload) else {
            debug!(?sample, "upload already running; sample load dropped");
            return UploadOutcome::Dropped;
        };
        let file = match self.backend.fetch_sample(sample).await {
            Ok(file) => file,
            Err(err) => {
                let message = failure_message(&err, "Failed to load sample data");
                warn!(?sample, "sample data fetch failed: {err:#}");
                self.view.show_error(&message);
                return UploadOutcome::Failed(message);
            }
        };
        self.transfer(file).await
    }

    async fn transfer(&self, file: UploadFile) -> UploadOutcome {
        let _picker = AffordanceGuard::engage(&self.view, vec![Affordance::UploadPicker]);
        info!(file_name = %file.file_name, bytes = file.bytes.len(), "uploading data file");

        match self.backend.upload_file(&file).await {
            Ok(receipt) => {
                info!(
                    table = %receipt.table_name,
                    rows = receipt.row_count,
                    "upload created table"
                );
                self.view.close_upload_dialog();
                self.banners.show(&format!(
                    "Table \"{}\" created successfully with {} rows!",
                    receipt.table_name, receipt.row_count
                ));
                self.schema.reload().await;
                UploadOutcome::Completed(receipt)
            }
            Err(err) => {
                let message = failure_message(&err, "Upload failed");
                warn!(file_name = %file.file_name, "upload failed: {err:#}");
                self.view.show_error(&message);
                UploadOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
