//! Per-table row actions. Each action is single-flighted by table, so work on
//! one table never blocks another.

use std::sync::Arc;

use shared::{domain::TableName, protocol::GenerateDataReceipt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    backend::BackendApi,
    error::failure_message,
    export::{ExportController, ExportOutcome},
    random_query::RandomQueryController,
    schema::SchemaRefresher,
    single_flight::{OperationKey, SingleFlight},
    view::{Affordance, AffordanceGuard, Banners, InteractionView},
};

#[derive(Debug)]
pub enum TableActionOutcome {
    Removed,
    Generated {
        receipt: GenerateDataReceipt,
        /// The random-query follow-up. It does not hold the table's slot.
        follow_up: JoinHandle<()>,
    },
    /// The user declined the confirmation.
    Declined,
    /// The same action was already running for this table.
    Dropped,
    Failed(String),
}

#[derive(Clone)]
pub struct TableActionController {
    backend: Arc<dyn BackendApi>,
    view: Arc<dyn InteractionView>,
    flights: SingleFlight,
    banners: Banners,
    schema: SchemaRefresher,
    random_query: RandomQueryController,
    export: ExportController,
}

impl TableActionController {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        view: Arc<dyn InteractionView>,
        flights: SingleFlight,
        banners: Banners,
        schema: SchemaRefresher,
        random_query: RandomQueryController,
        export: ExportController,
    ) -> Self {
        Self {
            backend,
            view,
            flights,
            banners,
            schema,
            random_query,
            export,
        }
    }

    pub async fn remove_table(&self, table: &TableName) -> TableActionOutcome {
        let key = OperationKey::RemoveTable(table.clone());
        if self.flights.is_busy(&key) {
            return TableActionOutcome::Dropped;
        }
        if !self.view.confirm(&format!(
            "Are you sure you want to remove the table \"{table}\"?"
        )) {
            debug!(table = %table, "table removal declined");
            return TableActionOutcome::Declined;
        }
        let Some(_flight) = self.flights.try_enter(key) else {
            return TableActionOutcome::Dropped;
        };
        let _control =
            AffordanceGuard::engage(&self.view, vec![Affordance::RemoveTable(table.clone())]);

        match self.backend.delete_table(table).await {
            Ok(()) => {
                info!(table = %table, "table removed");
                self.schema.reload().await;
                self.banners
                    .show(&format!("Table \"{table}\" removed successfully!"));
                TableActionOutcome::Removed
            }
            Err(err) => {
                let message = failure_message(&err, "Failed to remove table");
                warn!(table = %table, "table removal failed: {err:#}");
                self.view.show_error(&message);
                TableActionOutcome::Failed(message)
            }
        }
    }

    pub async fn generate_data(&self, table: &TableName) -> TableActionOutcome {
        let Some(_flight) = self
            .flights
            .try_enter(OperationKey::GenerateData(table.clone()))
        else {
            return TableActionOutcome::Dropped;
        };
        let _control =
            AffordanceGuard::engage(&self.view, vec![Affordance::GenerateData(table.clone())]);

        match self.backend.generate_table_data(table).await {
            Ok(receipt) => {
                info!(
                    table = %receipt.table_name,
                    rows_added = receipt.rows_added,
                    total = receipt.new_row_count,
                    "synthetic rows generated"
                );
                self.banners.show(&format!(
                    "Generated {} rows for table '{}'. New total: {} rows.",
                    receipt.rows_added, receipt.table_name, receipt.new_row_count
                ));
                self.schema.reload().await;
                let follow_up = self.random_query.continue_best_effort();
                TableActionOutcome::Generated { receipt, follow_up }
            }
            Err(err) => {
                let message = format!(
                    "Failed to generate data: {}",
                    failure_message(&err, "unknown error")
                );
                warn!(table = %table, "data generation failed: {err:#}");
                self.view.show_error(&message);
                TableActionOutcome::Failed(message)
            }
        }
    }

    pub async fn export_table(&self, table: &TableName) -> ExportOutcome {
        self.export.export_table(table).await
    }
}

#[cfg(test)]
#[path = "tests/table_actions_tests.rs"]
mod tests;
