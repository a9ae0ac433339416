//! Interaction-control core of the query console.
//!
//! Controllers turn user triggers into backend calls while keeping the
//! console's controls consistent: submissions are debounced, each logical
//! operation is single-flighted, drop surfaces track nested drags, and every
//! operation restores its controls however it settles.

use std::{sync::Arc, time::Duration};

pub mod backend;
pub mod debounce;
pub mod drag_zone;
pub mod error;
pub mod export;
pub mod query;
pub mod random_query;
pub mod schema;
pub mod single_flight;
pub mod table_actions;
pub mod upload;
pub mod view;

pub use backend::{BackendApi, HttpBackend};
pub use debounce::DebounceGate;
pub use drag_zone::{DragEvent, DragEventKind, DragPayload, DropZones, ZoneId};
pub use error::ClientError;
pub use export::{ExportController, ResultsPanel};
pub use query::QuerySubmissionController;
pub use random_query::RandomQueryController;
pub use schema::SchemaRefresher;
pub use single_flight::{OperationKey, SingleFlight};
pub use table_actions::TableActionController;
pub use upload::UploadOrchestrator;
pub use view::{Affordance, AffordanceState, BannerId, Banners, InteractionView};

#[derive(Debug, Clone)]
pub struct CoreOptions {
    pub debounce_delay: Duration,
    pub banner_ttl: Duration,
    pub drop_zones: Vec<ZoneId>,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            debounce_delay: debounce::DEFAULT_DEBOUNCE_DELAY,
            banner_ttl: view::DEFAULT_BANNER_TTL,
            drop_zones: vec![ZoneId::query_section(), ZoneId::tables_section()],
        }
    }
}

/// Every controller of one console, sharing a single busy-key registry.
#[derive(Clone)]
pub struct InteractionCore {
    pub query: QuerySubmissionController,
    pub random_query: RandomQueryController,
    pub uploads: UploadOrchestrator,
    pub drop_zones: DropZones,
    pub tables: TableActionController,
    pub schema: SchemaRefresher,
    pub export: ExportController,
    flights: SingleFlight,
}

impl InteractionCore {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        view: Arc<dyn InteractionView>,
        options: CoreOptions,
    ) -> Self {
        let flights = SingleFlight::new();
        let banners = Banners::new(Arc::clone(&view), options.banner_ttl);
        let results = ResultsPanel::default();
        let schema = SchemaRefresher::new(Arc::clone(&backend), Arc::clone(&view));
        let export = ExportController::new(Arc::clone(&backend), Arc::clone(&view), results.clone());
        let random_query =
            RandomQueryController::new(Arc::clone(&backend), Arc::clone(&view), flights.clone());
        let query = QuerySubmissionController::new(
            Arc::clone(&backend),
            Arc::clone(&view),
            DebounceGate::new(options.debounce_delay),
            flights.clone(),
            results,
        );
        let uploads = UploadOrchestrator::new(
            Arc::clone(&backend),
            Arc::clone(&view),
            flights.clone(),
            banners.clone(),
            schema.clone(),
        );
        let drop_zones = DropZones::new(Arc::clone(&view), uploads.clone(), options.drop_zones);
        let tables = TableActionController::new(
            backend,
            view,
            flights.clone(),
            banners,
            schema.clone(),
            random_query.clone(),
            export.clone(),
        );

        Self {
            query,
            random_query,
            uploads,
            drop_zones,
            tables,
            schema,
            export,
            flights,
        }
    }

    pub fn flights(&self) -> &SingleFlight {
        &self.flights
    }

    /// Initial page load: show whatever tables already exist.
    pub async fn start(&self) {
        self.schema.reload().await;
    }
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
