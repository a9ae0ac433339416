use std::sync::Arc;

use tracing::{debug, warn};

use crate::{backend::BackendApi, view::InteractionView};

/// Reloads the table list after anything that may have changed it.
///
/// Reloads are best-effort: the action that triggered one has already
/// succeeded, so a failed reload is logged and the stale list stays up.
#[derive(Clone)]
pub struct SchemaRefresher {
    backend: Arc<dyn BackendApi>,
    view: Arc<dyn InteractionView>,
}

impl SchemaRefresher {
    pub fn new(backend: Arc<dyn BackendApi>, view: Arc<dyn InteractionView>) -> Self {
        Self { backend, view }
    }

    /// Returns whether the displayed list was replaced.
    pub async fn reload(&self) -> bool {
        match self.backend.fetch_schema().await {
            Ok(tables) => {
                debug!(tables = tables.len(), "schema reloaded");
                self.view.render_tables(&tables);
                true
            }
            Err(err) => {
                warn!("failed to load schema: {err:#}");
                false
            }
        }
    }
}
