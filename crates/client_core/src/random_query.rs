use std::sync::Arc;

use shared::protocol::RandomQuery;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    backend::BackendApi,
    error::failure_message,
    single_flight::{OperationKey, SingleFlight},
    view::{Affordance, AffordanceGuard, InteractionView},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomQueryOutcome {
    Populated(RandomQuery),
    Dropped,
    Failed(String),
}

/// Fills the query input with a backend-suggested question.
#[derive(Clone)]
pub struct RandomQueryController {
    backend: Arc<dyn BackendApi>,
    view: Arc<dyn InteractionView>,
    flights: SingleFlight,
}

impl RandomQueryController {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        view: Arc<dyn InteractionView>,
        flights: SingleFlight,
    ) -> Self {
        Self {
            backend,
            view,
            flights,
        }
    }

    /// The "generate random query" button. Backend errors are shown, except
    /// the empty-database sentinel, which is an expected state.
    pub async fn generate(&self) -> RandomQueryOutcome {
        let Some(_flight) = self.flights.try_enter(OperationKey::RandomQuery) else {
            return RandomQueryOutcome::Dropped;
        };
        let _button = AffordanceGuard::engage(&self.view, vec![Affordance::RandomQueryButton]);

        match self.backend.generate_random_query().await {
            Ok(random) => {
                self.populate(&random);
                if let Some(error) = &random.error {
                    if random.is_no_tables_sentinel() {
                        debug!("random query skipped: database has no tables yet");
                    } else {
                        warn!("random query generation reported: {error}");
                        self.view.show_error(error);
                    }
                }
                RandomQueryOutcome::Populated(random)
            }
            Err(err) => {
                let message = failure_message(&err, "Failed to generate random query");
                warn!("random query generation failed: {err:#}");
                self.view.show_error(&message);
                RandomQueryOutcome::Failed(message)
            }
        }
    }

    /// Best-effort follow-up after another action succeeded. Runs detached
    /// from the caller and never surfaces its own failures.
    pub fn continue_best_effort(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let Some(_flight) = controller.flights.try_enter(OperationKey::RandomQuery) else {
                debug!("random query already running; follow-up skipped");
                return;
            };
            let _button =
                AffordanceGuard::engage(&controller.view, vec![Affordance::RandomQueryButton]);

            match controller.backend.generate_random_query().await {
                Ok(random) => {
                    controller.populate(&random);
                    match &random.error {
                        Some(_) if random.is_no_tables_sentinel() => {}
                        Some(error) => debug!("follow-up random query reported: {error}"),
                        None => {}
                    }
                }
                Err(err) => debug!("follow-up random query failed: {err:#}"),
            }
        })
    }

    fn populate(&self, random: &RandomQuery) {
        info!(query = %random.query, "random query generated");
        self.view.set_query_text(&random.query);
        self.view.focus_query_input();
    }
}

#[cfg(test)]
#[path = "tests/random_query_tests.rs"]
mod tests;
