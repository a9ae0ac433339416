//! Query submission: button activation or Ctrl/Cmd+Enter in the input.
//!
//! The controls are disabled the moment a submission is accepted, before the
//! debounce timer fires, so a double activation collapses into one call
//! instead of queuing several.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    backend::BackendApi,
    debounce::DebounceGate,
    error::failure_message,
    export::ResultsPanel,
    single_flight::{OperationKey, SingleFlight},
    view::{Affordance, AffordanceGuard, AffordanceState, InteractionView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn meta(key: Key) -> Self {
        Self {
            meta: true,
            ..Self::plain(key)
        }
    }

    pub fn is_submit_accelerator(&self) -> bool {
        (self.ctrl || self.meta) && self.key == Key::Enter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Scheduled,
    IgnoredEmpty,
    IgnoredBusy,
}

const QUERY_AFFORDANCES: [Affordance; 2] = [Affordance::QueryInput, Affordance::QueryButton];

#[derive(Clone)]
pub struct QuerySubmissionController {
    backend: Arc<dyn BackendApi>,
    view: Arc<dyn InteractionView>,
    gate: DebounceGate,
    flights: SingleFlight,
    results: ResultsPanel,
}

impl QuerySubmissionController {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        view: Arc<dyn InteractionView>,
        gate: DebounceGate,
        flights: SingleFlight,
        results: ResultsPanel,
    ) -> Self {
        Self {
            backend,
            view,
            gate,
            flights,
            results,
        }
    }

    pub fn submit(&self) -> SubmitOutcome {
        let text = self.view.query_text().trim().to_string();
        if text.is_empty() {
            return SubmitOutcome::IgnoredEmpty;
        }
        if self.flights.is_busy(&OperationKey::Query) {
            debug!("query already running; submission ignored");
            return SubmitOutcome::IgnoredBusy;
        }

        for affordance in &QUERY_AFFORDANCES {
            self.view.set_affordance(affordance, AffordanceState::Busy);
        }
        debug!(delay = ?self.gate.delay(), "query submission scheduled");
        let controller = self.clone();
        self.gate
            .schedule(move || async move { controller.execute(text).await });
        SubmitOutcome::Scheduled
    }

    /// Key handler for the query input. Only the submit accelerator reacts.
    pub fn on_key(&self, chord: KeyChord) -> Option<SubmitOutcome> {
        chord.is_submit_accelerator().then(|| self.submit())
    }

    /// Runs one query. Normally reached through the debounce timer.
    pub async fn execute(&self, text: String) {
        let Some(_flight) = self.flights.try_enter(OperationKey::Query) else {
            return;
        };
        let _controls = AffordanceGuard::engage(&self.view, QUERY_AFFORDANCES.to_vec());

        info!(query = %text, "executing query");
        match self.backend.execute_query(&text).await {
            Ok(result) => {
                info!(sql = %result.sql, rows = result.rows.len(), "query succeeded");
                self.view.render_results(&text, &result);
                self.view.set_query_text("");
                self.results.store(result);
            }
            Err(err) => {
                warn!(query = %text, "query failed: {err:#}");
                self.results.clear();
                self.view.show_error(&failure_message(&err, "Query failed"));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
