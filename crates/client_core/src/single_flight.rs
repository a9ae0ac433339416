//! Per-key busy tracking so that a logical operation never overlaps itself.

use std::{
    collections::HashSet,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::TableName;
use tracing::debug;

/// Identity of a logical operation: its kind plus, for per-table actions,
/// the table it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKey {
    Query,
    Upload,
    RandomQuery,
    RemoveTable(TableName),
    GenerateData(TableName),
}

impl OperationKey {
    pub fn kind(&self) -> &'static str {
        match self {
            OperationKey::Query => "query",
            OperationKey::Upload => "upload",
            OperationKey::RandomQuery => "random_query",
            OperationKey::RemoveTable(_) => "remove_table",
            OperationKey::GenerateData(_) => "generate_data",
        }
    }

    pub fn subject(&self) -> Option<&TableName> {
        match self {
            OperationKey::RemoveTable(table) | OperationKey::GenerateData(table) => Some(table),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject() {
            Some(table) => write!(f, "{}:{}", self.kind(), table),
            None => f.write_str(self.kind()),
        }
    }
}

/// Tracks which operation keys are in flight. Triggers for a busy key are
/// refused, never queued.
#[derive(Clone, Default)]
pub struct SingleFlight {
    busy: Arc<Mutex<HashSet<OperationKey>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` busy and returns a guard that releases it when dropped,
    /// or `None` when an operation for `key` is already in flight.
    pub fn try_enter(&self, key: OperationKey) -> Option<FlightGuard> {
        let mut busy = self.lock();
        if busy.contains(&key) {
            debug!(key = %key, "operation already in flight; trigger dropped");
            return None;
        }
        busy.insert(key.clone());
        Some(FlightGuard {
            flights: self.clone(),
            key,
        })
    }

    pub fn is_busy(&self, key: &OperationKey) -> bool {
        self.lock().contains(key)
    }

    pub fn busy_keys(&self) -> Vec<OperationKey> {
        self.lock().iter().cloned().collect()
    }

    /// Runs `operation` under `key`, or returns `None` without polling it
    /// when the key is busy.
    pub async fn run<F, T>(&self, key: OperationKey, operation: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _guard = self.try_enter(key)?;
        Some(operation.await)
    }

    fn exit(&self, key: &OperationKey) {
        self.lock().remove(key);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<OperationKey>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped ownership of a busy key.
#[must_use = "the operation is released as soon as the guard is dropped"]
pub struct FlightGuard {
    flights: SingleFlight,
    key: OperationKey,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flights.exit(&self.key);
    }
}

#[cfg(test)]
#[path = "tests/single_flight_tests.rs"]
mod tests;
