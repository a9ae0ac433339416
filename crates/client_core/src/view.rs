//! Presentation seam. The core decides *when* surfaces change; implementors
//! decide how they look.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{TableDescriptor, TableName},
    protocol::QueryResult,
};
use tokio::task::JoinHandle;

use crate::drag_zone::ZoneId;

pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(3);

/// A control that is disabled while the operation it triggers is running.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Affordance {
    QueryInput,
    QueryButton,
    RandomQueryButton,
    UploadPicker,
    GenerateData(TableName),
    RemoveTable(TableName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceState {
    /// Enabled, showing its original label.
    Ready,
    /// Disabled, showing a loading indicator.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BannerId(pub u64);

pub trait InteractionView: Send + Sync {
    fn set_affordance(&self, affordance: &Affordance, state: AffordanceState);

    fn query_text(&self) -> String;
    fn set_query_text(&self, text: &str);
    fn focus_query_input(&self);

    fn show_drop_overlay(&self, zone: &ZoneId);
    fn hide_drop_overlay(&self, zone: &ZoneId);

    fn render_results(&self, query: &str, result: &QueryResult);
    fn set_results_visible(&self, visible: bool);
    /// Replaces the whole table list. An empty slice means "no tables yet".
    fn render_tables(&self, tables: &[TableDescriptor]);

    fn show_error(&self, message: &str);
    fn show_success(&self, banner: BannerId, message: &str);
    fn dismiss_success(&self, banner: BannerId);

    fn close_upload_dialog(&self);
    fn confirm(&self, prompt: &str) -> bool;
    fn deliver_download(&self, file_name: &str, bytes: &[u8]);
}

/// Marks affordances busy for its lifetime and restores them on drop, so
/// every exit path of an operation re-enables its controls.
pub(crate) struct AffordanceGuard {
    view: Arc<dyn InteractionView>,
    affordances: Vec<Affordance>,
}

impl AffordanceGuard {
    pub(crate) fn engage(view: &Arc<dyn InteractionView>, affordances: Vec<Affordance>) -> Self {
        for affordance in &affordances {
            view.set_affordance(affordance, AffordanceState::Busy);
        }
        Self {
            view: Arc::clone(view),
            affordances,
        }
    }
}

impl Drop for AffordanceGuard {
    fn drop(&mut self) {
        for affordance in &self.affordances {
            self.view.set_affordance(affordance, AffordanceState::Ready);
        }
    }
}

/// Success banners that take themselves down after a fixed time.
#[derive(Clone)]
pub struct Banners {
    view: Arc<dyn InteractionView>,
    ttl: Duration,
    next_id: Arc<AtomicU64>,
}

impl Banners {
    pub fn new(view: Arc<dyn InteractionView>, ttl: Duration) -> Self {
        Self {
            view,
            ttl,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn show(&self, message: &str) -> (BannerId, JoinHandle<()>) {
        let banner = BannerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.view.show_success(banner, message);

        let view = Arc::clone(&self.view);
        let ttl = self.ttl;
        let dismissal = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            view.dismiss_success(banner);
        });
        (banner, dismissal)
    }
}
