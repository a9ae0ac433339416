//! Drag-and-drop surfaces.
//!
//! A single physical drag fires nested enter/leave pairs as the pointer
//! crosses child elements, so each surface counts its depth instead of
//! toggling the overlay on every event.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::UploadFile;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    upload::{validate_data_file, UploadOrchestrator, UploadOutcome},
    view::InteractionView,
};

/// Type-manifest entry hosts use for sessions that carry files.
pub const FILES_TYPE: &str = "Files";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn query_section() -> Self {
        Self::new("query-section")
    }

    pub fn tables_section() -> Self {
        Self::new("tables-section")
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEventKind {
    Enter,
    Over,
    Leave,
    Drop,
}

/// What the host tells us about a drag session: its type manifest and,
/// on drop, the files themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragPayload {
    pub types: Vec<String>,
    pub files: Vec<UploadFile>,
}

impl DragPayload {
    pub fn files(files: Vec<UploadFile>) -> Self {
        Self {
            types: vec![FILES_TYPE.to_string()],
            files,
        }
    }

    /// A file drag as seen before the drop, when hosts expose only the
    /// manifest.
    pub fn file_manifest() -> Self {
        Self::files(Vec::new())
    }

    pub fn text() -> Self {
        Self {
            types: vec!["text/plain".to_string()],
            files: Vec::new(),
        }
    }

    pub fn carries_files(&self) -> bool {
        self.types.iter().any(|t| t == FILES_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEvent {
    pub kind: DragEventKind,
    pub payload: DragPayload,
}

impl DragEvent {
    pub fn new(kind: DragEventKind, payload: DragPayload) -> Self {
        Self { kind, payload }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Idle,
    Dragging { depth: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    NoFile,
    Rejected { file_name: String },
    Accepted(UploadFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragResponse {
    /// Not a file session; the host's default handling must stay intact.
    Ignored,
    Tracked(ZoneState),
    /// Drag-over: the host should permit a copy-style drop.
    AllowCopy,
    Dropped(DropOutcome),
}

impl DragResponse {
    /// Whether the host's default handling (navigation to the dropped file,
    /// refusing the drop) must be suppressed.
    pub fn suppresses_default(&self) -> bool {
        !matches!(self, DragResponse::Ignored)
    }
}

pub struct DragZoneController {
    zone: ZoneId,
    depth: u32,
    view: Arc<dyn InteractionView>,
}

impl DragZoneController {
    pub fn new(zone: ZoneId, view: Arc<dyn InteractionView>) -> Self {
        Self {
            zone,
            depth: 0,
            view,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn overlay_visible(&self) -> bool {
        self.depth > 0
    }

    pub fn state(&self) -> ZoneState {
        match self.depth {
            0 => ZoneState::Idle,
            depth => ZoneState::Dragging { depth },
        }
    }

    pub fn handle(&mut self, event: DragEvent) -> DragResponse {
        match event.kind {
            DragEventKind::Drop => DragResponse::Dropped(self.on_drop(event.payload)),
            _ if !event.payload.carries_files() => DragResponse::Ignored,
            DragEventKind::Enter => {
                self.depth += 1;
                if self.depth == 1 {
                    self.view.show_drop_overlay(&self.zone);
                }
                DragResponse::Tracked(self.state())
            }
            DragEventKind::Over => DragResponse::AllowCopy,
            DragEventKind::Leave => {
                match self.depth {
                    // Hosts can deliver a leave after the session already
                    // ended; there is nothing to undo.
                    0 => debug!(zone = %self.zone, "unbalanced drag leave ignored"),
                    1 => {
                        self.depth = 0;
                        self.view.hide_drop_overlay(&self.zone);
                    }
                    _ => self.depth -= 1,
                }
                DragResponse::Tracked(self.state())
            }
        }
    }

    fn on_drop(&mut self, payload: DragPayload) -> DropOutcome {
        self.depth = 0;
        self.view.hide_drop_overlay(&self.zone);

        let Some(file) = payload.files.into_iter().next() else {
            return DropOutcome::NoFile;
        };
        match validate_data_file(&file) {
            Ok(kind) => {
                info!(zone = %self.zone, file_name = %file.file_name, ?kind, "file dropped");
                DropOutcome::Accepted(file)
            }
            Err(err) => {
                warn!(zone = %self.zone, file_name = %file.file_name, "dropped file rejected");
                self.view.show_error(&err.to_string());
                DropOutcome::Rejected {
                    file_name: file.file_name,
                }
            }
        }
    }
}

/// Result of routing one host event through [`DropZones`].
#[derive(Debug)]
pub struct ZoneDispatch {
    pub response: DragResponse,
    /// The upload started for an accepted drop.
    pub upload: Option<JoinHandle<UploadOutcome>>,
}

/// All drop surfaces of the page, feeding accepted files into the shared
/// upload path.
#[derive(Clone)]
pub struct DropZones {
    zones: Arc<Mutex<HashMap<ZoneId, DragZoneController>>>,
    uploads: UploadOrchestrator,
}

impl DropZones {
    pub fn new(
        view: Arc<dyn InteractionView>,
        uploads: UploadOrchestrator,
        zone_ids: impl IntoIterator<Item = ZoneId>,
    ) -> Self {
        let zones = zone_ids
            .into_iter()
            .map(|zone| (zone.clone(), DragZoneController::new(zone, Arc::clone(&view))))
            .collect();
        Self {
            zones: Arc::new(Mutex::new(zones)),
            uploads,
        }
    }

    pub fn zone_ids(&self) -> Vec<ZoneId> {
        self.lock().keys().cloned().collect()
    }

    pub fn state(&self, zone: &ZoneId) -> Option<ZoneState> {
        self.lock().get(zone).map(DragZoneController::state)
    }

    pub fn dispatch(&self, zone: &ZoneId, event: DragEvent) -> Result<ZoneDispatch, ClientError> {
        let response = {
            let mut zones = self.lock();
            let controller = zones
                .get_mut(zone)
                .ok_or_else(|| ClientError::UnknownZone(zone.to_string()))?;
            controller.handle(event)
        };

        let upload = match &response {
            DragResponse::Dropped(DropOutcome::Accepted(file)) => {
                let uploads = self.uploads.clone();
                let file = file.clone();
                Some(tokio::spawn(async move { uploads.upload_file(file).await }))
            }
            _ => None,
        };
        Ok(ZoneDispatch { response, upload })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ZoneId, DragZoneController>> {
        self.zones.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/drag_zone_tests.rs"]
mod tests;
