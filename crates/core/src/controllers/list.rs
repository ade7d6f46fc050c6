//! Patient list screen: loading state, search filter and the critical-only subset.
//!
//! State machine: `Idle → Loading → {Loaded, Failed}`; `Loaded → Loading` on refresh,
//! `Failed → Loading` on retry. The visible list is always the last loaded collection in server
//! order, narrowed by the current filter. Filtering never touches the network.

use super::{lock, Liveness, LoadPhase};
use crate::repository::{RecordRepository, Snapshot};
use crate::{Notice, SyncError};
use std::sync::{Arc, Mutex};
use ward_types::RecordId;
use ward_wire::{Patient, PatientDraft};

/// Which server collection the list shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListScope {
    /// `GET /patients`
    #[default]
    All,
    /// `GET /patients/critical`
    Critical,
}

/// What the list screen renders.
#[derive(Clone, Debug)]
pub struct ListView {
    pub phase: LoadPhase,
    /// Patients matching the filter, in server order.
    pub patients: Vec<Patient>,
    /// Size of the last loaded collection before filtering.
    pub total: usize,
    pub filter: String,
    /// Error of the last failed load, while in [`LoadPhase::Failed`].
    pub error: Option<SyncError>,
    pub notice: Option<Notice>,
    /// Revision of the collection on screen, if one has loaded.
    pub revision: Option<u64>,
}

#[derive(Default)]
struct ListState {
    phase: LoadPhase,
    loaded: Option<Snapshot<Vec<Patient>>>,
    filter: String,
    visible: Vec<Patient>,
    error: Option<SyncError>,
    notice: Option<Notice>,
}

impl ListState {
    fn recompute(&mut self) {
        self.visible = match &self.loaded {
            Some(patients) => filter_patients(patients, &self.filter),
            None => Vec::new(),
        };
    }

    fn view(&self) -> ListView {
        ListView {
            phase: self.phase,
            patients: self.visible.clone(),
            total: self.loaded.as_ref().map_or(0, |p| p.len()),
            filter: self.filter.clone(),
            error: self.error.clone(),
            notice: self.notice.clone(),
            revision: self.loaded.as_ref().map(Snapshot::revision),
        }
    }
}

/// Case-insensitive substring match on patient name, preserving order.
///
/// A blank query matches every patient.
pub fn filter_patients(patients: &[Patient], query: &str) -> Vec<Patient> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return patients.to_vec();
    }
    patients
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Controller behind the patient list screen.
pub struct ListController {
    repository: Arc<RecordRepository>,
    scope: ListScope,
    state: Mutex<ListState>,
    liveness: Liveness,
}

impl ListController {
    pub fn new(repository: Arc<RecordRepository>, scope: ListScope) -> Self {
        Self {
            repository,
            scope,
            state: Mutex::new(ListState::default()),
            liveness: Liveness::new(),
        }
    }

    pub fn scope(&self) -> ListScope {
        self.scope
    }

    pub fn view(&self) -> ListView {
        lock(&self.state).view()
    }

    pub fn is_active(&self) -> bool {
        self.liveness.is_active()
    }

    /// Tear the controller down. In-flight responses are discarded from now on.
    pub fn close(&self) {
        tracing::debug!(scope = ?self.scope, "list controller closed");
        self.liveness.close();
    }

    /// Reload the collection from the server.
    ///
    /// A failed load moves to [`LoadPhase::Failed`] with a notice; the last loaded collection
    /// stays available for display. When loads overlap, the collection with the highest
    /// repository revision is kept, and a failure that finishes after a newer collection has
    /// landed only raises a notice.
    pub async fn refresh(&self) -> ListView {
        if !self.is_active() {
            return self.view();
        }
        let shown = {
            let mut state = lock(&self.state);
            state.phase = LoadPhase::Loading;
            state.error = None;
            state.notice = None;
            state.loaded.as_ref().map(|current| current.revision())
        };

        let result = match self.scope {
            ListScope::All => self.repository.load_patients().await,
            ListScope::Critical => self.repository.load_critical_patients().await,
        };

        if !self.is_active() {
            tracing::debug!(scope = ?self.scope, "discarding patient list response for closed view");
            return self.view();
        }

        let mut state = lock(&self.state);
        match result {
            Ok(snapshot) => {
                let newer = state
                    .loaded
                    .as_ref()
                    .map_or(true, |current| snapshot.revision() > current.revision());
                if newer {
                    state.loaded = Some(snapshot);
                    state.recompute();
                } else {
                    tracing::debug!(
                        revision = snapshot.revision(),
                        "ignoring patient list older than the one on screen"
                    );
                }
                state.phase = LoadPhase::Loaded;
                state.error = None;
            }
            Err(err) => {
                tracing::warn!(scope = ?self.scope, "patient list refresh failed: {}", err);
                let superseded = state.loaded.as_ref().map(|current| current.revision()) > shown;
                if superseded {
                    // A later load already landed; its list and phase stand.
                    state.notice = Some(err.notice());
                    return state.view();
                }
                state.phase = LoadPhase::Failed;
                state.notice = Some(err.notice());
                state.error = Some(err);
            }
        }
        state.view()
    }

    /// Same as [`refresh`](Self::refresh); offered from the failed state.
    pub async fn retry(&self) -> ListView {
        self.refresh().await
    }

    /// Narrow the visible list to names containing `query` (case-insensitive).
    pub fn set_filter(&self, query: &str) -> ListView {
        let mut state = lock(&self.state);
        state.filter = query.to_string();
        state.recompute();
        state.view()
    }

    /// Delete a patient, then reload the list whatever the outcome.
    ///
    /// A failed delete raises a notice after the reload, so the reload does not clear it.
    /// Returns whether the delete succeeded.
    pub async fn remove(&self, patient_id: &RecordId) -> bool {
        let result = self.repository.delete_patient(patient_id).await;
        self.refresh().await;
        match result {
            Ok(_) => true,
            Err(err) => {
                self.surface(err);
                false
            }
        }
    }

    /// Create a patient, then reload the list. Returns the created patient as the server
    /// reported it.
    pub async fn create(&self, draft: &PatientDraft) -> Option<Patient> {
        match self.repository.create_patient(draft).await {
            Ok(mutation) => {
                self.refresh().await;
                Some(mutation.value)
            }
            Err(err) => {
                self.surface(err);
                None
            }
        }
    }

    pub fn dismiss_notice(&self) {
        lock(&self.state).notice = None;
    }

    fn surface(&self, err: SyncError) {
        tracing::warn!(scope = ?self.scope, "patient list action failed: {}", err);
        if self.is_active() {
            lock(&self.state).notice = Some(err.notice());
        }
    }
}
