//! Patient detail screen: one patient record plus that patient's tests.
//!
//! The two parts load independently and concurrently. Each has its own phase, last value and
//! error, so a failed test list still leaves the patient on screen and vice versa. Any test
//! mutation or patient edit reloads both parts, because the server may have recomputed the
//! patient's critical flag.

use super::{lock, Liveness, LoadPhase};
use crate::repository::{Mutation, RecordRepository, Snapshot};
use crate::{Notice, SyncError, SyncResult};
use std::sync::{Arc, Mutex};
use ward_types::RecordId;
use ward_wire::{MedicalHistory, Patient, PatientDraft, Test, TestDraft};

/// One independently loaded part of a view.
#[derive(Clone, Debug)]
pub struct Slot<T> {
    pub phase: LoadPhase,
    /// Last successfully loaded value; kept across failed reloads.
    pub value: Option<Arc<T>>,
    pub error: Option<SyncError>,
    revision: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            phase: LoadPhase::Idle,
            value: None,
            error: None,
            revision: 0,
        }
    }
}

impl<T> Slot<T> {
    pub fn value(&self) -> Option<&T> {
        self.value.as_deref()
    }

    fn begin(&mut self) {
        self.phase = LoadPhase::Loading;
        self.error = None;
    }

    fn apply(&mut self, result: SyncResult<Snapshot<T>>) {
        match result {
            Ok(snapshot) => {
                if snapshot.revision() > self.revision {
                    self.revision = snapshot.revision();
                    self.value = Some(Arc::clone(snapshot.value()));
                }
                self.phase = LoadPhase::Loaded;
                self.error = None;
            }
            Err(err) => {
                self.phase = LoadPhase::Failed;
                self.error = Some(err);
            }
        }
    }
}

/// What the detail screen renders.
#[derive(Clone, Debug)]
pub struct DetailView {
    pub patient_id: RecordId,
    pub patient: Slot<Patient>,
    pub tests: Slot<Vec<Test>>,
    pub notice: Option<Notice>,
}

#[derive(Default)]
struct DetailState {
    patient: Slot<Patient>,
    tests: Slot<Vec<Test>>,
    notice: Option<Notice>,
}

/// Controller behind the patient detail screen.
pub struct DetailController {
    repository: Arc<RecordRepository>,
    patient_id: RecordId,
    state: Mutex<DetailState>,
    liveness: Liveness,
}

impl DetailController {
    pub fn new(repository: Arc<RecordRepository>, patient_id: RecordId) -> Self {
        Self {
            repository,
            patient_id,
            state: Mutex::new(DetailState::default()),
            liveness: Liveness::new(),
        }
    }

    pub fn patient_id(&self) -> &RecordId {
        &self.patient_id
    }

    pub fn view(&self) -> DetailView {
        let state = lock(&self.state);
        DetailView {
            patient_id: self.patient_id.clone(),
            patient: state.patient.clone(),
            tests: state.tests.clone(),
            notice: state.notice.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.liveness.is_active()
    }

    pub fn close(&self) {
        tracing::debug!(patient_id = %self.patient_id, "detail controller closed");
        self.liveness.close();
    }

    /// First load when the screen opens.
    pub async fn enter(&self) -> DetailView {
        self.reload().await
    }

    /// Load the patient record and the test list concurrently.
    pub async fn reload(&self) -> DetailView {
        tokio::join!(self.load_patient(), self.load_tests());
        self.view()
    }

    async fn load_patient(&self) {
        if !self.is_active() {
            return;
        }
        lock(&self.state).patient.begin();
        let result = self.repository.refresh_patient(&self.patient_id).await;
        if !self.is_active() {
            tracing::debug!(patient_id = %self.patient_id, "discarding patient record for closed view");
            return;
        }
        if let Err(err) = &result {
            tracing::warn!(patient_id = %self.patient_id, "patient record load failed: {}", err);
        }
        lock(&self.state).patient.apply(result);
    }

    async fn load_tests(&self) {
        if !self.is_active() {
            return;
        }
        lock(&self.state).tests.begin();
        let result = self.repository.load_tests(&self.patient_id).await;
        if !self.is_active() {
            tracing::debug!(patient_id = %self.patient_id, "discarding test list for closed view");
            return;
        }
        if let Err(err) = &result {
            tracing::warn!(patient_id = %self.patient_id, "test list load failed: {}", err);
        }
        lock(&self.state).tests.apply(result);
    }

    pub async fn update_patient(&self, draft: &PatientDraft) -> Option<Patient> {
        let result = self
            .repository
            .update_patient(&self.patient_id, draft)
            .await;
        self.settle(result).await
    }

    /// Delete the patient. On success the controller closes itself; the screen should go away.
    pub async fn delete_patient(&self) -> bool {
        match self.repository.delete_patient(&self.patient_id).await {
            Ok(_) => {
                self.close();
                true
            }
            Err(err) => {
                self.surface(err);
                false
            }
        }
    }

    pub async fn create_test(&self, draft: &TestDraft) -> Option<Test> {
        let result = self.repository.create_test(&self.patient_id, draft).await;
        self.settle(result).await
    }

    pub async fn update_test(&self, test_id: &RecordId, draft: &TestDraft) -> Option<Test> {
        let result = self
            .repository
            .update_test(&self.patient_id, test_id, draft)
            .await;
        self.settle(result).await
    }

    pub async fn delete_test(&self, test_id: &RecordId) -> bool {
        let result = self
            .repository
            .delete_test(&self.patient_id, test_id)
            .await;
        self.settle(result).await.is_some()
    }

    /// Fetch one test, e.g. to pre-fill an edit form.
    pub async fn fetch_test(&self, test_id: &RecordId) -> Option<Test> {
        match self.repository.fetch_test(&self.patient_id, test_id).await {
            Ok(test) => Some(test),
            Err(err) => {
                self.surface(err);
                None
            }
        }
    }

    /// Aggregated medical history and tests, fetched fresh each time.
    pub async fn history(&self) -> Option<MedicalHistory> {
        match self.repository.load_history(&self.patient_id).await {
            Ok(history) => Some(history),
            Err(err) => {
                self.surface(err);
                None
            }
        }
    }

    pub fn dismiss_notice(&self) {
        lock(&self.state).notice = None;
    }

    async fn settle<T>(&self, result: SyncResult<Mutation<T>>) -> Option<T> {
        match result {
            Ok(mutation) => {
                if mutation.requires_reload() {
                    self.reload().await;
                }
                Some(mutation.value)
            }
            Err(err) => {
                self.surface(err);
                None
            }
        }
    }

    fn surface(&self, err: SyncError) {
        tracing::warn!(patient_id = %self.patient_id, "patient detail action failed: {}", err);
        if self.is_active() {
            lock(&self.state).notice = Some(err.notice());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::tests::{draft, patient, test_record, ScriptedGateway};
    use crate::validation::test_draft;

    fn id(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    fn controller(gateway: &Arc<ScriptedGateway>) -> Arc<DetailController> {
        let repo = Arc::new(RecordRepository::new(gateway.clone()));
        Arc::new(DetailController::new(repo, id("p1")))
    }

    #[tokio::test]
    async fn enter_loads_patient_and_tests() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_record(Ok(patient("p1", "John Doe", false)));
        gateway.push_tests(Ok(vec![test_record("t1", "p1", "72")]));
        let detail = controller(&gateway);

        let view = detail.enter().await;
        assert_eq!(view.patient.phase, LoadPhase::Loaded);
        assert_eq!(view.patient.value().map(|p| p.name.as_str()), Some("John Doe"));
        assert_eq!(view.tests.phase, LoadPhase::Loaded);
        assert_eq!(view.tests.value().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_list_failure_keeps_patient_on_screen() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_record(Ok(patient("p1", "John Doe", false)));
        gateway.push_tests(Err(SyncError::Server("boom".into())));
        let detail = controller(&gateway);

        let view = detail.enter().await;
        assert_eq!(view.patient.phase, LoadPhase::Loaded);
        assert!(view.patient.value().is_some());
        assert_eq!(view.tests.phase, LoadPhase::Failed);
        assert_eq!(view.tests.error.as_ref().map(SyncError::kind), Some(ErrorKind::Server));
        assert!(view.tests.value().is_none());
    }

    #[tokio::test]
    async fn failed_reload_keeps_last_loaded_value() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_record(Ok(patient("p1", "John Doe", false)));
        gateway.push_tests(Ok(vec![test_record("t1", "p1", "72")]));
        gateway.push_record(Err(SyncError::Network("offline".into())));
        gateway.push_tests(Ok(vec![]));
        let detail = controller(&gateway);
        detail.enter().await;

        let view = detail.reload().await;
        assert_eq!(view.patient.phase, LoadPhase::Failed);
        assert_eq!(view.patient.value().map(|p| p.name.as_str()), Some("John Doe"));
        assert_eq!(view.tests.phase, LoadPhase::Loaded);
        assert_eq!(view.tests.value().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn critical_flag_follows_server_after_test_creation() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_record(Ok(patient("p1", "John Doe", false)));
        gateway.push_tests(Ok(vec![]));
        gateway.push_record(Ok(patient("p1", "John Doe", true)));
        gateway.push_tests(Ok(vec![test_record("t-new", "p1", "150")]));
        let detail = controller(&gateway);

        let before = detail.enter().await;
        assert!(!before.patient.value().unwrap().critical_condition);

        let created = detail
            .create_test(&test_draft("Heartbeat Rate", "150").unwrap())
            .await
            .expect("created");
        assert_eq!(created.value, "150");

        let after = detail.view();
        assert!(after.patient.value().unwrap().critical_condition);
        assert_eq!(after.tests.value().map(Vec::len), Some(1));

        let calls = gateway.calls();
        assert_eq!(calls.iter().filter(|c| *c == "get_patient p1").count(), 2);
        assert_eq!(calls.iter().filter(|c| *c == "list_tests p1").count(), 2);
    }

    #[tokio::test]
    async fn failed_test_mutation_does_not_reload() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_record(Ok(patient("p1", "John Doe", false)));
        gateway.push_tests(Ok(vec![test_record("t1", "p1", "72")]));
        gateway.push_mutation(Err(SyncError::NotFound("test".into())));
        let detail = controller(&gateway);
        detail.enter().await;

        assert!(!detail.delete_test(&id("t1")).await);
        let view = detail.view();
        assert_eq!(view.notice.as_ref().map(|n| n.kind), Some(ErrorKind::NotFound));
        assert_eq!(view.tests.value().map(Vec::len), Some(1));
        assert_eq!(gateway.calls().len(), 3);
    }

    #[tokio::test]
    async fn invalid_reading_is_reported_without_network() {
        let gateway = Arc::new(ScriptedGateway::default());
        let detail = controller(&gateway);

        let reading = TestDraft {
            kind: ward_wire::TestKind::RespiratoryRate,
            value: ward_types::NonEmptyText::new("fast").unwrap(),
        };
        assert!(detail.create_test(&reading).await.is_none());
        let notice = detail.view().notice.expect("notice");
        assert_eq!(notice.kind, ErrorKind::InvalidInput);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn parts_may_complete_in_either_order() {
        let gateway = Arc::new(ScriptedGateway::default());
        let record = gateway.hold_record();
        let tests = gateway.hold_tests();
        let detail = controller(&gateway);

        let task = tokio::spawn({
            let detail = detail.clone();
            async move { detail.enter().await }
        });
        while gateway.calls().len() < 2 {
            tokio::task::yield_now().await;
        }

        tests.send(Ok(vec![test_record("t1", "p1", "72")])).ok();
        while detail.view().tests.phase != LoadPhase::Loaded {
            tokio::task::yield_now().await;
        }
        let partial = detail.view();
        assert_eq!(partial.patient.phase, LoadPhase::Loading);
        assert!(partial.patient.value().is_none());

        record.send(Ok(patient("p1", "John Doe", false))).ok();
        let view = task.await.unwrap();
        assert_eq!(view.patient.phase, LoadPhase::Loaded);
        assert_eq!(view.tests.phase, LoadPhase::Loaded);
    }

    #[tokio::test]
    async fn closed_controller_ignores_late_responses() {
        let gateway = Arc::new(ScriptedGateway::default());
        let record = gateway.hold_record();
        gateway.push_tests(Ok(vec![]));
        let detail = controller(&gateway);

        let task = tokio::spawn({
            let detail = detail.clone();
            async move { detail.enter().await }
        });
        while !gateway.calls().iter().any(|c| c == "get_patient p1") {
            tokio::task::yield_now().await;
        }
        detail.close();
        record.send(Ok(patient("p1", "John Doe", false))).ok();
        task.await.unwrap();

        assert!(detail.view().patient.value().is_none());
        assert!(!detail.is_active());
    }

    #[tokio::test]
    async fn delete_patient_closes_the_view() {
        let gateway = Arc::new(ScriptedGateway::default());
        let detail = controller(&gateway);

        assert!(detail.delete_patient().await);
        assert!(!detail.is_active());

        // A closed view issues no further loads.
        detail.reload().await;
        assert_eq!(gateway.calls(), vec!["delete_patient p1"]);
    }

    #[tokio::test]
    async fn update_patient_reloads_both_parts() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_record(Ok(patient("p1", "Jane Roe", false)));
        gateway.push_tests(Ok(vec![]));
        let detail = controller(&gateway);

        let updated = detail.update_patient(&draft("Jane Roe")).await.expect("updated");
        assert_eq!(updated.name, "Jane Roe");
        let view = detail.view();
        assert_eq!(view.patient.value().map(|p| p.name.as_str()), Some("Jane Roe"));
        assert_eq!(view.tests.phase, LoadPhase::Loaded);
    }

    #[tokio::test]
    async fn history_and_single_test_surface_through_controller() {
        let gateway = Arc::new(ScriptedGateway::default());
        let detail = controller(&gateway);

        let history = detail.history().await.expect("history");
        assert_eq!(history.patient_id, id("p1"));
        let test = detail.fetch_test(&id("t1")).await.expect("test");
        assert_eq!(test.id, id("t1"));
        assert!(detail.view().notice.is_none());
    }
}
