//! Record repository: the single in-memory owner of patient and test collections.
//!
//! Every read the views make and every mutation they request goes through
//! [`RecordRepository`]. It holds:
//!
//! - the full patient list (`GET /patients`)
//! - the critical patient list (`GET /patients/critical`)
//! - per-patient detail records (`GET /patients/{id}`)
//! - per-patient test lists (`GET /patients/{id}/tests`)
//!
//! ## Reload policy
//!
//! Loads replace a collection wholesale. Mutations never splice the returned record into a loaded
//! collection; they mark the affected collections stale and return a [`Mutation`] naming what the
//! caller must reload. `criticalCondition` in particular is only ever taken from a server
//! response.
//!
//! ## Ordering
//!
//! Each applied response is stamped with a repository-wide revision, taken under the write lock
//! when the response is applied. Overlapping loads of the same collection therefore resolve to the
//! response that arrived last, and consumers can compare revisions to drop snapshots older than
//! the one they already hold.

use crate::gateway::RecordGateway;
use crate::validation::{check_patient_draft, check_test_value};
use crate::{SyncError, SyncResult};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::RwLock;
use ward_types::RecordId;
use ward_wire::{MedicalHistory, Patient, PatientDraft, Test, TestDraft};

/// Read-only view of a collection as of one applied server response.
#[derive(Debug)]
pub struct Snapshot<T> {
    revision: u64,
    value: Arc<T>,
    stale: bool,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            value: Arc::clone(&self.value),
            stale: self.stale,
        }
    }
}

impl<T> Snapshot<T> {
    fn new(revision: u64, value: T) -> Self {
        Self {
            revision,
            value: Arc::new(value),
            stale: false,
        }
    }

    /// Position of this snapshot in the repository's apply order. Higher is newer.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// `true` once a mutation has made this snapshot out of date.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// A collection made out of date by a mutation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stale {
    /// The full and critical patient lists.
    PatientList,
    /// One patient's detail record.
    Patient(RecordId),
    /// One patient's test list.
    Tests(RecordId),
}

/// Result of a successful mutation, with the collections the caller must reload.
#[derive(Clone, Debug)]
pub struct Mutation<T> {
    pub value: T,
    pub stale: Vec<Stale>,
}

impl<T> Mutation<T> {
    /// Always `true`: every mutation leaves at least the patient list stale.
    pub fn requires_reload(&self) -> bool {
        !self.stale.is_empty()
    }
}

#[derive(Default)]
struct Collections {
    revision: u64,
    patients: Option<Snapshot<Vec<Patient>>>,
    critical: Option<Snapshot<Vec<Patient>>>,
    records: HashMap<RecordId, Snapshot<Patient>>,
    tests: HashMap<RecordId, Snapshot<Vec<Test>>>,
}

impl Collections {
    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn mark_stale(&mut self, stale: &[Stale]) {
        for scope in stale {
            match scope {
                Stale::PatientList => {
                    for list in [&mut self.patients, &mut self.critical].into_iter().flatten() {
                        list.stale = true;
                    }
                }
                Stale::Patient(id) => {
                    if let Some(record) = self.records.get_mut(id) {
                        record.stale = true;
                    }
                }
                Stale::Tests(id) => {
                    if let Some(tests) = self.tests.get_mut(id) {
                        tests.stale = true;
                    }
                }
            }
        }
    }

    fn forget_patient(&mut self, id: &RecordId) {
        self.records.remove(id);
        self.tests.remove(id);
    }
}

/// In-memory holder of the current record collections.
///
/// Shared between controllers behind an `Arc`. All state lives behind one lock that is never held
/// across a network call.
pub struct RecordRepository {
    gateway: Arc<dyn RecordGateway>,
    collections: RwLock<Collections>,
}

impl RecordRepository {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            gateway,
            collections: RwLock::new(Collections::default()),
        }
    }

    // ------------------------------------------------------------------------
    // Loads
    // ------------------------------------------------------------------------

    /// Fetch the full patient collection and replace the local copy wholesale.
    pub async fn load_patients(&self) -> SyncResult<Snapshot<Vec<Patient>>> {
        let patients = self.gateway.list_patients().await?;

        let mut collections = self.collections.write().await;
        let snapshot = Snapshot::new(collections.next_revision(), patients);
        tracing::debug!(
            revision = snapshot.revision(),
            count = snapshot.len(),
            "applied patient list"
        );
        collections.patients = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch the critical subset and replace the local copy wholesale.
    pub async fn load_critical_patients(&self) -> SyncResult<Snapshot<Vec<Patient>>> {
        let patients = self.gateway.list_critical_patients().await?;

        let mut collections = self.collections.write().await;
        let snapshot = Snapshot::new(collections.next_revision(), patients);
        tracing::debug!(
            revision = snapshot.revision(),
            count = snapshot.len(),
            "applied critical patient list"
        );
        collections.critical = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch one patient's tests and replace that patient's local list wholesale.
    pub async fn load_tests(&self, patient_id: &RecordId) -> SyncResult<Snapshot<Vec<Test>>> {
        let result = self.gateway.list_tests(patient_id).await;

        let mut collections = self.collections.write().await;
        let tests = match result {
            Ok(tests) => tests,
            Err(err) => {
                if matches!(err, SyncError::NotFound(_)) {
                    collections.forget_patient(patient_id);
                }
                return Err(err);
            }
        };
        let snapshot = Snapshot::new(collections.next_revision(), tests);
        tracing::debug!(
            %patient_id,
            revision = snapshot.revision(),
            count = snapshot.len(),
            "applied test list"
        );
        collections
            .tests
            .insert(patient_id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch one patient and replace its local detail record.
    ///
    /// A `NotFound` response drops the cached record and tests for that patient before the error
    /// is returned.
    pub async fn refresh_patient(&self, patient_id: &RecordId) -> SyncResult<Snapshot<Patient>> {
        let result = self.gateway.get_patient(patient_id).await;

        let mut collections = self.collections.write().await;
        let patient = match result {
            Ok(patient) => patient,
            Err(err) => {
                if matches!(err, SyncError::NotFound(_)) {
                    collections.forget_patient(patient_id);
                }
                return Err(err);
            }
        };
        let snapshot = Snapshot::new(collections.next_revision(), patient);
        tracing::debug!(
            %patient_id,
            revision = snapshot.revision(),
            critical = snapshot.critical_condition,
            "applied patient record"
        );
        collections
            .records
            .insert(patient_id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch a patient's aggregated history. Not cached.
    pub async fn load_history(&self, patient_id: &RecordId) -> SyncResult<MedicalHistory> {
        self.gateway.fetch_history(patient_id).await
    }

    /// Fetch a single test, e.g. to pre-fill an edit form. Not cached.
    pub async fn fetch_test(&self, patient_id: &RecordId, test_id: &RecordId) -> SyncResult<Test> {
        self.gateway.get_test(patient_id, test_id).await
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub async fn patients(&self) -> Option<Snapshot<Vec<Patient>>> {
        self.collections.read().await.patients.clone()
    }

    pub async fn critical_patients(&self) -> Option<Snapshot<Vec<Patient>>> {
        self.collections.read().await.critical.clone()
    }

    pub async fn patient(&self, patient_id: &RecordId) -> Option<Snapshot<Patient>> {
        self.collections.read().await.records.get(patient_id).cloned()
    }

    pub async fn tests(&self, patient_id: &RecordId) -> Option<Snapshot<Vec<Test>>> {
        self.collections.read().await.tests.get(patient_id).cloned()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    pub async fn create_patient(&self, draft: &PatientDraft) -> SyncResult<Mutation<Patient>> {
        check_patient_draft(draft)?;
        let patient = self.gateway.create_patient(draft).await?;
        tracing::info!(patient_id = %patient.id, "patient created");

        Ok(self.settle(patient, vec![Stale::PatientList]).await)
    }

    pub async fn update_patient(
        &self,
        patient_id: &RecordId,
        draft: &PatientDraft,
    ) -> SyncResult<Mutation<Patient>> {
        check_patient_draft(draft)?;
        let patient = self.gateway.update_patient(patient_id, draft).await?;
        tracing::info!(%patient_id, "patient updated");

        Ok(self
            .settle(
                patient,
                vec![Stale::PatientList, Stale::Patient(patient_id.clone())],
            )
            .await)
    }

    /// Delete a patient. The server cascades to its tests, so the cached record and tests are
    /// dropped as well.
    pub async fn delete_patient(&self, patient_id: &RecordId) -> SyncResult<Mutation<()>> {
        self.gateway.delete_patient(patient_id).await?;
        tracing::info!(%patient_id, "patient deleted");

        self.collections.write().await.forget_patient(patient_id);
        Ok(self.settle((), vec![Stale::PatientList]).await)
    }

    pub async fn create_test(
        &self,
        patient_id: &RecordId,
        draft: &TestDraft,
    ) -> SyncResult<Mutation<Test>> {
        check_test_value(&draft.kind, draft.value.as_str())?;
        let test = self.gateway.create_test(patient_id, draft).await?;
        tracing::info!(%patient_id, test_id = %test.id, "test created");

        Ok(self.settle(test, test_mutation_scope(patient_id)).await)
    }

    pub async fn update_test(
        &self,
        patient_id: &RecordId,
        test_id: &RecordId,
        draft: &TestDraft,
    ) -> SyncResult<Mutation<Test>> {
        check_test_value(&draft.kind, draft.value.as_str())?;
        let test = self.gateway.update_test(patient_id, test_id, draft).await?;
        tracing::info!(%patient_id, %test_id, "test updated");

        Ok(self.settle(test, test_mutation_scope(patient_id)).await)
    }

    pub async fn delete_test(
        &self,
        patient_id: &RecordId,
        test_id: &RecordId,
    ) -> SyncResult<Mutation<()>> {
        self.gateway.delete_test(patient_id, test_id).await?;
        tracing::info!(%patient_id, %test_id, "test deleted");

        Ok(self.settle((), test_mutation_scope(patient_id)).await)
    }

    async fn settle<T>(&self, value: T, stale: Vec<Stale>) -> Mutation<T> {
        self.collections.write().await.mark_stale(&stale);
        Mutation { value, stale }
    }
}

/// A test mutation may change the patient's critical flag server-side, so the record and the
/// lists are stale along with the tests.
fn test_mutation_scope(patient_id: &RecordId) -> Vec<Stale> {
    vec![
        Stale::Tests(patient_id.clone()),
        Stale::Patient(patient_id.clone()),
        Stale::PatientList,
    ]
}
