//! In-memory record store behind the reference server.
//!
//! Patients and tests are kept in creation order. Deleting a patient cascades to its tests, and
//! every test mutation recomputes the owning patient's `criticalCondition`.

use crate::error::{ApiError, ApiResult};
use crate::vitals::{self, Reading};
use chrono::Utc;
use ward_types::RecordId;
use ward_wire::{MedicalHistory, Patient, PatientDraft, Test, TestDraft};

/// Length of generated identifiers, matching a document-store object id.
const ID_LEN: usize = 24;

#[derive(Debug, Default)]
pub struct RecordStore {
    patients: Vec<Patient>,
    tests: Vec<Test>,
}

impl RecordStore {
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn critical_patients(&self) -> Vec<Patient> {
        self.patients
            .iter()
            .filter(|p| p.critical_condition)
            .cloned()
            .collect()
    }

    pub fn patient(&self, id: &RecordId) -> ApiResult<&Patient> {
        self.patients
            .iter()
            .find(|p| &p.id == id)
            .ok_or(ApiError::NotFound("patient"))
    }

    pub fn create_patient(&mut self, draft: PatientDraft) -> ApiResult<Patient> {
        let patient = Patient {
            id: new_id()?,
            name: draft.name.to_string(),
            age: draft.age,
            gender: draft.gender,
            address: draft.address,
            phone_number: draft.phone_number,
            medical_history: draft.medical_history,
            critical_condition: false,
        };
        tracing::info!(patient_id = %patient.id, "patient created");
        self.patients.push(patient.clone());
        Ok(patient)
    }

    /// Replace the editable attributes. `criticalCondition` is left to the test readings.
    pub fn update_patient(&mut self, id: &RecordId, draft: PatientDraft) -> ApiResult<Patient> {
        let patient = self.patient_mut(id)?;
        patient.name = draft.name.to_string();
        patient.age = draft.age;
        patient.gender = draft.gender;
        patient.address = draft.address;
        patient.phone_number = draft.phone_number;
        patient.medical_history = draft.medical_history;
        Ok(patient.clone())
    }

    pub fn delete_patient(&mut self, id: &RecordId) -> ApiResult<()> {
        self.patient(id)?;
        self.patients.retain(|p| &p.id != id);
        let before = self.tests.len();
        self.tests.retain(|t| &t.patient_id != id);
        tracing::info!(
            patient_id = %id,
            tests_removed = before - self.tests.len(),
            "patient deleted"
        );
        Ok(())
    }

    pub fn tests(&self, patient_id: &RecordId) -> ApiResult<Vec<Test>> {
        self.patient(patient_id)?;
        Ok(self.tests_of(patient_id).cloned().collect())
    }

    pub fn test<'a>(&'a self, patient_id: &'a RecordId, test_id: &RecordId) -> ApiResult<&'a Test> {
        self.patient(patient_id)?;
        self.tests_of(patient_id)
            .find(|t| &t.id == test_id)
            .ok_or(ApiError::NotFound("test"))
    }

    /// Record a new test dated now.
    pub fn create_test(&mut self, patient_id: &RecordId, draft: TestDraft) -> ApiResult<Test> {
        self.patient(patient_id)?;
        Reading::parse(&draft.kind, draft.value.as_str())?;

        let test = Test {
            id: new_id()?,
            patient_id: patient_id.clone(),
            date: Utc::now(),
            kind: draft.kind,
            value: draft.value.to_string(),
        };
        tracing::info!(%patient_id, test_id = %test.id, "test created");
        self.tests.push(test.clone());
        self.reevaluate(patient_id);
        Ok(test)
    }

    /// Replace a test's type and value. The original date is kept.
    pub fn update_test(
        &mut self,
        patient_id: &RecordId,
        test_id: &RecordId,
        draft: TestDraft,
    ) -> ApiResult<Test> {
        self.test(patient_id, test_id)?;
        Reading::parse(&draft.kind, draft.value.as_str())?;

        let test = self
            .tests
            .iter_mut()
            .find(|t| &t.id == test_id)
            .ok_or(ApiError::NotFound("test"))?;
        test.kind = draft.kind;
        test.value = draft.value.to_string();
        let updated = test.clone();

        self.reevaluate(patient_id);
        Ok(updated)
    }

    pub fn delete_test(&mut self, patient_id: &RecordId, test_id: &RecordId) -> ApiResult<()> {
        self.test(patient_id, test_id)?;
        self.tests.retain(|t| &t.id != test_id);
        self.reevaluate(patient_id);
        Ok(())
    }

    pub fn history(&self, patient_id: &RecordId) -> ApiResult<MedicalHistory> {
        let patient = self.patient(patient_id)?;
        Ok(MedicalHistory {
            patient_id: patient.id.clone(),
            medical_history: patient.medical_history.clone(),
            tests: self.tests_of(patient_id).cloned().collect(),
        })
    }

    fn patient_mut(&mut self, id: &RecordId) -> ApiResult<&mut Patient> {
        self.patients
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(ApiError::NotFound("patient"))
    }

    fn tests_of<'a>(&'a self, patient_id: &'a RecordId) -> impl Iterator<Item = &'a Test> + 'a {
        self.tests.iter().filter(move |t| &t.patient_id == patient_id)
    }

    fn reevaluate(&mut self, patient_id: &RecordId) {
        let critical = vitals::any_critical(self.tests_of(patient_id));
        if let Ok(patient) = self.patient_mut(patient_id) {
            if patient.critical_condition != critical {
                tracing::info!(%patient_id, critical, "critical condition changed");
            }
            patient.critical_condition = critical;
        }
    }
}

fn new_id() -> ApiResult<RecordId> {
    let hex: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_LEN)
        .collect();
    RecordId::parse(&hex).map_err(|e| ApiError::Internal(format!("generated id rejected: {e}")))
}
