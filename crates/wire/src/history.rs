//! Aggregated medical history (`GET /patients/{id}/history`).

use crate::decode::from_json;
use crate::medical_test::{self, TestWire};
use crate::{IdStyle, TestCodec, WireResult};
use serde::{Deserialize, Serialize};
use ward_types::RecordId;

/// A patient's free-text history together with their tests, in server order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicalHistory {
    pub patient_id: RecordId,
    pub medical_history: Vec<String>,
    pub tests: Vec<medical_test::Test>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryWire {
    patient_id: RecordId,
    #[serde(default)]
    medical_history: Option<Vec<String>>,
    #[serde(default)]
    tests: Option<Vec<TestWire>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryOut<'a> {
    patient_id: &'a str,
    medical_history: &'a [String],
    tests: serde_json::Value,
}

/// History payload operations.
pub struct HistoryCodec;

impl HistoryCodec {
    pub fn parse(json: &str) -> WireResult<MedicalHistory> {
        let wire: HistoryWire = from_json(json, "Medical history")?;
        let tests = wire
            .tests
            .unwrap_or_default()
            .into_iter()
            .map(medical_test::wire_to_domain)
            .collect::<WireResult<Vec<_>>>()?;

        Ok(MedicalHistory {
            patient_id: wire.patient_id,
            medical_history: wire.medical_history.unwrap_or_default(),
            tests,
        })
    }

    pub fn render(history: &MedicalHistory, id_style: IdStyle) -> WireResult<serde_json::Value> {
        let out = HistoryOut {
            patient_id: history.patient_id.as_str(),
            medical_history: &history.medical_history,
            tests: TestCodec::render_list(&history.tests, id_style)?,
        };
        Ok(serde_json::to_value(out)?)
    }
}
