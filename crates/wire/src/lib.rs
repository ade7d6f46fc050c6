//! JSON wire/boundary support for the hospital record API.
//!
//! This crate provides **domain entities** and **wire codecs** for the payloads exchanged with the
//! remote record service:
//! - patients (`/patients`, `/patients/{id}`, `/patients/critical`)
//! - medical tests (`/patients/{id}/tests`, `/patients/{id}/tests/{testId}`)
//! - aggregated medical history (`/patients/{id}/history`)
//!
//! Decoding is strict: a payload either becomes a fully typed value or a [`WireError`] naming the
//! JSON path that failed. The only defaults applied are the documented ones on each wire model
//! (for example a missing `medicalHistory` decodes as an empty list).
//!
//! Both sides of the API use these codecs: the client gateway renders drafts and parses entities,
//! the reference server parses drafts and renders entities.

mod decode;
pub mod history;
pub mod patient;

// Re-export facades
pub use history::HistoryCodec;
pub use medical_test::TestCodec;
pub use patient::PatientCodec;

// Re-export public domain-level types
pub use history::MedicalHistory;
pub use medical_test::{Test, TestDraft, TestKind};
pub use patient::{Gender, Patient, PatientDraft, MAX_AGE};

pub use ward_types::{NonEmptyText, RecordId};

/// How identifiers are written when rendering entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdStyle {
    /// `"_id": "X"`
    #[default]
    Plain,
    /// `"_id": {"$oid": "X"}`
    ObjectId,
}

impl IdStyle {
    fn render(self, id: &RecordId) -> serde_json::Value {
        match self {
            IdStyle::Plain => serde_json::Value::String(id.to_string()),
            IdStyle::ObjectId => serde_json::json!({ "$oid": id.as_str() }),
        }
    }
}

/// Errors returned by the `ward-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;
