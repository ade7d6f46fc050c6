//! Patient wire models and translation helpers.
//!
//! Responsibilities:
//! - Define the public domain-level [`Patient`] (as returned by the server) and [`PatientDraft`]
//!   (the client-editable subset sent on create/update)
//! - Define the JSON wire models for both directions
//! - Translate between the two, enforcing required fields and value ranges
//!
//! Notes:
//! - `criticalCondition` is server-authoritative. It only exists on [`Patient`]; a draft has no
//!   way to carry it.
//! - Missing or null `medicalHistory` decodes as an empty list, missing or null
//!   `criticalCondition` as `false`. Every other required field must be present.

use crate::decode::{blank_to_none, from_json, identifier};
use crate::{IdStyle, WireError, WireResult};
use serde::{Deserialize, Serialize};
use ward_types::{NonEmptyText, RecordId};

/// Oldest accepted patient age, in years.
pub const MAX_AGE: u8 = 120;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Patient gender as recorded by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Convert to the wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse from the wire format string (case-insensitive).
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_wire())
    }
}

impl std::str::FromStr for Gender {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::from_wire(s).ok_or_else(|| {
            WireError::InvalidInput(format!(
                "gender must be one of male, female, other; got '{s}'"
            ))
        })
    }
}

/// A patient as last reported by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    /// Server-assigned identifier.
    pub id: RecordId,
    pub name: String,
    /// Age in years, `0..=MAX_AGE`.
    pub age: u8,
    pub gender: Gender,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    /// Free-text history entries in server order.
    pub medical_history: Vec<String>,
    /// Server-computed urgency flag. Never derived on the client.
    pub critical_condition: bool,
}

/// Client-editable patient attributes, used for both create and update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientDraft {
    pub name: NonEmptyText,
    pub age: u8,
    pub gender: Gender,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub medical_history: Vec<String>,
}

impl PatientDraft {
    /// Draft pre-filled from an existing patient, for edit forms.
    pub fn from_patient(patient: &Patient) -> WireResult<Self> {
        let name = NonEmptyText::new(&patient.name)
            .map_err(|e| WireError::InvalidInput(format!("name: {e}")))?;
        Ok(Self {
            name,
            age: patient.age,
            gender: patient.gender,
            address: patient.address.clone(),
            phone_number: patient.phone_number.clone(),
            medical_history: patient.medical_history.clone(),
        })
    }
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientWire {
    #[serde(rename = "_id", default)]
    object_id: Option<RecordId>,
    #[serde(default)]
    id: Option<RecordId>,
    name: String,
    age: i64,
    gender: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    medical_history: Option<Vec<String>>,
    #[serde(default)]
    critical_condition: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatientOut<'a> {
    #[serde(rename = "_id")]
    id: serde_json::Value,
    name: &'a str,
    age: u8,
    gender: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<&'a str>,
    medical_history: &'a [String],
    critical_condition: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientDraftWire {
    name: String,
    age: i64,
    gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    #[serde(default)]
    medical_history: Option<Vec<String>>,
}

// ============================================================================
// Public codec operations
// ============================================================================

/// Patient payload operations.
///
/// Zero-sized namespace for patient encode/decode functions.
pub struct PatientCodec;

impl PatientCodec {
    /// Parse a single patient returned by the server.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] if:
    /// - the text is not JSON,
    /// - a required field is missing or has the wrong type (reported with its JSON path),
    /// - `age` is outside `0..=120` or `gender` is not a known value.
    pub fn parse(json: &str) -> WireResult<Patient> {
        let wire: PatientWire = from_json(json, "Patient")?;
        wire_to_domain(wire)
    }

    /// Parse a patient collection, preserving server order.
    pub fn parse_list(json: &str) -> WireResult<Vec<Patient>> {
        let wires: Vec<PatientWire> = from_json(json, "Patient list")?;
        wires.into_iter().map(wire_to_domain).collect()
    }

    /// Render a patient as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidJson`] if serialisation fails.
    pub fn render(patient: &Patient, id_style: IdStyle) -> WireResult<serde_json::Value> {
        let out = PatientOut {
            id: id_style.render(&patient.id),
            name: &patient.name,
            age: patient.age,
            gender: patient.gender.to_wire(),
            address: patient.address.as_deref(),
            phone_number: patient.phone_number.as_deref(),
            medical_history: &patient.medical_history,
            critical_condition: patient.critical_condition,
        };
        Ok(serde_json::to_value(out)?)
    }

    /// Render a collection of patients as a JSON array.
    pub fn render_list(patients: &[Patient], id_style: IdStyle) -> WireResult<serde_json::Value> {
        let rendered = patients
            .iter()
            .map(|p| Self::render(p, id_style))
            .collect::<WireResult<Vec<_>>>()?;
        Ok(serde_json::Value::Array(rendered))
    }

    /// Parse a create/update request body.
    pub fn parse_draft(json: &str) -> WireResult<PatientDraft> {
        let wire: PatientDraftWire = from_json(json, "Patient draft")?;
        let name = NonEmptyText::new(&wire.name)
            .map_err(|e| WireError::InvalidInput(format!("name: {e}")))?;
        Ok(PatientDraft {
            name,
            age: age_from_wire(wire.age)?,
            gender: wire.gender.parse()?,
            address: blank_to_none(wire.address),
            phone_number: blank_to_none(wire.phone_number),
            medical_history: wire.medical_history.unwrap_or_default(),
        })
    }

    /// Render a create/update request body.
    pub fn render_draft(draft: &PatientDraft) -> WireResult<serde_json::Value> {
        let wire = PatientDraftWire {
            name: draft.name.to_string(),
            age: i64::from(draft.age),
            gender: draft.gender.to_wire().to_string(),
            address: draft.address.clone(),
            phone_number: draft.phone_number.clone(),
            medical_history: Some(draft.medical_history.clone()),
        };
        Ok(serde_json::to_value(wire)?)
    }
}

fn age_from_wire(age: i64) -> WireResult<u8> {
    u8::try_from(age)
        .ok()
        .filter(|a| *a <= MAX_AGE)
        .ok_or_else(|| {
            WireError::InvalidInput(format!("age must be between 0 and {MAX_AGE}, got {age}"))
        })
}

fn wire_to_domain(wire: PatientWire) -> WireResult<Patient> {
    let id = identifier(wire.object_id, wire.id, "Patient")?;
    let gender = Gender::from_wire(&wire.gender).ok_or_else(|| {
        WireError::Translation(format!(
            "Patient {} has unknown gender '{}'",
            id, wire.gender
        ))
    })?;

    Ok(Patient {
        age: age_from_wire(wire.age)?,
        id,
        name: wire.name,
        gender,
        address: blank_to_none(wire.address),
        phone_number: blank_to_none(wire.phone_number),
        medical_history: wire.medical_history.unwrap_or_default(),
        critical_condition: wire.critical_condition.unwrap_or(false),
    })
}
