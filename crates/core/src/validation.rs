//! Input validation utilities.
//!
//! Patient and test input is checked here before it is submitted. Failures are reported as
//! [`SyncError::InvalidInput`] and never reach the network.

use crate::{SyncError, SyncResult};
use ward_types::NonEmptyText;
use ward_wire::{Gender, PatientDraft, TestDraft, TestKind, MAX_AGE};

/// Raw patient form input, as typed by the user.
#[derive(Clone, Debug, Default)]
pub struct PatientInput {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub medical_history: Vec<String>,
}

/// Validate and normalise patient form input into a draft.
///
/// - `name` is trimmed and must not be blank
/// - `age` must be within `0..=120`
/// - `gender` must be `male`, `female` or `other` (any case)
/// - blank `address`/`phone_number` become `None`, blank history entries are dropped
///
/// # Errors
///
/// Returns [`SyncError::InvalidInput`] naming the first offending field.
pub fn patient_draft(input: PatientInput) -> SyncResult<PatientDraft> {
    let name = NonEmptyText::new(&input.name)
        .map_err(|_| SyncError::InvalidInput("name cannot be empty".into()))?;

    let age = u8::try_from(input.age)
        .ok()
        .filter(|a| *a <= MAX_AGE)
        .ok_or_else(|| {
            SyncError::InvalidInput(format!(
                "age must be between 0 and {MAX_AGE}, got {}",
                input.age
            ))
        })?;

    let gender = Gender::from_wire(&input.gender).ok_or_else(|| {
        SyncError::InvalidInput(format!(
            "gender must be one of male, female, other; got '{}'",
            input.gender.trim()
        ))
    })?;

    let draft = PatientDraft {
        name,
        age,
        gender,
        address: trimmed(input.address),
        phone_number: trimmed(input.phone_number),
        medical_history: input
            .medical_history
            .into_iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect(),
    };

    check_patient_draft(&draft)?;
    Ok(draft)
}

/// Check a draft built by other means against the same rules as [`patient_draft`].
pub fn check_patient_draft(draft: &PatientDraft) -> SyncResult<()> {
    if draft.age > MAX_AGE {
        return Err(SyncError::InvalidInput(format!(
            "age must be between 0 and {MAX_AGE}, got {}",
            draft.age
        )));
    }

    if let Some(phone) = &draft.phone_number {
        let ok = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
        if !ok || !phone.chars().any(|c| c.is_ascii_digit()) {
            return Err(SyncError::InvalidInput(format!(
                "phone number contains invalid characters: '{phone}'"
            )));
        }
    }

    if draft.medical_history.iter().any(|e| e.trim().is_empty()) {
        return Err(SyncError::InvalidInput(
            "medical history entries cannot be empty".into(),
        ));
    }

    Ok(())
}

/// Validate test form input into a draft.
pub fn test_draft(kind: &str, value: &str) -> SyncResult<TestDraft> {
    let kind = TestKind::from_wire(kind)
        .ok_or_else(|| SyncError::InvalidInput("test type cannot be empty".into()))?;
    let value = NonEmptyText::new(value)
        .map_err(|_| SyncError::InvalidInput("test value cannot be empty".into()))?;

    check_test_value(&kind, value.as_str())?;
    Ok(TestDraft { kind, value })
}

/// Check that `value` is well-formed for the given test kind.
///
/// | Kind | Format |
/// |---|---|
/// | blood pressure | `SYS/DIA`, systolic 50–300, diastolic 30–200, systolic > diastolic |
/// | respiratory rate | integer 1–100 |
/// | blood oxygen level | number 0–100, optional trailing `%` |
/// | heartbeat rate | integer 20–300 |
/// | other | any non-empty text |
pub fn check_test_value(kind: &TestKind, value: &str) -> SyncResult<()> {
    let value = value.trim();
    match kind {
        TestKind::BloodPressure => {
            let invalid = || {
                SyncError::InvalidInput(format!(
                    "blood pressure must look like 120/80, got '{value}'"
                ))
            };
            let (sys, dia) = value.split_once('/').ok_or_else(invalid)?;
            let sys = parse_int(sys).ok_or_else(invalid)?;
            let dia = parse_int(dia).ok_or_else(invalid)?;
            in_range("systolic pressure", sys, 50, 300)?;
            in_range("diastolic pressure", dia, 30, 200)?;
            if sys <= dia {
                return Err(SyncError::InvalidInput(format!(
                    "systolic pressure must exceed diastolic pressure, got '{value}'"
                )));
            }
            Ok(())
        }
        TestKind::RespiratoryRate => {
            let rate = parse_int(value).ok_or_else(|| {
                SyncError::InvalidInput(format!(
                    "respiratory rate must be a whole number of breaths per minute, got '{value}'"
                ))
            })?;
            in_range("respiratory rate", rate, 1, 100)
        }
        TestKind::BloodOxygenLevel => {
            let number = value.strip_suffix('%').unwrap_or(value).trim();
            let level: f64 = number
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| {
                    SyncError::InvalidInput(format!(
                        "blood oxygen level must be a percentage, got '{value}'"
                    ))
                })?;
            if !(0.0..=100.0).contains(&level) {
                return Err(SyncError::InvalidInput(format!(
                    "blood oxygen level must be between 0 and 100, got '{value}'"
                )));
            }
            Ok(())
        }
        TestKind::HeartbeatRate => {
            let rate = parse_int(value).ok_or_else(|| {
                SyncError::InvalidInput(format!(
                    "heartbeat rate must be a whole number of beats per minute, got '{value}'"
                ))
            })?;
            in_range("heartbeat rate", rate, 20, 300)
        }
        TestKind::Other(_) => {
            if value.is_empty() {
                return Err(SyncError::InvalidInput("test value cannot be empty".into()));
            }
            Ok(())
        }
    }
}

fn parse_int(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn in_range(what: &str, value: u32, min: u32, max: u32) -> SyncResult<()> {
    if value < min || value > max {
        return Err(SyncError::InvalidInput(format!(
            "{what} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PatientInput {
        PatientInput {
            name: "  John Doe ".into(),
            age: 42,
            gender: "Male".into(),
            address: Some("   ".into()),
            phone_number: Some(" +1 (555) 010-0100 ".into()),
            medical_history: vec!["asthma".into(), "  ".into(), " flu ".into()],
        }
    }

    #[test]
    fn normalises_patient_input() {
        let draft = patient_draft(input()).expect("valid input");
        assert_eq!(draft.name.as_str(), "John Doe");
        assert_eq!(draft.gender, Gender::Male);
        assert_eq!(draft.address, None);
        assert_eq!(draft.phone_number.as_deref(), Some("+1 (555) 010-0100"));
        assert_eq!(draft.medical_history, vec!["asthma", "flu"]);
    }

    #[test]
    fn rejects_invalid_patient_fields() {
        let mut blank_name = input();
        blank_name.name = " ".into();
        assert!(matches!(
            patient_draft(blank_name),
            Err(SyncError::InvalidInput(msg)) if msg.contains("name")
        ));

        for age in [-1, 121, 300] {
            let mut bad_age = input();
            bad_age.age = age;
            assert!(patient_draft(bad_age).is_err(), "age {age} should be rejected");
        }

        let mut edge = input();
        edge.age = 120;
        assert!(patient_draft(edge).is_ok());

        let mut bad_gender = input();
        bad_gender.gender = "unknown".into();
        assert!(patient_draft(bad_gender).is_err());

        let mut bad_phone = input();
        bad_phone.phone_number = Some("call me".into());
        assert!(patient_draft(bad_phone).is_err());
    }

    #[test]
    fn blood_pressure_format() {
        assert!(check_test_value(&TestKind::BloodPressure, "120/80").is_ok());
        assert!(check_test_value(&TestKind::BloodPressure, " 95/60 ").is_ok());
        assert!(check_test_value(&TestKind::BloodPressure, "120").is_err());
        assert!(check_test_value(&TestKind::BloodPressure, "80/120").is_err());
        assert!(check_test_value(&TestKind::BloodPressure, "120/-80").is_err());
        assert!(check_test_value(&TestKind::BloodPressure, "400/80").is_err());
        assert!(check_test_value(&TestKind::BloodPressure, "abc/def").is_err());
    }

    #[test]
    fn numeric_vitals_ranges() {
        assert!(check_test_value(&TestKind::RespiratoryRate, "16").is_ok());
        assert!(check_test_value(&TestKind::RespiratoryRate, "0").is_err());
        assert!(check_test_value(&TestKind::RespiratoryRate, "16.5").is_err());

        assert!(check_test_value(&TestKind::BloodOxygenLevel, "97").is_ok());
        assert!(check_test_value(&TestKind::BloodOxygenLevel, "97.5%").is_ok());
        assert!(check_test_value(&TestKind::BloodOxygenLevel, "101").is_err());
        assert!(check_test_value(&TestKind::BloodOxygenLevel, "NaN").is_err());

        assert!(check_test_value(&TestKind::HeartbeatRate, "72").is_ok());
        assert!(check_test_value(&TestKind::HeartbeatRate, "10").is_err());
    }

    #[test]
    fn free_text_tests_accept_any_value() {
        let draft = test_draft("Glucose", "5.4 mmol/L").expect("free text is allowed");
        assert_eq!(draft.kind.to_wire(), "Glucose");
        assert!(test_draft("Glucose", "  ").is_err());
        assert!(test_draft("  ", "5").is_err());
    }

    #[test]
    fn test_draft_resolves_known_kinds() {
        let draft = test_draft("blood pressure", "130/85").unwrap();
        assert_eq!(draft.kind, TestKind::BloodPressure);
        assert!(test_draft("Blood Pressure", "130").is_err());
    }
}
