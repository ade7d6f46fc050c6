//! Reading interpretation for the four known test kinds.
//!
//! The server rejects malformed readings of a known kind and derives each patient's
//! `criticalCondition` from the readings alone. Free-text kinds are accepted as-is and never make
//! a patient critical.

use crate::error::{ApiError, ApiResult};
use ward_wire::{Test, TestKind};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reading {
    BloodPressure { systolic: u32, diastolic: u32 },
    RespiratoryRate(u32),
    BloodOxygen(f64),
    HeartbeatRate(u32),
}

impl Reading {
    /// Interpret `value` for `kind`. Returns `Ok(None)` for free-text kinds.
    pub fn parse(kind: &TestKind, value: &str) -> ApiResult<Option<Self>> {
        let value = value.trim();
        let invalid = || ApiError::BadRequest(format!("'{value}' is not a valid {kind} reading"));

        let reading = match kind {
            TestKind::BloodPressure => {
                let (sys, dia) = value.split_once('/').ok_or_else(invalid)?;
                Reading::BloodPressure {
                    systolic: whole(sys).ok_or_else(invalid)?,
                    diastolic: whole(dia).ok_or_else(invalid)?,
                }
            }
            TestKind::RespiratoryRate => Reading::RespiratoryRate(whole(value).ok_or_else(invalid)?),
            TestKind::BloodOxygenLevel => {
                let level: f64 = value
                    .strip_suffix('%')
                    .unwrap_or(value)
                    .trim()
                    .parse()
                    .map_err(|_| invalid())?;
                if !level.is_finite() || !(0.0..=100.0).contains(&level) {
                    return Err(invalid());
                }
                Reading::BloodOxygen(level)
            }
            TestKind::HeartbeatRate => Reading::HeartbeatRate(whole(value).ok_or_else(invalid)?),
            TestKind::Other(_) => return Ok(None),
        };
        Ok(Some(reading))
    }

    pub fn is_critical(&self) -> bool {
        match *self {
            Reading::BloodPressure {
                systolic,
                diastolic,
            } => systolic >= 180 || systolic < 90 || diastolic >= 120 || diastolic < 60,
            Reading::RespiratoryRate(rate) => !(10..=24).contains(&rate),
            Reading::BloodOxygen(level) => level < 92.0,
            Reading::HeartbeatRate(rate) => !(50..=120).contains(&rate),
        }
    }
}

/// Whether any of a patient's tests holds a critical reading.
pub fn any_critical<'a>(tests: impl IntoIterator<Item = &'a Test>) -> bool {
    tests.into_iter().any(|test| {
        matches!(Reading::parse(&test.kind, &test.value), Ok(Some(reading)) if reading.is_critical())
    })
}

fn whole(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_types::NonEmptyText;

    fn critical(kind: TestKind, value: &str) -> bool {
        Reading::parse(&kind, value).unwrap().unwrap().is_critical()
    }

    #[test]
    fn blood_pressure_thresholds() {
        assert!(!critical(TestKind::BloodPressure, "120/80"));
        assert!(critical(TestKind::BloodPressure, "180/80"));
        assert!(critical(TestKind::BloodPressure, "89/70"));
        assert!(critical(TestKind::BloodPressure, "140/120"));
        assert!(critical(TestKind::BloodPressure, "100/59"));
    }

    #[test]
    fn rate_and_oxygen_thresholds() {
        assert!(!critical(TestKind::RespiratoryRate, "10"));
        assert!(!critical(TestKind::RespiratoryRate, "24"));
        assert!(critical(TestKind::RespiratoryRate, "25"));
        assert!(critical(TestKind::BloodOxygenLevel, "91.9%"));
        assert!(!critical(TestKind::BloodOxygenLevel, "92"));
        assert!(critical(TestKind::HeartbeatRate, "49"));
        assert!(!critical(TestKind::HeartbeatRate, "120"));
        assert!(critical(TestKind::HeartbeatRate, "121"));
    }

    #[test]
    fn malformed_known_readings_are_rejected() {
        assert!(Reading::parse(&TestKind::BloodPressure, "high").is_err());
        assert!(Reading::parse(&TestKind::HeartbeatRate, "72.5").is_err());
        assert!(Reading::parse(&TestKind::BloodOxygenLevel, "120").is_err());
    }

    #[test]
    fn free_text_is_never_critical() {
        let kind = TestKind::Other(NonEmptyText::new("Glucose").unwrap());
        assert_eq!(Reading::parse(&kind, "anything").unwrap(), None);
    }
}
