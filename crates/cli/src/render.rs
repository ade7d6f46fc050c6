//! Plain-text rendering of controller views.

use ward_core::{DetailView, ListView, LoadPhase, MedicalHistory, Notice, Patient, Test};

pub fn patient_line(patient: &Patient) -> String {
    let flag = if patient.critical_condition {
        "  [CRITICAL]"
    } else {
        ""
    };
    format!(
        "{}  {} ({}, {}){}",
        patient.id, patient.name, patient.age, patient.gender, flag
    )
}

pub fn test_line(test: &Test) -> String {
    format!(
        "{}  {}  {}: {}",
        test.id,
        test.date.format("%Y-%m-%d %H:%M"),
        test.kind,
        test.value
    )
}

pub fn list(view: &ListView) -> String {
    let mut out = String::new();
    if view.patients.is_empty() {
        out.push_str("No patients found.\n");
    }
    for patient in &view.patients {
        out.push_str(&patient_line(patient));
        out.push('\n');
    }
    if !view.filter.trim().is_empty() {
        out.push_str(&format!(
            "{} of {} patients match '{}'\n",
            view.patients.len(),
            view.total,
            view.filter
        ));
    }
    out
}

pub fn patient_details(patient: &Patient) -> String {
    let mut out = patient_line(patient);
    out.push('\n');
    if let Some(address) = &patient.address {
        out.push_str(&format!("  Address: {address}\n"));
    }
    if let Some(phone) = &patient.phone_number {
        out.push_str(&format!("  Phone: {phone}\n"));
    }
    if !patient.medical_history.is_empty() {
        out.push_str(&format!(
            "  History: {}\n",
            patient.medical_history.join("; ")
        ));
    }
    out
}

pub fn detail(view: &DetailView) -> String {
    let mut out = String::new();
    match (view.patient.value(), view.patient.phase) {
        (Some(patient), LoadPhase::Failed) => {
            out.push_str(&patient_details(patient));
            out.push_str("  (patient could not be refreshed; showing last known data)\n");
        }
        (Some(patient), _) => out.push_str(&patient_details(patient)),
        (None, _) => out.push_str(&format!("Patient {} unavailable\n", view.patient_id)),
    }

    match view.tests.value() {
        Some(tests) if tests.is_empty() => out.push_str("Tests: none\n"),
        Some(tests) => {
            out.push_str("Tests:\n");
            for test in tests {
                out.push_str("  ");
                out.push_str(&test_line(test));
                out.push('\n');
            }
        }
        None => out.push_str("Tests: unavailable\n"),
    }
    out
}

pub fn history(history: &MedicalHistory) -> String {
    let mut out = format!("History for {}\n", history.patient_id);
    for entry in &history.medical_history {
        out.push_str(&format!("  - {entry}\n"));
    }
    for test in &history.tests {
        out.push_str("  ");
        out.push_str(&test_line(test));
        out.push('\n');
    }
    out
}

pub fn notice(notice: &Notice) -> String {
    if notice.retryable {
        format!("{notice} (try again)")
    } else {
        notice.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_core::{Gender, RecordId};

    fn jane(critical: bool) -> Patient {
        Patient {
            id: RecordId::parse("64b7f0c2a1").unwrap(),
            name: "Jane Doe".into(),
            age: 61,
            gender: Gender::Female,
            address: None,
            phone_number: Some("+1 555 0100".into()),
            medical_history: vec!["asthma".into(), "flu".into()],
            critical_condition: critical,
        }
    }

    #[test]
    fn critical_patients_are_flagged() {
        assert!(patient_line(&jane(true)).ends_with("[CRITICAL]"));
        assert!(!patient_line(&jane(false)).contains("CRITICAL"));
    }

    #[test]
    fn details_skip_absent_fields() {
        let text = patient_details(&jane(false));
        assert!(text.contains("Phone: +1 555 0100"));
        assert!(text.contains("History: asthma; flu"));
        assert!(!text.contains("Address"));
    }
}
