use crate::{WireError, WireResult};
use serde::de::DeserializeOwned;
use ward_types::RecordId;

/// Deserialise `json` into `T`, reporting the failing field path on schema mismatch.
///
/// `what` names the payload in error messages (e.g. `Patient`, `Test list`).
pub(crate) fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> WireResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);

    let parsed = match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(WireError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )));
        }
    };

    deserializer.end()?;
    Ok(parsed)
}

/// Pick the record identifier from `_id`, falling back to `id`.
///
/// Backends that emit a virtual `id` next to `_id` send both; `_id` wins.
pub(crate) fn identifier(
    object_id: Option<RecordId>,
    id: Option<RecordId>,
    what: &str,
) -> WireResult<RecordId> {
    object_id
        .or(id)
        .ok_or_else(|| WireError::Translation(format!("{what} is missing `_id`")))
}

/// Trim an optional free-text field, mapping blank values to `None`.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
