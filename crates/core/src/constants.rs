//! Constants used throughout the Ward core crate.
//!
//! Path segments and defaults live here so the gateway, configuration and binaries agree on them.

/// Base URL used when no API URL is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Environment variable read by binaries to override the API base URL.
pub const API_URL_ENV: &str = "WARD_API_URL";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("ward/", env!("CARGO_PKG_VERSION"));

/// Collection segment for patient resources.
pub const PATIENTS_SEGMENT: &str = "patients";

/// Sub-collection listing only patients flagged as critical.
pub const CRITICAL_SEGMENT: &str = "critical";

/// Sub-collection for a patient's tests.
pub const TESTS_SEGMENT: &str = "tests";

/// Aggregated history of a patient.
pub const HISTORY_SEGMENT: &str = "history";
