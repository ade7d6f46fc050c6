//! Remote gateway to the hospital record API.
//!
//! [`RecordGateway`] has one operation per resource action. Implementations are stateless: they
//! perform the request, classify failures into [`SyncError`], decode successful bodies, and
//! nothing else. No caching, no retries, no local state.
//!
//! [`HttpGateway`] is the production implementation over `reqwest`.

use crate::config::ClientConfig;
use crate::constants::{CRITICAL_SEGMENT, HISTORY_SEGMENT, PATIENTS_SEGMENT, TESTS_SEGMENT};
use crate::{SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;
use url::Url;
use ward_types::RecordId;
use ward_wire::{
    HistoryCodec, MedicalHistory, Patient, PatientCodec, PatientDraft, Test, TestCodec, TestDraft,
};

/// Typed access to the remote record service.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// `GET /patients`
    async fn list_patients(&self) -> SyncResult<Vec<Patient>>;

    /// `GET /patients/critical`
    async fn list_critical_patients(&self) -> SyncResult<Vec<Patient>>;

    /// `GET /patients/{id}`
    async fn get_patient(&self, id: &RecordId) -> SyncResult<Patient>;

    /// `POST /patients`
    async fn create_patient(&self, draft: &PatientDraft) -> SyncResult<Patient>;

    /// `PUT /patients/{id}`
    async fn update_patient(&self, id: &RecordId, draft: &PatientDraft) -> SyncResult<Patient>;

    /// `DELETE /patients/{id}`; the server cascades to the patient's tests.
    async fn delete_patient(&self, id: &RecordId) -> SyncResult<()>;

    /// `GET /patients/{id}/tests`
    async fn list_tests(&self, patient_id: &RecordId) -> SyncResult<Vec<Test>>;

    /// `GET /patients/{id}/tests/{testId}`
    async fn get_test(&self, patient_id: &RecordId, test_id: &RecordId) -> SyncResult<Test>;

    /// `POST /patients/{id}/tests`
    async fn create_test(&self, patient_id: &RecordId, draft: &TestDraft) -> SyncResult<Test>;

    /// `PUT /patients/{id}/tests/{testId}`
    async fn update_test(
        &self,
        patient_id: &RecordId,
        test_id: &RecordId,
        draft: &TestDraft,
    ) -> SyncResult<Test>;

    /// `DELETE /patients/{id}/tests/{testId}`
    async fn delete_test(&self, patient_id: &RecordId, test_id: &RecordId) -> SyncResult<()>;

    /// `GET /patients/{id}/history`
    async fn fetch_history(&self, patient_id: &RecordId) -> SyncResult<MedicalHistory>;
}

/// [`RecordGateway`] over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    http_client: reqwest::Client,
    cfg: Arc<ClientConfig>,
}

impl HttpGateway {
    /// Create a gateway for the configured API.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] if the HTTP client cannot be constructed.
    pub fn new(cfg: Arc<ClientConfig>) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(cfg.user_agent())
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;

        tracing::info!("Creating HttpGateway for {}", cfg.base_url());

        Ok(Self { http_client, cfg })
    }

    fn patient_url(&self, id: &RecordId) -> Url {
        self.cfg.endpoint(&[PATIENTS_SEGMENT, id.as_str()])
    }

    fn tests_url(&self, patient_id: &RecordId) -> Url {
        self.cfg
            .endpoint(&[PATIENTS_SEGMENT, patient_id.as_str(), TESTS_SEGMENT])
    }

    fn test_url(&self, patient_id: &RecordId, test_id: &RecordId) -> Url {
        self.cfg.endpoint(&[
            PATIENTS_SEGMENT,
            patient_id.as_str(),
            TESTS_SEGMENT,
            test_id.as_str(),
        ])
    }

    /// Perform a request and return the body of a successful response.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> SyncResult<String> {
        tracing::debug!(%method, %url, "gateway request");

        let mut request = self
            .http_client
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");
        request = match body {
            Some(body) => request.json(&body),
            None => request.header(CONTENT_TYPE, "application/json"),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, %url, "gateway transport failure: {}", e);
                return Err(SyncError::Network(e.to_string()));
            }
        };

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::warn!(%method, %url, "failed to read response body: {}", e);
            SyncError::Network(e.to_string())
        })?;

        if status.is_success() {
            return Ok(text);
        }

        let message = server_message(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        let err = SyncError::from_status(status.as_u16(), message);
        tracing::warn!(%method, %url, status = status.as_u16(), "gateway request failed: {}", err);
        Err(err)
    }

    async fn get<T>(&self, url: Url, parse: fn(&str) -> ward_wire::WireResult<T>) -> SyncResult<T> {
        let body = self.send(Method::GET, url, None).await?;
        parse(&body).map_err(decode_error)
    }
}

/// Extract a human-readable message from an error response body.
///
/// Accepts `{"message": ...}`, `{"error": ...}`, or a plain-text body.
fn server_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed.message.or(parsed.error),
        Err(_) => Some(trimmed.to_string()),
    }
}

fn encode_error(err: ward_wire::WireError) -> SyncError {
    tracing::warn!("failed to encode request: {}", err);
    SyncError::InvalidInput(format!("failed to encode request: {err}"))
}

fn decode_error(err: ward_wire::WireError) -> SyncError {
    tracing::warn!("failed to decode response: {}", err);
    SyncError::Decode(err.to_string())
}

#[async_trait]
impl RecordGateway for HttpGateway {
    async fn list_patients(&self) -> SyncResult<Vec<Patient>> {
        let url = self.cfg.endpoint(&[PATIENTS_SEGMENT]);
        self.get(url, PatientCodec::parse_list).await
    }

    async fn list_critical_patients(&self) -> SyncResult<Vec<Patient>> {
        let url = self.cfg.endpoint(&[PATIENTS_SEGMENT, CRITICAL_SEGMENT]);
        self.get(url, PatientCodec::parse_list).await
    }

    async fn get_patient(&self, id: &RecordId) -> SyncResult<Patient> {
        self.get(self.patient_url(id), PatientCodec::parse).await
    }

    async fn create_patient(&self, draft: &PatientDraft) -> SyncResult<Patient> {
        let url = self.cfg.endpoint(&[PATIENTS_SEGMENT]);
        let body = self
            .send(Method::POST, url, Some(PatientCodec::render_draft(draft).map_err(encode_error)?))
            .await?;
        PatientCodec::parse(&body).map_err(decode_error)
    }

    async fn update_patient(&self, id: &RecordId, draft: &PatientDraft) -> SyncResult<Patient> {
        let body = self
            .send(
                Method::PUT,
                self.patient_url(id),
                Some(PatientCodec::render_draft(draft).map_err(encode_error)?),
            )
            .await?;
        PatientCodec::parse(&body).map_err(decode_error)
    }

    async fn delete_patient(&self, id: &RecordId) -> SyncResult<()> {
        self.send(Method::DELETE, self.patient_url(id), None)
            .await
            .map(|_| ())
    }

    async fn list_tests(&self, patient_id: &RecordId) -> SyncResult<Vec<Test>> {
        self.get(self.tests_url(patient_id), TestCodec::parse_list)
            .await
    }

    async fn get_test(&self, patient_id: &RecordId, test_id: &RecordId) -> SyncResult<Test> {
        self.get(self.test_url(patient_id, test_id), TestCodec::parse)
            .await
    }

    async fn create_test(&self, patient_id: &RecordId, draft: &TestDraft) -> SyncResult<Test> {
        let body = self
            .send(
                Method::POST,
                self.tests_url(patient_id),
                Some(TestCodec::render_draft(draft).map_err(encode_error)?),
            )
            .await?;
        TestCodec::parse(&body).map_err(decode_error)
    }

    async fn update_test(
        &self,
        patient_id: &RecordId,
        test_id: &RecordId,
        draft: &TestDraft,
    ) -> SyncResult<Test> {
        let body = self
            .send(
                Method::PUT,
                self.test_url(patient_id, test_id),
                Some(TestCodec::render_draft(draft).map_err(encode_error)?),
            )
            .await?;
        TestCodec::parse(&body).map_err(decode_error)
    }

    async fn delete_test(&self, patient_id: &RecordId, test_id: &RecordId) -> SyncResult<()> {
        self.send(Method::DELETE, self.test_url(patient_id, test_id), None)
            .await
            .map(|_| ())
    }

    async fn fetch_history(&self, patient_id: &RecordId) -> SyncResult<MedicalHistory> {
        let url = self
            .cfg
            .endpoint(&[PATIENTS_SEGMENT, patient_id.as_str(), HISTORY_SEGMENT]);
        self.get(url, HistoryCodec::parse).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::validation::{patient_draft, test_draft, PatientInput};

    async fn spawn_server() -> HttpGateway {
        serve(ward_api_rest::router(ward_api_rest::AppState::default())).await
    }

    async fn serve(app: axum::Router) -> HttpGateway {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("reference server");
        });

        let cfg = ClientConfig::with_base_url(&format!("http://{addr}/api")).unwrap();
        HttpGateway::new(Arc::new(cfg)).unwrap()
    }

    fn john() -> PatientDraft {
        patient_draft(PatientInput {
            name: "John Doe".into(),
            age: 42,
            gender: "male".into(),
            medical_history: vec!["asthma".into()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn server_message_prefers_json_message() {
        assert_eq!(
            server_message(r#"{"message": "age is required"}"#).as_deref(),
            Some("age is required")
        );
        assert_eq!(
            server_message(r#"{"error": "nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(server_message("plain failure").as_deref(), Some("plain failure"));
        assert_eq!(server_message("  "), None);
    }

    #[tokio::test]
    async fn patient_lifecycle_against_reference_server() {
        let gateway = spawn_server().await;

        let created = gateway.create_patient(&john()).await.expect("create");
        assert_eq!(created.name, "John Doe");
        assert!(!created.critical_condition);

        let listed = gateway.list_patients().await.expect("list");
        assert_eq!(listed, vec![created.clone()]);

        let fetched = gateway.get_patient(&created.id).await.expect("get");
        assert_eq!(fetched, created);

        let mut changed = john();
        changed.age = 43;
        let updated = gateway
            .update_patient(&created.id, &changed)
            .await
            .expect("update");
        assert_eq!(updated.age, 43);

        gateway.delete_patient(&created.id).await.expect("delete");
        let err = gateway
            .get_patient(&created.id)
            .await
            .expect_err("deleted patient is gone");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_mutations_flip_critical_condition_server_side() {
        let gateway = spawn_server().await;
        let patient = gateway.create_patient(&john()).await.unwrap();

        let test = gateway
            .create_test(&patient.id, &test_draft("Blood Oxygen Level", "85").unwrap())
            .await
            .expect("create test");
        assert_eq!(test.patient_id, patient.id);

        let reloaded = gateway.get_patient(&patient.id).await.unwrap();
        assert!(reloaded.critical_condition);

        let critical = gateway.list_critical_patients().await.unwrap();
        assert_eq!(critical.len(), 1);

        let updated = gateway
            .update_test(
                &patient.id,
                &test.id,
                &test_draft("Blood Oxygen Level", "98").unwrap(),
            )
            .await
            .expect("update test");
        assert_eq!(updated.date, test.date);
        assert_eq!(updated.value, "98");
        assert!(!gateway.get_patient(&patient.id).await.unwrap().critical_condition);

        let fetched = gateway.get_test(&patient.id, &test.id).await.unwrap();
        assert_eq!(fetched, updated);

        let history = gateway.fetch_history(&patient.id).await.unwrap();
        assert_eq!(history.medical_history, vec!["asthma"]);
        assert_eq!(history.tests, vec![updated]);

        gateway.delete_test(&patient.id, &test.id).await.unwrap();
        assert!(gateway.list_tests(&patient.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_bodies_are_sent_as_json() {
        use axum::http::{header, HeaderMap, StatusCode};
        use axum::Json;

        let app = axum::Router::new().route(
            "/api/patients",
            axum::routing::post(|headers: HeaderMap, body: String| async move {
                let is_json = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    == Some("application/json");
                if !is_json {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({"message": "expected a JSON body"})),
                    );
                }
                let draft: serde_json::Value = serde_json::from_str(&body).unwrap();
                (
                    StatusCode::CREATED,
                    Json(serde_json::json!({
                        "_id": "p1",
                        "name": draft["name"],
                        "age": draft["age"],
                        "gender": draft["gender"],
                    })),
                )
            }),
        );
        let gateway = serve(app).await;

        let created = gateway.create_patient(&john()).await.expect("JSON body accepted");
        assert_eq!(created.name, "John Doe");
        assert_eq!(created.age, 42);
    }

    #[tokio::test]
    async fn rejected_payload_is_a_validation_error() {
        let gateway = spawn_server().await;
        let patient = gateway.create_patient(&john()).await.unwrap();

        // Bypasses client-side validation on purpose.
        let draft = TestDraft {
            kind: ward_wire::TestKind::BloodPressure,
            value: ward_types::NonEmptyText::new("high").unwrap(),
        };
        let err = gateway
            .create_test(&patient.id, &draft)
            .await
            .expect_err("server rejects malformed reading");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let cfg = ClientConfig::with_base_url(&format!("http://{addr}/api")).unwrap();
        let gateway = HttpGateway::new(Arc::new(cfg)).unwrap();
        let err = gateway.list_patients().await.expect_err("nothing listens");
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
