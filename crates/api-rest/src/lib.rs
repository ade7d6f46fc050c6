//! # Ward API REST
//!
//! In-memory reference implementation of the hospital record REST API.
//!
//! Handles:
//! - HTTP endpoints with axum, nested under `/api`
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Patients are emitted with extended-JSON identifiers (`{"$oid": ...}`), tests with plain string
//! identifiers. Request bodies go through the same `ward-wire` codecs the client uses.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod store;
pub mod vitals;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use ward_types::RecordId;
use ward_wire::{HistoryCodec, IdStyle, PatientCodec, TestCodec, WireResult};

pub use error::{ApiError, ApiResult};
pub use store::RecordStore;

/// Identifier style for patients in responses.
const PATIENT_IDS: IdStyle = IdStyle::ObjectId;
/// Identifier style for tests (and history) in responses.
const TEST_IDS: IdStyle = IdStyle::Plain;

/// Application state for the REST API server.
///
/// Cloned into every handler; all clones share one store.
#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<RwLock<RecordStore>>,
}

#[derive(OpenApi)]
#[openapi(paths(
    health,
    list_patients,
    create_patient,
    list_critical_patients,
    get_patient,
    update_patient,
    delete_patient,
    list_tests,
    create_test,
    get_test,
    update_test,
    delete_test,
    get_history,
))]
struct ApiDoc;

/// Build the application router.
///
/// Record routes live under `/api`; `/health` and the Swagger UI sit at the root.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/critical", get(list_critical_patients))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/tests", get(list_tests).post(create_test))
        .route(
            "/patients/:id/tests/:test_id",
            get(get_test).put(update_test).delete(delete_test),
        )
        .route("/patients/:id/history", get(get_history));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A response body that failed to render is the server's fault, not the caller's.
fn rendered(body: WireResult<Value>) -> ApiResult<Json<Value>> {
    body.map(Json)
        .map_err(|e| ApiError::Internal(format!("failed to render response: {e}")))
}

/// Unknown or malformed identifiers are simply not found.
fn record_id(raw: &str, what: &'static str) -> ApiResult<RecordId> {
    RecordId::parse(raw).map_err(|_| ApiError::NotFound(what))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive"))
)]
async fn health() -> Json<Value> {
    Json(serde_json::json!({ "ok": true, "message": "Ward REST API is alive" }))
}

#[utoipa::path(
    get,
    path = "/api/patients",
    responses((status = 200, description = "All patients in creation order"))
)]
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    rendered(PatientCodec::render_list(store.patients(), PATIENT_IDS))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    responses(
        (status = 201, description = "Patient created"),
        (status = 400, description = "Invalid patient payload")
    )
)]
/// Create a patient. The body carries the editable attributes only; any identifier or
/// `criticalCondition` in it is ignored.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let draft = PatientCodec::parse_draft(&body)?;
    let patient = state.store.write().await.create_patient(draft)?;
    Ok((
        StatusCode::CREATED,
        rendered(PatientCodec::render(&patient, PATIENT_IDS))?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/patients/critical",
    responses((status = 200, description = "Patients whose criticalCondition is true"))
)]
async fn list_critical_patients(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let critical = state.store.read().await.critical_patients();
    rendered(PatientCodec::render_list(&critical, PATIENT_IDS))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "The patient"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "patient")?;
    let store = state.store.read().await;
    rendered(PatientCodec::render(store.patient(&id)?, PATIENT_IDS))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient updated"),
        (status = 400, description = "Invalid patient payload"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "patient")?;
    let draft = PatientCodec::parse_draft(&body)?;
    let patient = state.store.write().await.update_patient(&id, draft)?;
    rendered(PatientCodec::render(&patient, PATIENT_IDS))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 204, description = "Patient and its tests deleted"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = record_id(&id, "patient")?;
    state.store.write().await.delete_patient(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/tests",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "The patient's tests in creation order"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn list_tests(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "patient")?;
    let tests = state.store.read().await.tests(&id)?;
    rendered(TestCodec::render_list(&tests, TEST_IDS))
}

#[utoipa::path(
    post,
    path = "/api/patients/{id}/tests",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 201, description = "Test recorded; the patient's critical condition is re-evaluated"),
        (status = 400, description = "Invalid test payload or malformed reading"),
        (status = 404, description = "Unknown patient")
    )
)]
#[axum::debug_handler]
async fn create_test(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = record_id(&id, "patient")?;
    let draft = TestCodec::parse_draft(&body)?;
    let test = state.store.write().await.create_test(&id, draft)?;
    Ok((StatusCode::CREATED, rendered(TestCodec::render(&test, TEST_IDS))?))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/tests/{test_id}",
    params(
        ("id" = String, Path, description = "Patient identifier"),
        ("test_id" = String, Path, description = "Test identifier")
    ),
    responses(
        (status = 200, description = "The test"),
        (status = 404, description = "Unknown patient or test")
    )
)]
async fn get_test(
    State(state): State<AppState>,
    Path((id, test_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "patient")?;
    let test_id = record_id(&test_id, "test")?;
    let store = state.store.read().await;
    rendered(TestCodec::render(store.test(&id, &test_id)?, TEST_IDS))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}/tests/{test_id}",
    params(
        ("id" = String, Path, description = "Patient identifier"),
        ("test_id" = String, Path, description = "Test identifier")
    ),
    responses(
        (status = 200, description = "Test updated; its date is unchanged"),
        (status = 400, description = "Invalid test payload or malformed reading"),
        (status = 404, description = "Unknown patient or test")
    )
)]
async fn update_test(
    State(state): State<AppState>,
    Path((id, test_id)): Path<(String, String)>,
    body: String,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "patient")?;
    let test_id = record_id(&test_id, "test")?;
    let draft = TestCodec::parse_draft(&body)?;
    let test = state.store.write().await.update_test(&id, &test_id, draft)?;
    rendered(TestCodec::render(&test, TEST_IDS))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}/tests/{test_id}",
    params(
        ("id" = String, Path, description = "Patient identifier"),
        ("test_id" = String, Path, description = "Test identifier")
    ),
    responses(
        (status = 204, description = "Test deleted"),
        (status = 404, description = "Unknown patient or test")
    )
)]
async fn delete_test(
    State(state): State<AppState>,
    Path((id, test_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = record_id(&id, "patient")?;
    let test_id = record_id(&test_id, "test")?;
    state.store.write().await.delete_test(&id, &test_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/history",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Medical history and tests"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "patient")?;
    let history = state.store.read().await.history(&id)?;
    rendered(HistoryCodec::render(&history, TEST_IDS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn john() -> Value {
        serde_json::json!({
            "name": "John Doe",
            "age": 42,
            "gender": "male",
            "medicalHistory": ["asthma"]
        })
    }

    #[tokio::test]
    async fn patients_use_object_ids_and_tests_plain_ids() {
        let app = router(AppState::default());

        let (status, patient) = call(&app, Method::POST, "/api/patients", Some(john())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = patient["_id"]["$oid"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);
        assert_eq!(patient["criticalCondition"], false);

        let (status, test) = call(
            &app,
            Method::POST,
            &format!("/api/patients/{id}/tests"),
            Some(serde_json::json!({"type": "Heartbeat Rate", "value": "140"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(test["_id"].is_string());
        assert_eq!(test["patientId"], id.as_str());

        let (_, critical) = call(&app, Method::GET, "/api/patients/critical", None).await;
        assert_eq!(critical.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn errors_carry_a_message() {
        let app = router(AppState::default());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/patients",
            Some(serde_json::json!({"name": "", "age": 42, "gender": "male"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("name"));

        let (status, body) = call(&app, Method::GET, "/api/patients/0123456789abcdef01234567", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "patient not found");
    }

    #[tokio::test]
    async fn delete_returns_no_content_and_cascades() {
        let app = router(AppState::default());
        let (_, patient) = call(&app, Method::POST, "/api/patients", Some(john())).await;
        let id = patient["_id"]["$oid"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::DELETE, &format!("/api/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/patients/{id}/tests"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_is_served_outside_api_prefix() {
        let app = router(AppState::default());
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }
}
