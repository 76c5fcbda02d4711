//! HTTP routes.
//!
//! Reads take their keys from the path and need no caller identity.
//! Mutations take the caller from the identity header and, for
//! attendance, the time from the server clock.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use rollcall_core::{DayIndex, Identity, MatricNumber, Timestamp};
use rollcall_ledger::{LedgerEvent, RosterEntry, StudentLookup, StudentRecord};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::identity::Caller;
use crate::state::AppState;

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status))
        .route("/v1/students", get(list_students).post(register_student))
        .route("/v1/students/{identity}", get(student_by_identity))
        .route("/v1/matric/{matric}", get(student_by_matric))
        .route("/v1/matric/{matric}/identity", get(resolve_matric))
        .route("/v1/attendance", post(mark_attendance))
        .route("/v1/attendance/{identity}", get(attendance_summary))
        .route("/v1/attendance/{identity}/{day}", get(attendance_on_day))
        .route("/v1/roster/{day}", get(roster))
        .route("/v1/system/toggle", post(toggle_system))
        .route("/v1/events", get(events))
        .with_state(state)
}

// ============================================================================
// Payloads
// ============================================================================

/// Body of `POST /v1/students`.
///
/// Absent fields decode as empty strings and are rejected by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Identity to register
    #[serde(default)]
    pub identity: String,
    /// Matric number to bind
    #[serde(default)]
    pub matric_number: String,
    /// Student name
    #[serde(default)]
    pub name: String,
}

/// Body of `GET /v1/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Ledger owner
    pub owner: Identity,
    /// Whether attendance marking is enabled
    pub active: bool,
    /// Number of registered students
    pub registration_count: u64,
    /// Server time
    pub now: Timestamp,
    /// Day bucket of `now`
    pub today: DayIndex,
}

/// Body of `GET /v1/students/{identity}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResponse {
    /// Identity looked up
    pub identity: Identity,
    /// The record, or the empty view when unregistered
    #[serde(flatten)]
    pub student: StudentRecord,
}

/// Body of `GET /v1/matric/{matric}/identity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// Matric number looked up
    pub matric_number: MatricNumber,
    /// Identity bound to it
    pub identity: Identity,
}

/// Body of `GET /v1/attendance/{identity}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Student identity
    pub identity: Identity,
    /// Number of days marked
    pub count: u64,
    /// Days marked, ascending
    pub days: Vec<DayIndex>,
}

/// Body of `GET /v1/attendance/{identity}/{day}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDay {
    /// Student identity
    pub identity: Identity,
    /// Day looked up
    pub day_index: DayIndex,
    /// When attendance was marked, 0 if not
    pub timestamp: Timestamp,
    /// Whether attendance was marked
    pub present: bool,
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let now = state.now();
    let response = state
        .read(|ledger| StatusResponse {
            owner: ledger.owner().clone(),
            active: ledger.is_active(),
            registration_count: ledger.registration_count(),
            now,
            today: now.day_index(),
        })
        .await;
    Json(response)
}

async fn list_students(State(state): State<Arc<AppState>>) -> Json<Vec<Identity>> {
    Json(state.read(|ledger| ledger.registered_identities().to_vec()).await)
}

async fn register_student(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<LedgerEvent>), ApiError> {
    let now = state.now();
    let event = state
        .mutate(|ledger| {
            ledger.register_student(
                &caller,
                Identity::new(body.identity.trim()),
                MatricNumber::new(body.matric_number.trim()),
                body.name.trim(),
                now,
            )
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn student_by_identity(
    State(state): State<Arc<AppState>>,
    ApiPath(identity): ApiPath<String>,
) -> Json<StudentResponse> {
    let identity = Identity::new(identity);
    let student = state
        .read(|ledger| ledger.student_by_identity(&identity))
        .await;
    Json(StudentResponse { identity, student })
}

async fn student_by_matric(
    State(state): State<Arc<AppState>>,
    ApiPath(matric): ApiPath<String>,
) -> Result<Json<StudentLookup>, ApiError> {
    let matric = MatricNumber::new(matric);
    let lookup = state
        .read(|ledger| ledger.student_by_matric(&matric))
        .await?;
    Ok(Json(lookup))
}

async fn resolve_matric(
    State(state): State<Arc<AppState>>,
    ApiPath(matric): ApiPath<String>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let matric_number = MatricNumber::new(matric);
    let identity = state
        .read(|ledger| ledger.resolve_identity_by_matric(&matric_number))
        .await?;
    Ok(Json(ResolveResponse {
        matric_number,
        identity,
    }))
}

async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<(StatusCode, Json<LedgerEvent>), ApiError> {
    let now = state.now();
    let event = state
        .mutate(|ledger| ledger.mark_attendance(&caller, now))
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn attendance_summary(
    State(state): State<Arc<AppState>>,
    ApiPath(identity): ApiPath<String>,
) -> Json<AttendanceSummary> {
    let identity = Identity::new(identity);
    let (count, days) = state
        .read(|ledger| {
            (
                ledger.attendance_count(&identity),
                ledger.attendance_history(&identity),
            )
        })
        .await;
    Json(AttendanceSummary {
        identity,
        count,
        days,
    })
}

async fn attendance_on_day(
    State(state): State<Arc<AppState>>,
    ApiPath((identity, day)): ApiPath<(String, u64)>,
) -> Json<AttendanceDay> {
    let identity = Identity::new(identity);
    let day_index = DayIndex::new(day);
    let status = state
        .read(|ledger| ledger.attendance_status(&identity, day_index))
        .await;
    Json(AttendanceDay {
        identity,
        day_index,
        timestamp: status.timestamp,
        present: status.present,
    })
}

async fn roster(
    State(state): State<Arc<AppState>>,
    ApiPath(day): ApiPath<u64>,
) -> Json<Vec<RosterEntry>> {
    Json(state.read(|ledger| ledger.roster(DayIndex::new(day))).await)
}

async fn toggle_system(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<LedgerEvent>, ApiError> {
    let event = state
        .mutate(|ledger| ledger.toggle_system_active(&caller))
        .await?;
    Ok(Json(event))
}

async fn events(State(state): State<Arc<AppState>>) -> Json<Vec<LedgerEvent>> {
    Json(state.read(|ledger| ledger.events().to_vec()).await)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::Request;
    use rollcall_core::{FixedClock, ONE_DAY_SECS};
    use rollcall_ledger::{AttendanceLedger, SnapshotStore};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const HEADER: &str = "x-rollcall-identity";
    const OWNER: &str = "0xowner";
    const ALICE: &str = "0xalice";
    const T0: u64 = 1_718_000_000;

    struct Harness {
        app: Router,
        clock: Arc<FixedClock>,
    }

    impl Harness {
        fn new(store: Option<SnapshotStore>) -> Self {
            Self::with_ledger(AttendanceLedger::new(Identity::new(OWNER)).unwrap(), store)
        }

        fn with_ledger(ledger: AttendanceLedger, store: Option<SnapshotStore>) -> Self {
            let clock = Arc::new(FixedClock::new(Timestamp::from_secs(T0)));
            let state = Arc::new(AppState::new(ledger, clock.clone(), store, HEADER));
            Self {
                app: router(state),
                clock,
            }
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let resp = self.app.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn post(&self, uri: &str, caller: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::post(uri);
            if let Some(caller) = caller {
                builder = builder.header(HEADER, caller);
            }
            let req = match body {
                Some(body) => builder
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.send(req).await
        }

        async fn post_raw(&self, uri: &str, caller: &str, body: &'static str) -> (StatusCode, Value) {
            let req = Request::post(uri)
                .header(HEADER, caller)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap();
            self.send(req).await
        }

        async fn register(&self, caller: &str, identity: &str, matric: &str, name: &str) -> (StatusCode, Value) {
            self.post(
                "/v1/students",
                Some(caller),
                Some(json!({ "identity": identity, "matric_number": matric, "name": name })),
            )
            .await
        }
    }

    #[tokio::test]
    async fn test_health_and_status() {
        let h = Harness::new(None);
        let (status, body) = h.get("/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = h.get("/v1/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], OWNER);
        assert_eq!(body["active"], true);
        assert_eq!(body["registration_count"], 0);
        assert_eq!(body["today"], T0 / ONE_DAY_SECS);
    }

    #[tokio::test]
    async fn test_register_and_read_back() {
        let h = Harness::new(None);
        let (status, body) = h.register(OWNER, ALICE, "CSC001", "Alice").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["event"], "user_registered");

        let (_, body) = h.get("/v1/students").await;
        assert_eq!(body, json!([ALICE]));

        let (_, body) = h.get("/v1/students/0xalice").await;
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["registered"], true);
        assert_eq!(body["registration_timestamp"], T0);

        let (status, body) = h.get("/v1/matric/CSC001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["identity"], ALICE);

        let (_, body) = h.get("/v1/matric/CSC001/identity").await;
        assert_eq!(body["identity"], ALICE);
    }

    #[tokio::test]
    async fn test_unknown_student_reads_empty() {
        let h = Harness::new(None);
        let (status, body) = h.get("/v1/students/0xnobody").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["registered"], false);
        assert_eq!(body["matric_number"], "");

        let (status, body) = h.get("/v1/matric/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["category"], "not_found");
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let h = Harness::new(None);
        let (status, body) = h.register(ALICE, ALICE, "CSC001", "Alice").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["category"], "unauthorized");

        let (status, _) = h.register(OWNER, ALICE, "", "Alice").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        h.register(OWNER, ALICE, "CSC001", "Alice").await;
        let (status, body) = h.register(OWNER, "0xbob", "CSC001", "Bob").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["category"], "already_exists");

        let (status, body) = h
            .post(
                "/v1/students",
                None,
                Some(json!({ "identity": "0xbob", "matric_number": "CSC002", "name": "Bob" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["category"], "authentication");
    }

    #[tokio::test]
    async fn test_register_missing_field_is_invalid_argument() {
        let h = Harness::new(None);
        let (status, body) = h
            .post(
                "/v1/students",
                Some(OWNER),
                Some(json!({ "identity": ALICE, "matric_number": "CSC001" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["category"], "invalid_argument");

        let (_, body) = h.get("/v1/status").await;
        assert_eq!(body["registration_count"], 0);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let h = Harness::new(None);
        let (status, body) = h.post_raw("/v1/students", OWNER, "{ not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["category"], "invalid_argument");

        let (status, body) = h.post_raw("/v1/students", OWNER, r#"{"name": 7}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["category"], "invalid_argument");
    }

    #[tokio::test]
    async fn test_bad_day_in_path_gets_json_error() {
        let h = Harness::new(None);
        for uri in ["/v1/roster/abc", "/v1/roster/-3", "/v1/attendance/0xalice/nope"] {
            let (status, body) = h.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["category"], "invalid_argument", "{uri}");
            assert!(
                body["error"]["message"]
                    .as_str()
                    .unwrap()
                    .starts_with("malformed path"),
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_attendance_flow() {
        let h = Harness::new(None);
        h.register(OWNER, ALICE, "CSC001", "Alice").await;

        let (status, body) = h.post("/v1/attendance", Some(ALICE), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["event"], "attendance_marked");
        assert_eq!(body["day_index"], T0 / ONE_DAY_SECS);

        h.clock.advance(3_600);
        let (status, body) = h.post("/v1/attendance", Some(ALICE), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["category"], "already_marked");

        let (status, body) = h.post("/v1/system/toggle", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], false);

        h.clock.advance(ONE_DAY_SECS);
        let (status, _) = h.post("/v1/attendance", Some(ALICE), None).await;
        assert_eq!(status, StatusCode::LOCKED);

        h.post("/v1/system/toggle", Some(OWNER), None).await;
        let (status, _) = h.post("/v1/attendance", Some(ALICE), None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = h.get("/v1/attendance/0xalice").await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["days"].as_array().unwrap().len(), 2);

        let day = T0 / ONE_DAY_SECS;
        let (_, body) = h.get(&format!("/v1/attendance/0xalice/{day}")).await;
        assert_eq!(body["present"], true);
        assert_eq!(body["timestamp"], T0);

        let (_, body) = h.get(&format!("/v1/roster/{day}")).await;
        assert_eq!(body[0]["identity"], ALICE);
        assert_eq!(body[0]["present"], true);

        let (_, body) = h.get("/v1/events").await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_mark_unregistered_and_missing_header() {
        let h = Harness::new(None);
        let (status, body) = h.post("/v1/attendance", Some("0xstranger"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["category"], "not_registered");

        let (status, _) = h.post("/v1/attendance", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_toggle_requires_owner() {
        let h = Harness::new(None);
        let (status, _) = h.post("/v1/system/toggle", Some(ALICE), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, body) = h.get("/v1/status").await;
        assert_eq!(body["active"], true);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        let h = Harness::new(Some(store.clone()));

        h.register(OWNER, ALICE, "CSC001", "Alice").await;
        h.post("/v1/attendance", Some(ALICE), None).await;

        let snapshot = store.load().unwrap().unwrap();
        assert_eq!(snapshot.registration_count, 1);
        assert_eq!(snapshot.attendance.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be makes the rename fail
        let blocked = dir.path().join("ledger.json");
        std::fs::create_dir(&blocked).unwrap();
        let h = Harness::new(Some(SnapshotStore::new(&blocked)));

        let (status, body) = h.register(OWNER, ALICE, "CSC001", "Alice").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["category"], "storage");

        let (_, body) = h.get("/v1/status").await;
        assert_eq!(body["registration_count"], 0);
        let (_, body) = h.get("/v1/events").await;
        assert_eq!(body, json!([]));
    }

    fn recording_ledger() -> (AttendanceLedger, Arc<Mutex<Vec<&'static str>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let mut ledger = AttendanceLedger::new(Identity::new(OWNER)).unwrap();
        ledger.subscribe(Arc::new(move |e: &LedgerEvent| {
            captured.lock().unwrap().push(e.name());
        }));
        (ledger, seen)
    }

    #[tokio::test]
    async fn test_sinks_never_see_a_rolled_back_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("ledger.json");
        std::fs::create_dir(&blocked).unwrap();
        let (ledger, seen) = recording_ledger();
        let h = Harness::with_ledger(ledger, Some(SnapshotStore::new(&blocked)));

        let (status, _) = h.register(OWNER, ALICE, "CSC001", "Alice").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = h.post("/v1/system/toggle", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sinks_see_persisted_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        let (ledger, seen) = recording_ledger();
        let h = Harness::with_ledger(ledger, Some(store));

        let (status, _) = h.register(OWNER, ALICE, "CSC001", "Alice").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = h.register(ALICE, "0xbob", "CSC002", "Bob").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(*seen.lock().unwrap(), vec!["user_registered"]);
    }
}
