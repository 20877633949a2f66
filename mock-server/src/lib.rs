//! In-memory mock of the ATOL fiscal-register web service.
//!
//! Models just enough device behavior for the client tests: the task
//! submit/poll contract, the shift state machine, and receipt bookkeeping
//! for `printLastReceiptCopy`. Tasks are processed synchronously on submit,
//! so a poll right after a 201 always finds the result — latency-sensitive
//! scenarios are covered by the client's fetch-strategy unit tests instead.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Mutable device state behind the web service.
#[derive(Debug)]
pub struct RegisterState {
    /// Current shift state: `opened`, `closed` or `expired`.
    pub shift: String,
    /// Processed tasks by id, each holding its result entry.
    pub tasks: HashMap<String, Value>,
    /// Last fiscal document, echoed by `printLastReceiptCopy`.
    pub last_receipt: Option<Value>,
    /// Monotonic fiscal document number.
    pub document_counter: u64,
}

impl RegisterState {
    pub fn with_shift(shift: &str) -> Self {
        Self {
            shift: shift.to_string(),
            tasks: HashMap::new(),
            last_receipt: None,
            document_counter: 0,
        }
    }
}

impl Default for RegisterState {
    fn default() -> Self {
        Self::with_shift("closed")
    }
}

pub type Db = Arc<RwLock<RegisterState>>;

#[derive(Deserialize)]
struct SubmitTask {
    uuid: String,
    request: Vec<Value>,
}

/// Router over a fresh register with a closed shift.
pub fn app() -> Router {
    app_with_state(Arc::new(RwLock::new(RegisterState::default())))
}

/// Router over caller-provided state, so tests can preset an expired shift
/// or inspect the register afterwards.
pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/requests/", post(submit_task))
        .route("/requests/{uuid}", get(get_task_result))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve over caller-provided state; used by integration tests that need a
/// preset shift state behind real HTTP.
pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

async fn ping() -> &'static str {
    "Atol Web Server"
}

async fn submit_task(
    State(db): State<Db>,
    Json(task): Json<SubmitTask>,
) -> Result<StatusCode, StatusCode> {
    let Some(command) = task.request.first() else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let mut state = db.write().await;
    if state.tasks.contains_key(&task.uuid) {
        return Err(StatusCode::CONFLICT);
    }
    let entry = process_command(&mut state, command);
    state.tasks.insert(task.uuid, entry);
    Ok(StatusCode::CREATED)
}

async fn get_task_result(
    State(db): State<Db>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let state = db.read().await;
    state
        .tasks
        .get(&uuid)
        .map(|entry| Json(json!({ "results": [entry] })))
        .ok_or(StatusCode::NOT_FOUND)
}

fn process_command(state: &mut RegisterState, command: &Value) -> Value {
    match command["type"].as_str() {
        Some("getShiftStatus") => ready(json!({ "shiftStatus": { "state": state.shift } })),
        Some("openShift") => {
            state.shift = "opened".to_string();
            ready(json!({ "shiftStatus": { "state": "opened" } }))
        }
        Some("closeShift") => {
            state.shift = "closed".to_string();
            ready(json!({ "shiftStatus": { "state": "closed" } }))
        }
        Some("printLastReceiptCopy") => {
            ready(state.last_receipt.clone().unwrap_or_else(|| json!({})))
        }
        Some("sell" | "buy" | "sellReturn" | "buyReturn") => {
            if state.shift != "opened" {
                return error("shift is not opened");
            }
            state.document_counter += 1;
            state.last_receipt = Some(command.clone());
            ready(json!({
                "total": command["total"],
                "fiscalDocumentNumber": state.document_counter,
            }))
        }
        _ => error("unknown command type"),
    }
}

fn ready(result: Value) -> Value {
    json!({ "status": "ready", "result": result })
}

fn error(description: &str) -> Value {
    json!({
        "status": "error",
        "result": { "error": { "description": description } },
    })
}
