//! Stub inference server for tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::v2::{MODEL_NAME, READY_PATH, infer_path};

/// Input names and datatypes, in order, that a schema-checking stub accepts.
const EXPECTED_INPUTS: [(&str, &str); 4] = [
    ("Platform", "BYTES"),
    ("Year", "INT64"),
    ("Genre", "BYTES"),
    ("Publisher", "BYTES"),
];

#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// 200 with `outputs[0].data[0] = value`, whatever the request holds.
    Predict(f64),
    /// Fixed status and text body. The readiness route answers with the same
    /// status.
    Reply { status: u16, body: String },
    /// 200 with `prediction` for a well-typed body, 400 otherwise.
    SchemaCheck { prediction: f64 },
    /// 200 with `prediction` for the first `served` requests. Later requests
    /// hang for [`STALL`], so a client with a shorter timeout never gets an
    /// answer.
    StallAfter { served: usize, prediction: f64 },
}

/// How long a [`StubBehavior::StallAfter`] stub sits on a request.
pub const STALL: Duration = Duration::from_secs(30);

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct StubState {
    behavior: Arc<StubBehavior>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// Serves the infer and readiness routes on an ephemeral localhost port until
/// dropped.
pub struct StubServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(behavior: StubBehavior) -> std::io::Result<Self> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            behavior: Arc::new(behavior),
            received: received.clone(),
        };

        let app = Router::new()
            .route(&infer_path(), post(infer))
            .route(READY_PATH, get(ready))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "stub inference server stopped");
            }
        });

        Ok(Self {
            addr,
            received,
            handle,
        })
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().await.clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn infer(State(state): State<StubState>, headers: HeaderMap, body: String) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let seen = {
        let mut received = state.received.lock().await;
        received.push(ReceivedRequest {
            content_type,
            body: body.clone(),
        });
        received.len()
    };

    match state.behavior.as_ref() {
        StubBehavior::Predict(value) => prediction(*value),
        StubBehavior::Reply { status, body } => {
            (reply_status(*status), body.clone()).into_response()
        }
        StubBehavior::SchemaCheck { prediction: value } => match check_schema(&body) {
            Ok(()) => prediction(*value),
            Err(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        },
        StubBehavior::StallAfter {
            served,
            prediction: value,
        } => {
            if seen > *served {
                tokio::time::sleep(STALL).await;
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
            prediction(*value)
        }
    }
}

async fn ready(State(state): State<StubState>) -> impl IntoResponse {
    let status = match state.behavior.as_ref() {
        StubBehavior::Reply { status, .. } => reply_status(*status),
        _ => StatusCode::OK,
    };
    let body = json!({ "ready": status.is_success() });
    (status, Json(body))
}

fn reply_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn prediction(value: f64) -> Response {
    let body = json!({
        "model_name": MODEL_NAME,
        "outputs": [
            {"name": "predict", "shape": [1], "datatype": "FP64", "data": [value]}
        ]
    });
    (StatusCode::OK, Json(body)).into_response()
}

#[derive(Deserialize)]
struct ReceivedBody {
    inputs: Vec<ReceivedInput>,
}

#[derive(Deserialize)]
struct ReceivedInput {
    name: String,
    shape: Vec<i64>,
    datatype: String,
    data: Vec<serde_json::Value>,
}

/// Checks a request body the way the real server's input validation does.
fn check_schema(body: &str) -> Result<(), String> {
    let parsed: ReceivedBody =
        serde_json::from_str(body).map_err(|e| format!("invalid request body: {}", e))?;

    if parsed.inputs.len() != EXPECTED_INPUTS.len() {
        return Err(format!(
            "expected {} inputs, got {}",
            EXPECTED_INPUTS.len(),
            parsed.inputs.len()
        ));
    }

    for (input, (name, datatype)) in parsed.inputs.iter().zip(EXPECTED_INPUTS) {
        if input.name != name {
            return Err(format!("expected input '{}', got '{}'", name, input.name));
        }
        if input.datatype != datatype {
            return Err(format!(
                "{}: expected datatype {}, got {}",
                name, datatype, input.datatype
            ));
        }
        if input.shape != [1] || input.data.len() != 1 {
            return Err(format!("{}: expected exactly one element", name));
        }
        let matches = match datatype {
            "INT64" => input.data[0].is_i64(),
            _ => input.data[0].is_string(),
        };
        if !matches {
            return Err(format!("{}: data does not match datatype {}", name, datatype));
        }
    }

    Ok(())
}
