//! Blocking client for the ATOL fiscal-register web service.
//!
//! # Design
//! `AtolClient` holds the immutable endpoint configuration plus two injected
//! capabilities: a [`Transport`] that executes HTTP requests and a
//! [`ResultFetcher`] that decides how long to wait for a task result. Each
//! protocol operation is split into a `build_*` method that produces an
//! [`HttpRequest`] and a `parse_*` method that consumes an [`HttpResponse`];
//! the public domain verbs compose them through the injected capabilities.
//!
//! Everything is synchronous and single-threaded: the register behind the
//! web service processes one task at a time, so each call performs one or
//! two blocking round-trips plus the fetcher's wait.

use std::fmt;
use std::time::Instant;

use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, warn};

use crate::document::{build_document, DocumentRequest};
use crate::error::AtolError;
use crate::fetch::{FixedDelayFetcher, ResultFetcher};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{Command, Operator, ShiftState, Task, TaskResultEntry, TaskResults};

/// Length of the random task identifier. The wire calls it `uuid` but the
/// service only needs per-request uniqueness, not RFC 4122.
pub const TASK_ID_LEN: usize = 8;

/// Outcome of a shift transition request.
#[derive(Debug, Clone)]
pub enum ShiftOutcome {
    /// The shift was already in the requested state; nothing was submitted.
    NoOp(ShiftState),

    /// An expired shift was force-closed before opening a new one. Carries
    /// the result of the subsequent `openShift`.
    ForceClosed(TaskResultEntry),

    /// The transition command was submitted; carries the device result.
    Completed(TaskResultEntry),
}

impl fmt::Display for ShiftOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftOutcome::NoOp(state) => {
                write!(f, "shift is already {state}, nothing to do")
            }
            ShiftOutcome::ForceClosed(_) => {
                write!(f, "expired shift was force-closed before opening a new one")
            }
            ShiftOutcome::Completed(_) => write!(f, "shift command completed"),
        }
    }
}

/// Client for one register's web service endpoint.
pub struct AtolClient {
    base_url: String,
    operator: Option<Operator>,
    transport: Box<dyn Transport>,
    fetcher: Box<dyn ResultFetcher>,
}

impl fmt::Debug for AtolClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtolClient")
            .field("base_url", &self.base_url)
            .field("operator", &self.operator)
            .finish_non_exhaustive()
    }
}

impl AtolClient {
    /// Connect to the web server at `http://{host}:{port}` and verify it
    /// answers the health check. Fails with [`AtolError::Init`] otherwise.
    pub fn connect(
        host: &str,
        port: u16,
        operator: Option<&str>,
        transport: Box<dyn Transport>,
        fetcher: Box<dyn ResultFetcher>,
    ) -> Result<Self, AtolError> {
        let client = Self {
            base_url: format!("http://{host}:{port}"),
            operator: operator.map(|name| Operator {
                name: name.to_string(),
            }),
            transport,
            fetcher,
        };
        if !client.ping() {
            return Err(AtolError::Init(format!(
                "no response from '{}/'",
                client.base_url
            )));
        }
        Ok(client)
    }

    /// [`connect`](Self::connect) with the default 5-second blind-wait
    /// fetch strategy.
    pub fn with_defaults(
        host: &str,
        port: u16,
        operator: Option<&str>,
        transport: Box<dyn Transport>,
    ) -> Result<Self, AtolError> {
        Self::connect(
            host,
            port,
            operator,
            transport,
            Box::new(FixedDelayFetcher::default()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_ref().map(|o| o.name.as_str())
    }

    // --- request building / response parsing ---

    pub fn build_ping(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_submit(&self, task: &Task) -> Result<HttpRequest, AtolError> {
        let body =
            serde_json::to_string(task).map_err(|e| AtolError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/requests/", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn parse_submit(&self, response: HttpResponse) -> Result<(), AtolError> {
        if response.status == 201 {
            return Ok(());
        }
        Err(AtolError::Request {
            status: response.status,
            body: response.body,
        })
    }

    pub fn build_fetch_result(&self, uuid: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/requests/{uuid}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Extract the first result entry of a poll response. An empty `results`
    /// array means the device had not finished within the fetch strategy's
    /// patience; that surfaces as an error rather than a silent retry.
    pub fn parse_fetch_result(&self, response: HttpResponse) -> Result<TaskResultEntry, AtolError> {
        if response.status != 200 {
            return Err(AtolError::Request {
                status: response.status,
                body: response.body,
            });
        }
        let results: TaskResults = serde_json::from_str(&response.body)
            .map_err(|e| AtolError::Deserialization(e.to_string()))?;
        results
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AtolError::Deserialization("no result entries for task".to_string()))
    }

    // --- domain operations ---

    /// Health-check the web server. True iff `GET /` answers 200; any
    /// transport failure (timeout, refused connection) is false.
    pub fn ping(&self) -> bool {
        match self.transport.execute(&self.build_ping()) {
            Ok(response) => response.status == 200,
            Err(err) => {
                debug!(error = %err, "ping failed");
                false
            }
        }
    }

    /// Submit a single command as a fresh task and fetch its result.
    ///
    /// The task id is generated per call; tasks are submitted once and never
    /// retried. Expects 201 on submit, then delegates the result fetch to
    /// the configured [`ResultFetcher`].
    pub fn submit_task(&self, command: Command) -> Result<TaskResultEntry, AtolError> {
        let uuid = generate_task_id();
        let task = Task::new(uuid.clone(), command);
        let request = self.build_submit(&task)?;

        let started = Instant::now();
        let response = self.transport.execute(&request)?;
        self.parse_submit(response)?;
        debug!(task = %uuid, "task accepted");

        let fetch = self.build_fetch_result(&uuid);
        let response = self.fetcher.fetch(self.transport.as_ref(), &fetch)?;
        let entry = self.parse_fetch_result(response)?;
        debug!(
            task = %uuid,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "task result fetched"
        );
        Ok(entry)
    }

    /// Ask the device for the current shift state. Never cached.
    pub fn get_shift_status(&self) -> Result<ShiftState, AtolError> {
        let entry = self.submit_task(Command::GetShiftStatus)?;
        let state = entry
            .result
            .get("shiftStatus")
            .and_then(|s| s.get("state"))
            .cloned()
            .ok_or_else(|| {
                AtolError::Deserialization("missing result.shiftStatus.state".to_string())
            })?;
        serde_json::from_value(state).map_err(|e| AtolError::Deserialization(e.to_string()))
    }

    /// Open the fiscal shift.
    ///
    /// Already opened is a no-op. An expired shift is force-closed first,
    /// then reopened.
    pub fn open_shift(&self) -> Result<ShiftOutcome, AtolError> {
        match self.get_shift_status()? {
            ShiftState::Opened => {
                debug!("shift already opened");
                Ok(ShiftOutcome::NoOp(ShiftState::Opened))
            }
            ShiftState::Expired => {
                warn!("shift expired, force-closing before reopening");
                self.submit_task(Command::CloseShift {
                    operator: self.operator.clone(),
                })?;
                let entry = self.submit_task(Command::OpenShift {
                    operator: self.operator.clone(),
                })?;
                Ok(ShiftOutcome::ForceClosed(entry))
            }
            ShiftState::Closed => {
                let entry = self.submit_task(Command::OpenShift {
                    operator: self.operator.clone(),
                })?;
                Ok(ShiftOutcome::Completed(entry))
            }
        }
    }

    /// Close the fiscal shift. Already closed is a no-op.
    pub fn close_shift(&self) -> Result<ShiftOutcome, AtolError> {
        if self.get_shift_status()? == ShiftState::Closed {
            debug!("shift already closed");
            return Ok(ShiftOutcome::NoOp(ShiftState::Closed));
        }
        let entry = self.submit_task(Command::CloseShift {
            operator: self.operator.clone(),
        })?;
        Ok(ShiftOutcome::Completed(entry))
    }

    /// Reprint the last receipt, unconditionally.
    pub fn print_previous(&self) -> Result<TaskResultEntry, AtolError> {
        self.submit_task(Command::PrintLastReceiptCopy {
            operator: self.operator.clone(),
        })
    }

    /// Validate, shape and submit a sale/return document.
    pub fn new_fiscal_document(
        &self,
        request: &DocumentRequest,
    ) -> Result<TaskResultEntry, AtolError> {
        let (doc_type, document) = build_document(request, self.operator.as_ref())?;
        debug!(
            doc_type = doc_type.as_str(),
            total = document.total,
            "submitting fiscal document"
        );
        self.submit_task(doc_type.into_command(document))
    }
}

/// Fresh random alphanumeric task id. Uniqueness per request is all the
/// service needs; nothing here is cryptographic.
fn generate_task_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TASK_ID_LEN)
        .map(char::from)
        .collect()
}
