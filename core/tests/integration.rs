//! Full shift/document lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP using a ureq-backed [`Transport`]. Validates
//! that request building, the task submit/poll contract, and response
//! parsing work end-to-end with the actual server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use atol_core::{
    AtolClient, AtolError, DocumentRequest, FixedDelayFetcher, HttpMethod, HttpRequest,
    HttpResponse, ItemInput, PollingFetcher, ShiftOutcome, ShiftState, Transport, TransportError,
};
use mock_server::{Db, RegisterState};
use tokio::sync::RwLock;

/// Execute `HttpRequest`s with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the client
/// handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (request.method, &request.body) {
            (HttpMethod::Get, _) => self.agent.get(&request.path).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&request.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&request.path).send_empty(),
        };
        let mut response = result.map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Start the mock server over `state` on a random port.
fn start_server(state: RegisterState) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db: Db = Arc::new(RwLock::new(state));
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_state(listener, db).await
        })
        .unwrap();
    });
    addr
}

fn sell_request() -> DocumentRequest {
    DocumentRequest {
        doc_type: "sell".to_string(),
        items: vec![ItemInput {
            price: Some(100.0),
            quantity: Some(2.0),
            amount: Some(0.0),
            tax: Some("vat0".to_string()),
            kind: Some("commodity".to_string()),
            payment_object: Some("commodity".to_string()),
            payment_method: Some("full_payment".to_string()),
        }],
        taxation_type: "osn".to_string(),
        payment_type: "cash".to_string(),
        payment_sum: 0.0,
        client: Some("client@example.com".to_string()),
        electronic: true,
        use_separator: true,
    }
}

#[test]
fn shift_and_document_lifecycle() {
    // Step 1: start the mock server with a fresh closed shift.
    let addr = start_server(RegisterState::default());
    let client = AtolClient::connect(
        "127.0.0.1",
        addr.port(),
        Some("Ivanova"),
        Box::new(UreqTransport::new()),
        Box::new(FixedDelayFetcher::new(Duration::ZERO)),
    )
    .unwrap();

    // Step 2: fresh register reports a closed shift.
    assert_eq!(client.get_shift_status().unwrap(), ShiftState::Closed);

    // Step 3: closing a closed shift is a no-op without submission.
    let outcome = client.close_shift().unwrap();
    assert!(matches!(outcome, ShiftOutcome::NoOp(ShiftState::Closed)));

    // Step 4: open the shift.
    let outcome = client.open_shift().unwrap();
    assert!(matches!(outcome, ShiftOutcome::Completed(_)));
    assert_eq!(client.get_shift_status().unwrap(), ShiftState::Opened);

    // Step 5: opening again is a no-op.
    let outcome = client.open_shift().unwrap();
    assert!(matches!(outcome, ShiftOutcome::NoOp(ShiftState::Opened)));

    // Step 6: submit a sale; derived amount 200, payment raised to total.
    let entry = client.new_fiscal_document(&sell_request()).unwrap();
    assert_eq!(entry.status.as_deref(), Some("ready"));
    assert_eq!(entry.result["fiscalDocumentNumber"], 1);
    assert_eq!(entry.result["total"], 200.0);

    // Step 7: reprint the receipt; the mock echoes the submitted document.
    let entry = client.print_previous().unwrap();
    assert_eq!(entry.result["type"], "sell");
    assert_eq!(entry.result["total"], 200.0);
    assert_eq!(entry.result["payments"][0]["sum"], 200.0);
    assert_eq!(entry.result["operator"]["name"], "Ivanova");
    assert_eq!(entry.result["clientInfo"]["emailOrPhone"], "client@example.com");
    // one position plus its trailing separator line
    assert_eq!(entry.result["items"].as_array().unwrap().len(), 2);
    assert_eq!(entry.result["items"][1]["type"], "text");

    // Step 8: close the shift.
    let outcome = client.close_shift().unwrap();
    assert!(matches!(outcome, ShiftOutcome::Completed(_)));
    assert_eq!(client.get_shift_status().unwrap(), ShiftState::Closed);
}

#[test]
fn expired_shift_is_force_closed_on_open() {
    let addr = start_server(RegisterState::with_shift("expired"));
    let client = AtolClient::connect(
        "127.0.0.1",
        addr.port(),
        None,
        Box::new(UreqTransport::new()),
        Box::new(PollingFetcher::new(Duration::from_millis(10), 5)),
    )
    .unwrap();

    assert_eq!(client.get_shift_status().unwrap(), ShiftState::Expired);

    let outcome = client.open_shift().unwrap();
    assert!(matches!(outcome, ShiftOutcome::ForceClosed(_)));
    assert_eq!(
        outcome.to_string(),
        "expired shift was force-closed before opening a new one"
    );
    assert_eq!(client.get_shift_status().unwrap(), ShiftState::Opened);
}

#[test]
fn sale_with_closed_shift_is_rejected_by_device() {
    let addr = start_server(RegisterState::default());
    let client = AtolClient::connect(
        "127.0.0.1",
        addr.port(),
        None,
        Box::new(UreqTransport::new()),
        Box::new(FixedDelayFetcher::new(Duration::ZERO)),
    )
    .unwrap();

    let entry = client.new_fiscal_document(&sell_request()).unwrap();
    assert_eq!(entry.status.as_deref(), Some("error"));
}

#[test]
fn connect_fails_without_server() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = AtolClient::connect(
        "127.0.0.1",
        port,
        None,
        Box::new(UreqTransport::new()),
        Box::new(FixedDelayFetcher::new(Duration::ZERO)),
    )
    .unwrap_err();
    assert!(matches!(err, AtolError::Init(_)));
}
