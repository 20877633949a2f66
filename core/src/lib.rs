//! Synchronous client core for the ATOL fiscal-register web service.
//!
//! # Overview
//! Wraps the service's three HTTP operations — ping, submit task, poll task
//! result — behind domain verbs: query shift status, open/close the fiscal
//! shift, reprint the last receipt, and create a sale/return document.
//!
//! # Design
//! - `AtolClient` holds only the endpoint, an optional operator name, and
//!   two injected capabilities; all shift state lives on the device and is
//!   fetched fresh per call.
//! - Network I/O goes through the [`Transport`] trait; result-fetch timing
//!   through [`ResultFetcher`]. Tests inject scripted transports and a
//!   zero-delay fetcher, production hosts plug in a real HTTP agent.
//! - Each protocol operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary stays explicit.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod document;
pub mod error;
pub mod fetch;
pub mod http;
pub mod types;

pub use client::{AtolClient, ShiftOutcome};
pub use document::{DocumentRequest, ItemInput};
pub use error::AtolError;
pub use fetch::{FixedDelayFetcher, PollingFetcher, ResultFetcher};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use types::{Command, DocumentType, Operator, ShiftState, Task, TaskResultEntry};
