//! Wire DTOs for the ATOL web-service protocol.
//!
//! # Design
//! These types mirror the device's JSON schema but are defined independently
//! of the mock-server crate; the integration tests catch schema drift. The
//! wire field named `uuid` is an opaque 8-character identifier, not an
//! RFC 4122 UUID, so it stays a plain `String`.

use serde::{Deserialize, Serialize};

/// Operator (cashier) attached to mutating commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
}

/// A unit of work submitted to `POST /requests/`.
///
/// The service expects `request` as an array; this client always submits
/// exactly one command per task.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Task {
    pub uuid: String,
    pub request: Vec<Command>,
}

impl Task {
    pub fn new(uuid: String, command: Command) -> Self {
        Self {
            uuid,
            request: vec![command],
        }
    }
}

/// A command understood by the device, tagged by its `type` field.
///
/// The four fiscal-document kinds carry the whole document inline: the tag
/// itself is the transaction type.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    GetShiftStatus,
    OpenShift {
        #[serde(skip_serializing_if = "Option::is_none")]
        operator: Option<Operator>,
    },
    CloseShift {
        #[serde(skip_serializing_if = "Option::is_none")]
        operator: Option<Operator>,
    },
    PrintLastReceiptCopy {
        #[serde(skip_serializing_if = "Option::is_none")]
        operator: Option<Operator>,
    },
    Sell(FiscalDocument),
    Buy(FiscalDocument),
    SellReturn(FiscalDocument),
    BuyReturn(FiscalDocument),
}

/// The four fiscal transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Sell,
    Buy,
    SellReturn,
    BuyReturn,
}

impl DocumentType {
    /// Parse the caller-facing type string. Anything outside the four kinds
    /// is rejected by the document builder.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sell" => Some(Self::Sell),
            "buy" => Some(Self::Buy),
            "sellReturn" => Some(Self::SellReturn),
            "buyReturn" => Some(Self::BuyReturn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sell => "sell",
            Self::Buy => "buy",
            Self::SellReturn => "sellReturn",
            Self::BuyReturn => "buyReturn",
        }
    }

    /// Wrap a finished document in the matching command.
    pub fn into_command(self, document: FiscalDocument) -> Command {
        match self {
            Self::Sell => Command::Sell(document),
            Self::Buy => Command::Buy(document),
            Self::SellReturn => Command::SellReturn(document),
            Self::BuyReturn => Command::BuyReturn(document),
        }
    }
}

/// A sale/return document ready for submission. The transaction kind lives
/// in the wrapping [`Command`] tag.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FiscalDocument {
    pub taxation_type: String,
    pub electronic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    pub items: Vec<DocumentItem>,
    pub payments: Vec<Payment>,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,
}

/// One line of a fiscal document: a validated position or a visual
/// separator printed between positions.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DocumentItem {
    Position(Position),
    Text(TextLine),
}

/// A priced receipt line. `amount` is always populated by the builder —
/// either the caller's value or `price × quantity`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub quantity: f64,
    pub amount: f64,
    pub tax: String,
    pub payment_object: String,
    pub payment_method: String,
}

/// A free-text line, used for the separator between positions.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TextLine {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TextLine {
    pub fn separator() -> Self {
        Self {
            kind: "text".to_string(),
            text: "--------".to_string(),
        }
    }
}

/// One payment leg of a fiscal document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Payment {
    #[serde(rename = "type")]
    pub kind: String,
    pub sum: f64,
}

/// Client contact attached to electronic receipts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientInfo {
    #[serde(rename = "emailOrPhone")]
    pub email_or_phone: String,
}

/// Response body of `GET /requests/{uuid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResults {
    pub results: Vec<TaskResultEntry>,
}

/// One processed entry of a task. `result` keeps the device's free-form
/// payload as raw JSON; commands interpret it themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultEntry {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Lifecycle state of the fiscal shift, always fetched fresh from the
/// device. `expired` means the 24-hour shift window ran out and the shift
/// must be closed before a new one can open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftState {
    Opened,
    Closed,
    Expired,
}

impl std::fmt::Display for ShiftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShiftState::Opened => "opened",
            ShiftState::Closed => "closed",
            ShiftState::Expired => "expired",
        };
        f.write_str(s)
    }
}
