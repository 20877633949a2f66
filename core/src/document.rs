//! Fiscal document builder: validation, derived totals, payment shaping.
//!
//! # Design
//! Input items arrive as loosely-typed drafts ([`ItemInput`]) because the
//! required-field check is part of the contract: the builder reports every
//! missing key per item instead of letting deserialization reject the whole
//! batch with a single opaque message. The builder is a pure function — no
//! I/O — so every business rule is testable without a transport.

use serde::Deserialize;

use crate::error::AtolError;
use crate::types::{
    ClientInfo, DocumentItem, DocumentType, FiscalDocument, Operator, Payment, Position, TextLine,
};

/// Caller-facing parameters for a sale/return document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    /// One of `sell`, `buy`, `sellReturn`, `buyReturn`.
    #[serde(rename = "type")]
    pub doc_type: String,
    pub items: Vec<ItemInput>,
    pub taxation_type: String,
    pub payment_type: String,
    #[serde(default)]
    pub payment_sum: f64,
    /// Email or phone for an electronic receipt.
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub electronic: bool,
    #[serde(default)]
    pub use_separator: bool,
}

/// A draft receipt line. Everything except `amount` is required; the builder
/// reports which keys are missing. `amount` absent or zero is derived as
/// `price × quantity`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub amount: Option<f64>,
    pub tax: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub payment_object: Option<String>,
    pub payment_method: Option<String>,
}

impl ItemInput {
    /// Required wire keys this draft is missing, in wire spelling.
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.price.is_none() {
            missing.push("price");
        }
        if self.quantity.is_none() {
            missing.push("quantity");
        }
        if self.tax.is_none() {
            missing.push("tax");
        }
        if self.kind.is_none() {
            missing.push("type");
        }
        if self.payment_object.is_none() {
            missing.push("paymentObject");
        }
        if self.payment_method.is_none() {
            missing.push("paymentMethod");
        }
        missing
    }
}

/// Validate a [`DocumentRequest`] and shape it into the wire document.
///
/// Returns the parsed transaction kind alongside the document so the caller
/// can wrap it in the matching command tag.
pub fn build_document(
    request: &DocumentRequest,
    operator: Option<&Operator>,
) -> Result<(DocumentType, FiscalDocument), AtolError> {
    let doc_type = DocumentType::parse(&request.doc_type).ok_or_else(|| {
        AtolError::Document(format!(
            "unknown document type '{}', expected one of sell, buy, sellReturn, buyReturn",
            request.doc_type
        ))
    })?;

    let problems: Vec<String> = request
        .items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let missing = item.missing_fields();
            if missing.is_empty() {
                None
            } else {
                Some(format!("item {index} is missing {}", missing.join(", ")))
            }
        })
        .collect();
    if !problems.is_empty() {
        return Err(AtolError::Document(problems.join("; ")));
    }

    let mut items = Vec::new();
    let mut total = 0.0;
    for item in &request.items {
        // missing_fields() ran above, so the required options are present
        let price = item.price.unwrap_or_default();
        let quantity = item.quantity.unwrap_or_default();
        let amount = match item.amount {
            Some(amount) if amount != 0.0 => amount,
            _ => price * quantity,
        };
        total += amount;
        items.push(DocumentItem::Position(Position {
            kind: item.kind.clone().unwrap_or_default(),
            price,
            quantity,
            amount,
            tax: item.tax.clone().unwrap_or_default(),
            payment_object: item.payment_object.clone().unwrap_or_default(),
            payment_method: item.payment_method.clone().unwrap_or_default(),
        }));
        // The separator follows every position, including the last one
        // before the totals block.
        if request.use_separator {
            items.push(DocumentItem::Text(TextLine::separator()));
        }
    }

    // The device rejects underpaid documents, so a short payment is raised
    // to the computed total.
    let payment_sum = if request.payment_sum < total {
        total
    } else {
        request.payment_sum
    };

    let document = FiscalDocument {
        taxation_type: request.taxation_type.clone(),
        electronic: request.electronic,
        operator: operator.cloned(),
        items,
        payments: vec![Payment {
            kind: request.payment_type.clone(),
            sum: payment_sum,
        }],
        total,
        client_info: request.client.clone().map(|contact| ClientInfo {
            email_or_phone: contact,
        }),
    };

    Ok((doc_type, document))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: f64, amount: f64) -> ItemInput {
        ItemInput {
            price: Some(price),
            quantity: Some(quantity),
            amount: Some(amount),
            tax: Some("vat0".to_string()),
            kind: Some("commodity".to_string()),
            payment_object: Some("commodity".to_string()),
            payment_method: Some("full_payment".to_string()),
        }
    }

    fn request(items: Vec<ItemInput>) -> DocumentRequest {
        DocumentRequest {
            doc_type: "sell".to_string(),
            items,
            taxation_type: "osn".to_string(),
            payment_type: "cash".to_string(),
            payment_sum: 0.0,
            client: None,
            electronic: false,
            use_separator: false,
        }
    }

    fn positions(document: &FiscalDocument) -> Vec<&Position> {
        document
            .items
            .iter()
            .filter_map(|i| match i {
                DocumentItem::Position(p) => Some(p),
                DocumentItem::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn zero_amount_is_derived_from_price_and_quantity() {
        let (_, doc) = build_document(&request(vec![item(100.0, 2.0, 0.0)]), None).unwrap();
        assert_eq!(positions(&doc)[0].amount, 200.0);
        assert_eq!(doc.total, 200.0);
        assert_eq!(doc.payments[0].sum, 200.0);
    }

    #[test]
    fn absent_amount_is_derived() {
        let mut draft = item(12.5, 4.0, 0.0);
        draft.amount = None;
        let (_, doc) = build_document(&request(vec![draft]), None).unwrap();
        assert_eq!(positions(&doc)[0].amount, 50.0);
    }

    #[test]
    fn explicit_amount_is_kept() {
        let (_, doc) = build_document(&request(vec![item(100.0, 2.0, 150.0)]), None).unwrap();
        assert_eq!(positions(&doc)[0].amount, 150.0);
        assert_eq!(doc.total, 150.0);
    }

    #[test]
    fn total_is_sum_of_item_amounts() {
        let (_, doc) = build_document(
            &request(vec![item(100.0, 2.0, 0.0), item(30.0, 1.0, 0.0)]),
            None,
        )
        .unwrap();
        assert_eq!(doc.total, 230.0);
    }

    #[test]
    fn short_payment_is_raised_to_total() {
        let mut req = request(vec![item(100.0, 2.0, 0.0)]);
        req.payment_sum = 50.0;
        let (_, doc) = build_document(&req, None).unwrap();
        assert_eq!(doc.payments[0].sum, 200.0);
    }

    #[test]
    fn overpayment_is_left_unchanged() {
        let mut req = request(vec![item(100.0, 2.0, 0.0)]);
        req.payment_sum = 500.0;
        let (_, doc) = build_document(&req, None).unwrap();
        assert_eq!(doc.payments[0].sum, 500.0);
        assert_eq!(doc.total, 200.0);
    }

    #[test]
    fn unknown_document_type_is_rejected() {
        let mut req = request(vec![item(100.0, 1.0, 0.0)]);
        req.doc_type = "refund".to_string();
        let err = build_document(&req, None).unwrap_err();
        assert!(matches!(err, AtolError::Document(_)));
        assert!(err.to_string().contains("refund"));
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let draft = ItemInput {
            price: Some(10.0),
            quantity: Some(1.0),
            ..ItemInput::default()
        };
        let err = build_document(&request(vec![draft]), None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("item 0"));
        assert!(msg.contains("tax"));
        assert!(msg.contains("type"));
        assert!(msg.contains("paymentObject"));
        assert!(msg.contains("paymentMethod"));
        assert!(!msg.contains("price,"));
    }

    #[test]
    fn separator_follows_every_position_including_the_last() {
        let mut req = request(vec![item(10.0, 1.0, 0.0), item(20.0, 1.0, 0.0)]);
        req.use_separator = true;
        let (_, doc) = build_document(&req, None).unwrap();
        assert_eq!(doc.items.len(), 4);
        assert!(matches!(doc.items[1], DocumentItem::Text(_)));
        assert!(matches!(doc.items[3], DocumentItem::Text(_)));
        // separators carry no amount and do not move the total
        assert_eq!(doc.total, 30.0);
    }

    #[test]
    fn operator_and_client_contact_are_attached() {
        let mut req = request(vec![item(10.0, 1.0, 0.0)]);
        req.client = Some("client@example.com".to_string());
        let operator = Operator {
            name: "Petrov".to_string(),
        };
        let (_, doc) = build_document(&req, Some(&operator)).unwrap();
        assert_eq!(doc.operator.as_ref().unwrap().name, "Petrov");
        assert_eq!(
            doc.client_info.as_ref().unwrap().email_or_phone,
            "client@example.com"
        );
    }

    #[test]
    fn sell_return_type_parses() {
        let mut req = request(vec![item(10.0, 1.0, 0.0)]);
        req.doc_type = "sellReturn".to_string();
        let (doc_type, _) = build_document(&req, None).unwrap();
        assert_eq!(doc_type, DocumentType::SellReturn);
    }
}
