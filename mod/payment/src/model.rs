use serde::{Deserialize, Serialize};

use comanda_core::{new_id, now_rfc3339};
use comanda_store::KvRecord;

// ---------------------------------------------------------------------------
// Method and status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::CreditCard => "CREDIT_CARD",
            Self::DebitCard => "DEBIT_CARD",
            Self::Pix => "PIX",
            Self::BankTransfer => "BANK_TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(Self::Cash),
            "CREDIT_CARD" => Some(Self::CreditCard),
            "DEBIT_CARD" => Some(Self::DebitCard),
            "PIX" => Some(Self::Pix),
            "BANK_TRANSFER" => Some(Self::BankTransfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payment record
// ---------------------------------------------------------------------------

/// A payment against an order. One order may accumulate several records
/// (e.g. a failed card attempt followed by cash).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub id: String,

    pub order_id: String,

    /// Amount due; rounded to cents on creation.
    pub amount: f64,

    pub method: PaymentMethod,
    pub status: PaymentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last_four: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_received: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,

    #[serde(default)]
    pub created_at: String,
    /// Stamped on the first transition to COMPLETED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
}

impl KvRecord for Payment {
    const NAME: &'static str = "payment";
    const PREFIX: &'static str = "payment:payment:";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn before_create(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        if self.created_at.is_empty() {
            self.created_at = now_rfc3339();
        }
    }
}

// ---------------------------------------------------------------------------
// API request bodies
// ---------------------------------------------------------------------------

/// Body for `POST /payments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for `POST /payments/{id}/@cash`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashPaymentRequest {
    pub cash_received: f64,
    #[serde(default)]
    pub processed_by: Option<String>,
}

/// Body for `POST /payments/{id}/@card`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPaymentRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub card_last_four: Option<String>,
    #[serde(default)]
    pub processed_by: Option<String>,
}

/// Body for `POST /payments/{id}/@pix`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub processed_by: Option<String>,
}

/// Body for `PATCH /payments/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: PaymentStatus,
}

/// Body for `PATCH /payments/{id}/notes`.
#[derive(Debug, Deserialize)]
pub struct SetNotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query for `GET /payments/@revenue` — optional RFC 3339 bounds applied to
/// the completion timestamp.
#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Response for `GET /payments/@revenue`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub total: f64,
    pub completed_count: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_and_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"CREDIT_CARD\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert_eq!(PaymentMethod::from_str("PIX"), Some(PaymentMethod::Pix));
        assert_eq!(PaymentMethod::from_str("pix"), None);
        assert_eq!(
            PaymentStatus::from_str("REFUNDED"),
            Some(PaymentStatus::Refunded)
        );
    }

    #[test]
    fn payment_json_skips_absent_fields() {
        let payment = Payment {
            id: "p1".into(),
            order_id: "o1".into(),
            amount: 51.80,
            method: PaymentMethod::Cash,
            status: PaymentStatus::Pending,
            transaction_id: None,
            card_last_four: None,
            cash_received: None,
            change_amount: None,
            notes: None,
            processed_by: None,
            created_at: "2026-01-01T00:00:00Z".into(),
            processed_at: None,
        };
        let json = serde_json::to_string(&payment).unwrap();
        assert!(json.contains("\"orderId\""));
        assert!(!json.contains("transactionId"));
        assert!(!json.contains("processedAt"));
    }
}
