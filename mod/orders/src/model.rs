use serde::{Deserialize, Serialize};

use comanda_core::{new_id, now_rfc3339, round_money};
use comanda_store::KvRecord;

/// Delivery fee applied when an order carries a delivery address and the
/// client did not set one explicitly.
pub const DEFAULT_DELIVERY_FEE: f64 = 5.00;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an order.
///
/// ```text
/// NEW → PREPARING → READY → DELIVERED → PAID
///                        └──────────────↗
/// CANCELLED reachable from any non-terminal state.
/// ```
///
/// The transition table lives here and nowhere else — every module and
/// every endpoint validates against the same mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Delivered,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::New,
        Self::Preparing,
        Self::Ready,
        Self::Delivered,
        Self::Paid,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "PREPARING" => Some(Self::Preparing),
            "READY" => Some(Self::Ready),
            "DELIVERED" => Some(Self::Delivered),
            "PAID" => Some(Self::Paid),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Human-readable label, shared by every surface.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New order",
            Self::Preparing => "Preparing",
            Self::Ready => "Ready",
            Self::Delivered => "Delivered",
            Self::Paid => "Paid",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether the order has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// An order still moving through the workflow.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Transition legality. Cancellation is allowed from any non-terminal
    /// state; everything else follows the forward chain.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if next == Self::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::New, Self::Preparing)
                | (Self::Preparing, Self::Ready)
                | (Self::Ready, Self::Delivered)
                | (Self::Ready, Self::Paid)
                | (Self::Delivered, Self::Paid)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Order + OrderItem
// ---------------------------------------------------------------------------

/// A line entry binding a dish to a quantity within one order.
///
/// `dish_name` and `unit_price` are copied from the dish at add time and
/// never re-synced — a later dish price change does not reprice open orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub dish_id: String,
    pub dish_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

impl OrderItem {
    pub fn new(dish_id: String, dish_name: String, unit_price: f64, quantity: u32) -> Self {
        let mut item = Self {
            id: new_id(),
            dish_id,
            dish_name,
            quantity,
            unit_price,
            total_price: 0.0,
        };
        item.recompute_total();
        item
    }

    pub fn recompute_total(&mut self) {
        self.total_price = round_money(self.quantity as f64 * self.unit_price);
    }
}

/// A customer's tab, tracked from creation through payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,

    pub status: OrderStatus,

    #[serde(default)]
    pub items: Vec<OrderItem>,

    /// Derived: Σ item totals, plus delivery fee when set. Maintained by
    /// the engine on every item mutation.
    #[serde(default)]
    pub total_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Order {
    /// Recompute the derived total from the items.
    pub fn recompute_total(&mut self) {
        let subtotal: f64 = self.items.iter().map(|i| i.total_price).sum();
        self.total_amount = round_money(subtotal + self.delivery_fee.unwrap_or(0.0));
    }
}

impl KvRecord for Order {
    const NAME: &'static str = "order";
    const PREFIX: &'static str = "orders:order:";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn before_create(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        let now = now_rfc3339();
        if self.created_at.is_empty() {
            self.created_at = now.clone();
        }
        self.updated_at = now;
    }

    fn before_update(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

// ---------------------------------------------------------------------------
// API request bodies
// ---------------------------------------------------------------------------

/// Body for `POST /orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub table_number: Option<u32>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_fee: Option<f64>,
}

/// Body for `POST /orders/{id}/items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub dish_id: String,
    pub quantity: u32,
}

/// Body for `PATCH /orders/{id}/items/{item_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Body for `PATCH /orders/{id}/status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
