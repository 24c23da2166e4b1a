use serde::{Deserialize, Serialize};

use comanda_core::{new_id, now_rfc3339, round_money};
use comanda_orders::model::{Order, OrderStatus};
use comanda_store::KvRecord;

// ---------------------------------------------------------------------------
// Preparation status
// ---------------------------------------------------------------------------

/// Per-item progress on the kitchen board, independent of the order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreparationStatus {
    Pending,
    InProgress,
    Ready,
    Served,
}

impl PreparationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Ready => "READY",
            Self::Served => "SERVED",
        }
    }
}

impl std::fmt::Display for PreparationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Kitchen order
// ---------------------------------------------------------------------------

/// Priority levels. Anything outside this range is rejected.
pub const PRIORITY_NORMAL: u8 = 1;
pub const PRIORITY_HIGH: u8 = 2;
pub const PRIORITY_URGENT: u8 = 3;

/// A line on the kitchen board, copied from an order item at intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrderItem {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub dish_id: String,
    pub dish_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: f64,

    pub preparation_status: PreparationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_notes: Option<String>,

    /// Estimated minutes for this line, when the cook sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_prep_time: Option<u32>,
}

/// A ticket on the kitchen board. Linked back to its source order through
/// `order_id`; re-sending the same order replaces the ticket wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrder {
    #[serde(default)]
    pub id: String,

    pub order_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    pub status: OrderStatus,

    #[serde(default)]
    pub items: Vec<KitchenOrderItem>,

    #[serde(default)]
    pub total_amount: f64,

    /// Estimated minutes for the whole ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,

    /// 1 normal, 2 high, 3 urgent.
    #[serde(default = "default_priority")]
    pub priority: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    /// Stamped on the first transition to PREPARING.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Stamped on the first transition to READY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<String>,
}

fn default_priority() -> u8 {
    PRIORITY_NORMAL
}

impl KitchenOrder {
    /// Build a ticket from a source order. Item progress starts at PENDING
    /// regardless of any earlier ticket for the same order.
    pub fn from_order(order: &Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| KitchenOrderItem {
                id: item.id.clone(),
                dish_id: item.dish_id.clone(),
                dish_name: item.dish_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
                preparation_status: PreparationStatus::Pending,
                preparation_notes: None,
                estimated_prep_time: None,
            })
            .collect();

        let mut ticket = Self {
            id: String::new(),
            order_id: order.id.clone(),
            table_number: order.table_number,
            customer_name: order.customer_name.clone(),
            status: order.status,
            items,
            total_amount: round_money(order.total_amount),
            estimated_time: None,
            priority: PRIORITY_NORMAL,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
            started_at: None,
            ready_at: None,
        };
        if ticket.status == OrderStatus::Preparing {
            ticket.started_at = Some(now_rfc3339());
        }
        ticket
    }

    /// All lines marked READY or SERVED.
    pub fn all_items_ready(&self) -> bool {
        !self.items.is_empty()
            && self.items.iter().all(|i| {
                matches!(
                    i.preparation_status,
                    PreparationStatus::Ready | PreparationStatus::Served
                )
            })
    }
}

impl KvRecord for KitchenOrder {
    const NAME: &'static str = "kitchen order";
    const PREFIX: &'static str = "kitchen:order:";

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

/// Body for `POST /kitchen/orders` — a ticket posted directly to the board,
/// e.g. a walk-in handed straight to the kitchen.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKitchenOrderRequest {
    pub order_id: String,
    #[serde(default)]
    pub table_number: Option<u32>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<CreateKitchenItemRequest>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKitchenItemRequest {
    #[serde(default)]
    pub dish_id: String,
    pub dish_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub preparation_notes: Option<String>,
}

/// Body for `PATCH /kitchen/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// Body for `PATCH /kitchen/orders/{id}/priority`.
#[derive(Debug, Deserialize)]
pub struct SetPriorityRequest {
    pub priority: u8,
}

/// Body for `PATCH /kitchen/orders/{id}/notes` and
/// `PATCH /kitchen/orders/{id}/items/{item_id}/notes`.
#[derive(Debug, Deserialize)]
pub struct SetNotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for `PATCH /kitchen/orders/{id}/estimated-time`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEstimatedTimeRequest {
    #[serde(default)]
    pub estimated_time: Option<u32>,
}

/// Body for `PATCH /kitchen/orders/{id}/items/{item_id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetItemStatusRequest {
    pub status: PreparationStatus,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_orders::model::OrderItem;

    fn preparing_order() -> Order {
        let mut order = Order {
            id: "o1".into(),
            table_number: Some(4),
            customer_name: Some("Ana".into()),
            customer_phone: None,
            delivery_address: None,
            status: OrderStatus::Preparing,
            items: vec![
                OrderItem::new("d1".into(), "Pizza".into(), 25.90, 2),
                OrderItem::new("d2".into(), "Burger".into(), 18.50, 1),
            ],
            total_amount: 0.0,
            delivery_fee: None,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
        order.recompute_total();
        order
    }

    #[test]
    fn from_order_copies_lines_and_resets_progress() {
        let order = preparing_order();
        let ticket = KitchenOrder::from_order(&order);

        assert_eq!(ticket.order_id, "o1");
        assert_eq!(ticket.table_number, Some(4));
        assert_eq!(ticket.status, OrderStatus::Preparing);
        assert_eq!(ticket.items.len(), 2);
        assert_eq!(ticket.total_amount, 70.30);
        assert_eq!(ticket.priority, PRIORITY_NORMAL);
        assert!(ticket.started_at.is_some());
        assert!(ticket.ready_at.is_none());
        assert!(ticket
            .items
            .iter()
            .all(|i| i.preparation_status == PreparationStatus::Pending));
    }

    #[test]
    fn all_items_ready_counts_served_lines() {
        let order = preparing_order();
        let mut ticket = KitchenOrder::from_order(&order);
        assert!(!ticket.all_items_ready());

        ticket.items[0].preparation_status = PreparationStatus::Ready;
        assert!(!ticket.all_items_ready());

        ticket.items[1].preparation_status = PreparationStatus::Served;
        assert!(ticket.all_items_ready());
    }

    #[test]
    fn empty_ticket_is_never_all_ready() {
        let mut order = preparing_order();
        order.items.clear();
        let ticket = KitchenOrder::from_order(&order);
        assert!(!ticket.all_items_ready());
    }

    #[test]
    fn preparation_status_wire_names() {
        let json = serde_json::to_string(&PreparationStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: PreparationStatus = serde_json::from_str("\"SERVED\"").unwrap();
        assert_eq!(back, PreparationStatus::Served);
    }
}
