//! View derivations over the order collection.
//!
//! The original front end recomputed these per view, three times over.
//! Here they are defined once: each surface filters the full list on a
//! fixed status set, sorts by descending creation time, and derives its
//! counters from scratch on every refresh.

use serde::Serialize;

use comanda_core::round_money;

use crate::model::{Order, OrderStatus};

/// Statuses visible on the kitchen dashboard.
pub const KITCHEN_VIEW: &[OrderStatus] = &[
    OrderStatus::New,
    OrderStatus::Preparing,
    OrderStatus::Ready,
];

/// Statuses visible on the payment screen.
pub const PAYMENT_VIEW: &[OrderStatus] = &[
    OrderStatus::Ready,
    OrderStatus::Delivered,
    OrderStatus::Paid,
];

/// Filter orders to a status set and sort by descending creation time.
///
/// Idempotent: filtering an already-filtered list by the same set yields
/// the same result.
pub fn filter_view(orders: &[Order], statuses: &[OrderStatus]) -> Vec<Order> {
    let mut filtered: Vec<Order> = orders
        .iter()
        .filter(|o| statuses.contains(&o.status))
        .cloned()
        .collect();
    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    filtered
}

/// Aggregate counters over the full order list.
///
/// Recomputed from scratch on every refresh — no incremental maintenance,
/// so staleness never exceeds one request round-trip.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub new: usize,
    pub preparing: usize,
    pub ready: usize,
    pub delivered: usize,
    pub paid: usize,
    pub cancelled: usize,
    /// Σ total_amount over PAID orders.
    pub revenue: f64,
}

pub fn stats(orders: &[Order]) -> OrderStats {
    let mut s = OrderStats::default();
    for order in orders {
        match order.status {
            OrderStatus::New => s.new += 1,
            OrderStatus::Preparing => s.preparing += 1,
            OrderStatus::Ready => s.ready += 1,
            OrderStatus::Delivered => s.delivered += 1,
            OrderStatus::Paid => {
                s.paid += 1;
                s.revenue += order.total_amount;
            }
            OrderStatus::Cancelled => s.cancelled += 1,
        }
    }
    s.revenue = round_money(s.revenue);
    s
}
