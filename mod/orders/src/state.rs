//! Order-state holder — the single read/write path for the order snapshot.
//!
//! The original app had an advisory client cache that two of three views
//! bypassed. Here the holder is mandatory: the engine funnels every
//! mutation through it, and anything interested in the live list (views,
//! long-polls, tests) subscribes to the watch channels instead of
//! re-fetching.

use tokio::sync::watch;

use crate::model::Order;

pub struct OrderStateHolder {
    orders: watch::Sender<Vec<Order>>,
    selected: watch::Sender<Option<Order>>,
}

impl Default for OrderStateHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStateHolder {
    pub fn new() -> Self {
        let (orders, _) = watch::channel(Vec::new());
        let (selected, _) = watch::channel(None);
        Self { orders, selected }
    }

    /// Current snapshot of the full order list.
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders.borrow().clone()
    }

    /// Currently selected order, if any.
    pub fn selected(&self) -> Option<Order> {
        self.selected.borrow().clone()
    }

    /// Subscribe to list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Order>> {
        self.orders.subscribe()
    }

    /// Subscribe to selection changes.
    pub fn subscribe_selected(&self) -> watch::Receiver<Option<Order>> {
        self.selected.subscribe()
    }

    /// Replace the whole snapshot (used after a full re-fetch from storage).
    pub fn set_orders(&self, orders: Vec<Order>) {
        self.orders.send_replace(orders);
    }

    /// Set or clear the selected order.
    pub fn set_selected(&self, order: Option<Order>) {
        self.selected.send_replace(order);
    }

    /// Append a newly created order to the snapshot.
    pub fn add_order(&self, order: Order) {
        self.orders.send_modify(|orders| orders.push(order));
    }

    /// Replace an order by id; mirrors the change into the selection when
    /// the selected order is the one that changed.
    pub fn update_order(&self, updated: &Order) {
        self.orders.send_modify(|orders| {
            if let Some(slot) = orders.iter_mut().find(|o| o.id == updated.id) {
                *slot = updated.clone();
            }
        });

        let mirror = self
            .selected
            .borrow()
            .as_ref()
            .is_some_and(|sel| sel.id == updated.id);
        if mirror {
            self.selected.send_replace(Some(updated.clone()));
        }
    }

    /// Drop an order from the snapshot; clears the selection if it was the
    /// removed order.
    pub fn remove_order(&self, order_id: &str) {
        self.orders.send_modify(|orders| orders.retain(|o| o.id != order_id));

        let clear = self
            .selected
            .borrow()
            .as_ref()
            .is_some_and(|sel| sel.id == order_id);
        if clear {
            self.selected.send_replace(None);
        }
    }
}
