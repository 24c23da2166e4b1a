use std::sync::{Arc, RwLock};

use tracing::info;

use comanda_catalog::model::Dish;
use comanda_core::{merge_patch, ServiceError};
use comanda_store::KvOps;

use crate::model::{
    CreateOrderRequest, Order, OrderItem, OrderStatus, DEFAULT_DELIVERY_FEE,
};
use crate::state::OrderStateHolder;
use crate::workflow::{self, OrderStats};

// ---------------------------------------------------------------------------
// Trigger — notification mechanism for downstream modules
// ---------------------------------------------------------------------------

/// Callback fired when an order transitions into PREPARING, so the kitchen
/// module can take it in. Implementations must be non-blocking and must not
/// fail the primary operation; the binary wires this up.
pub type KitchenTrigger = Arc<dyn Fn(&Order) + Send + Sync>;

// ---------------------------------------------------------------------------
// OrderEngine — order store + workflow state machine
// ---------------------------------------------------------------------------

/// The order engine.
///
/// Authoritative holder of the order collection. It:
/// - Persists orders through the injected KV backend.
/// - Validates every status transition against the shared table
///   (the store-level "set any status from any status" hole is closed here).
/// - Recomputes order totals on every item mutation.
/// - Funnels every change through the [`OrderStateHolder`] so subscribers
///   always see the current snapshot.
pub struct OrderEngine {
    orders: KvOps<Order>,
    dishes: Arc<KvOps<Dish>>,
    holder: Arc<OrderStateHolder>,
    kitchen_trigger: RwLock<Option<KitchenTrigger>>,
}

impl OrderEngine {
    /// Create the engine and prime the state holder from storage.
    pub fn new(
        kv: Arc<dyn comanda_kv::KVStore>,
        dishes: Arc<KvOps<Dish>>,
    ) -> Result<Self, ServiceError> {
        let engine = Self {
            orders: KvOps::new(kv),
            dishes,
            holder: Arc::new(OrderStateHolder::new()),
            kitchen_trigger: RwLock::new(None),
        };
        engine.holder.set_orders(engine.orders.list()?);
        Ok(engine)
    }

    /// The shared snapshot holder.
    pub fn holder(&self) -> &Arc<OrderStateHolder> {
        &self.holder
    }

    /// Register the kitchen intake callback.
    pub fn set_kitchen_trigger(&self, trigger: KitchenTrigger) {
        *self.kitchen_trigger.write().unwrap() = Some(trigger);
    }

    fn fire_kitchen_trigger(&self, order: &Order) {
        let guard = self.kitchen_trigger.read().unwrap();
        if let Some(trigger) = guard.as_ref() {
            trigger(order);
        }
    }

    // =======================================================================
    // Queries
    // =======================================================================

    pub fn list(&self) -> Result<Vec<Order>, ServiceError> {
        self.orders.list()
    }

    pub fn get(&self, id: &str) -> Result<Order, ServiceError> {
        self.orders.get_or_err(id)
    }

    /// Filtered, newest-first view over the current snapshot.
    pub fn view(&self, statuses: &[OrderStatus]) -> Vec<Order> {
        workflow::filter_view(&self.holder.snapshot(), statuses)
    }

    /// Per-status counts and PAID revenue over the current snapshot.
    pub fn stats(&self) -> OrderStats {
        workflow::stats(&self.holder.snapshot())
    }

    // =======================================================================
    // Order lifecycle
    // =======================================================================

    /// Create an order: empty items, status NEW, total 0.
    pub fn create(&self, req: CreateOrderRequest) -> Result<Order, ServiceError> {
        // Delivery orders default to the standard fee.
        let delivery_fee = match (&req.delivery_address, req.delivery_fee) {
            (_, Some(fee)) if fee >= 0.0 => Some(fee),
            (_, Some(_)) => {
                return Err(ServiceError::Validation(
                    "delivery fee must be non-negative".into(),
                ))
            }
            (Some(_), None) => Some(DEFAULT_DELIVERY_FEE),
            (None, None) => None,
        };

        let mut order = Order {
            id: String::new(),
            table_number: req.table_number,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            delivery_address: req.delivery_address,
            status: OrderStatus::New,
            items: Vec::new(),
            total_amount: 0.0,
            delivery_fee,
            created_at: String::new(),
            updated_at: String::new(),
        };
        order.recompute_total();

        let order = self.orders.save_new(order)?;
        self.holder.add_order(order.clone());
        Ok(order)
    }

    /// Merge fields into an order (`PUT /orders/{id}`).
    ///
    /// A status change smuggled through the merge body goes through the same
    /// transition validation as the dedicated status endpoint.
    pub fn update(&self, id: &str, patch: serde_json::Value) -> Result<Order, ServiceError> {
        let existing = self.orders.get_or_err(id)?;

        let mut value = serde_json::to_value(&existing)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        merge_patch(&mut value, &patch);

        let mut updated: Order = serde_json::from_value(value)
            .map_err(|e| ServiceError::Validation(format!("invalid order fields: {}", e)))?;
        updated.id = existing.id.clone();
        updated.created_at = existing.created_at.clone();

        if updated.status != existing.status {
            self.check_transition(&existing, updated.status)?;
        }
        for item in &mut updated.items {
            if item.quantity == 0 {
                return Err(ServiceError::Validation(format!(
                    "item {} quantity must be positive",
                    item.id
                )));
            }
            item.recompute_total();
        }
        updated.recompute_total();

        let updated = self.orders.save(updated)?;
        self.holder.update_order(&updated);
        if updated.status == OrderStatus::Preparing && existing.status != OrderStatus::Preparing {
            self.fire_kitchen_trigger(&updated);
        }
        Ok(updated)
    }

    /// Set the order status, validating the transition.
    pub fn set_status(&self, id: &str, status: OrderStatus) -> Result<Order, ServiceError> {
        let mut order = self.orders.get_or_err(id)?;
        self.check_transition(&order, status)?;

        let previous = order.status;
        order.status = status;
        let order = self.orders.save(order)?;
        self.holder.update_order(&order);

        info!(order_id = %order.id, from = %previous, to = %status, "order status changed");
        if status == OrderStatus::Preparing {
            self.fire_kitchen_trigger(&order);
        }
        Ok(order)
    }

    fn check_transition(&self, order: &Order, next: OrderStatus) -> Result<(), ServiceError> {
        if !order.status.can_transition_to(next) {
            return Err(ServiceError::Validation(format!(
                "order {} cannot move from {} to {}",
                order.id, order.status, next
            )));
        }
        // "Send to kitchen" needs something to cook.
        if order.status == OrderStatus::New
            && next == OrderStatus::Preparing
            && order.items.is_empty()
        {
            return Err(ServiceError::Validation(format!(
                "order {} has no items to send to the kitchen",
                order.id
            )));
        }
        Ok(())
    }

    /// Delete an order.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.orders.delete(id)?;
        self.holder.remove_order(id);
        Ok(())
    }

    // =======================================================================
    // Items
    // =======================================================================

    /// Add a dish to an order. The dish name and unit price are copied at
    /// add time; adding a dish already on the order bumps its quantity.
    pub fn add_item(
        &self,
        order_id: &str,
        dish_id: &str,
        quantity: u32,
    ) -> Result<Order, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::Validation("quantity must be positive".into()));
        }

        let mut order = self.orders.get_or_err(order_id)?;
        let dish = self.dishes.get_or_err(dish_id)?;

        match order.items.iter_mut().find(|i| i.dish_id == dish_id) {
            Some(existing) => {
                existing.quantity += quantity;
                existing.recompute_total();
            }
            None => {
                order.items.push(OrderItem::new(
                    dish.id.clone(),
                    dish.name.clone(),
                    dish.price,
                    quantity,
                ));
            }
        }
        order.recompute_total();

        let order = self.orders.save(order)?;
        self.holder.update_order(&order);
        Ok(order)
    }

    /// Remove an item from an order.
    pub fn remove_item(&self, order_id: &str, item_id: &str) -> Result<Order, ServiceError> {
        let mut order = self.orders.get_or_err(order_id)?;

        let before = order.items.len();
        order.items.retain(|i| i.id != item_id);
        if order.items.len() == before {
            return Err(ServiceError::NotFound(format!(
                "item '{}' not found on order '{}'",
                item_id, order_id
            )));
        }
        order.recompute_total();

        let order = self.orders.save(order)?;
        self.holder.update_order(&order);
        Ok(order)
    }

    /// Set an item's quantity. Rejected for quantity ≤ 0 with the order
    /// left untouched.
    pub fn set_item_quantity(
        &self,
        order_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<Order, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation("quantity must be positive".into()));
        }

        let mut order = self.orders.get_or_err(order_id)?;
        let item = order
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "item '{}' not found on order '{}'",
                    item_id, order_id
                ))
            })?;

        item.quantity = quantity as u32;
        item.recompute_total();
        order.recompute_total();

        let order = self.orders.save(order)?;
        self.holder.update_order(&order);
        Ok(order)
    }
}
