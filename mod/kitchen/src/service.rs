use std::sync::{Arc, RwLock};

use tracing::info;

use comanda_core::ServiceError;
use comanda_orders::model::{Order, OrderStatus};
use comanda_store::KvOps;

use crate::model::{
    CreateKitchenOrderRequest, KitchenOrder, KitchenOrderItem, PreparationStatus,
    PRIORITY_NORMAL, PRIORITY_URGENT,
};

/// Callback fired after a ticket's status changes, so the source order can
/// follow. Wired by the binary; failures there are logged, never surfaced
/// back into the kitchen operation.
pub type OrderSyncTrigger = Arc<dyn Fn(&str, OrderStatus) + Send + Sync>;

/// The kitchen board.
///
/// Tickets are keyed by their own id but linked to the source order through
/// `order_id`; [`KitchenService::intake`] replaces any previous ticket for
/// the same order, so a re-sent order never leaves a stale duplicate.
pub struct KitchenService {
    tickets: KvOps<KitchenOrder>,
    order_sync: RwLock<Option<OrderSyncTrigger>>,
}

impl KitchenService {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            tickets: KvOps::new(kv),
            order_sync: RwLock::new(None),
        }
    }

    /// Register the order status follow-up callback.
    pub fn set_order_sync(&self, trigger: OrderSyncTrigger) {
        *self.order_sync.write().unwrap() = Some(trigger);
    }

    fn fire_order_sync(&self, ticket: &KitchenOrder) {
        let guard = self.order_sync.read().unwrap();
        if let Some(trigger) = guard.as_ref() {
            trigger(&ticket.order_id, ticket.status);
        }
    }

    // =======================================================================
    // Intake and creation
    // =======================================================================

    /// Take an order onto the board, replacing any existing ticket for the
    /// same order. Item progress starts over at PENDING.
    pub fn intake(&self, order: &Order) -> Result<KitchenOrder, ServiceError> {
        if let Some(existing) = self.find_by_order(&order.id)? {
            self.tickets.delete(&existing.id)?;
            info!(order_id = %order.id, ticket_id = %existing.id, "replacing kitchen ticket");
        }
        let ticket = self.tickets.save_new(KitchenOrder::from_order(order))?;
        info!(order_id = %order.id, ticket_id = %ticket.id, "order taken into kitchen");
        Ok(ticket)
    }

    /// Post a ticket directly onto the board.
    pub fn create(&self, req: CreateKitchenOrderRequest) -> Result<KitchenOrder, ServiceError> {
        let priority = req.priority.unwrap_or(PRIORITY_NORMAL);
        check_priority(priority)?;

        let items = req
            .items
            .into_iter()
            .map(|item| {
                let total_price =
                    comanda_core::round_money(item.unit_price * item.quantity as f64);
                KitchenOrderItem {
                    id: comanda_core::new_id(),
                    dish_id: item.dish_id,
                    dish_name: item.dish_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price,
                    preparation_status: PreparationStatus::Pending,
                    preparation_notes: item.preparation_notes,
                    estimated_prep_time: None,
                }
            })
            .collect::<Vec<_>>();
        let total_amount =
            comanda_core::round_money(items.iter().map(|i| i.total_price).sum());

        self.tickets.save_new(KitchenOrder {
            id: String::new(),
            order_id: req.order_id,
            table_number: req.table_number,
            customer_name: req.customer_name,
            status: OrderStatus::New,
            items,
            total_amount,
            estimated_time: req.estimated_time,
            priority,
            notes: req.notes,
            created_at: String::new(),
            updated_at: String::new(),
            started_at: None,
            ready_at: None,
        })
    }

    // =======================================================================
    // Queries
    // =======================================================================

    pub fn get(&self, id: &str) -> Result<KitchenOrder, ServiceError> {
        self.tickets.get_or_err(id)
    }

    /// Ticket for a source order, if one is on the board.
    pub fn find_by_order(&self, order_id: &str) -> Result<Option<KitchenOrder>, ServiceError> {
        Ok(self
            .tickets
            .list()?
            .into_iter()
            .find(|t| t.order_id == order_id))
    }

    /// Whole board, urgent first, then oldest first.
    pub fn list(&self) -> Result<Vec<KitchenOrder>, ServiceError> {
        Ok(sort_board(self.tickets.list()?))
    }

    /// Tickets still in play (NEW, PREPARING or READY).
    pub fn list_active(&self) -> Result<Vec<KitchenOrder>, ServiceError> {
        self.list_where(|t| {
            matches!(
                t.status,
                OrderStatus::New | OrderStatus::Preparing | OrderStatus::Ready
            )
        })
    }

    pub fn list_by_status(&self, status: OrderStatus) -> Result<Vec<KitchenOrder>, ServiceError> {
        self.list_where(|t| t.status == status)
    }

    pub fn list_by_table(&self, table: u32) -> Result<Vec<KitchenOrder>, ServiceError> {
        self.list_where(|t| t.table_number == Some(table))
    }

    pub fn list_by_priority(&self, priority: u8) -> Result<Vec<KitchenOrder>, ServiceError> {
        check_priority(priority)?;
        self.list_where(|t| t.priority == priority)
    }

    pub fn count_by_status(&self, status: OrderStatus) -> Result<usize, ServiceError> {
        Ok(self
            .tickets
            .list()?
            .iter()
            .filter(|t| t.status == status)
            .count())
    }

    fn list_where(
        &self,
        keep: impl Fn(&KitchenOrder) -> bool,
    ) -> Result<Vec<KitchenOrder>, ServiceError> {
        Ok(sort_board(
            self.tickets.list()?.into_iter().filter(|t| keep(t)).collect(),
        ))
    }

    // =======================================================================
    // Status
    // =======================================================================

    /// Move a ticket through the shared status machine, stamping started_at
    /// and ready_at on the first matching transition, then notify the orders
    /// side.
    pub fn set_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<KitchenOrder, ServiceError> {
        let mut ticket = self.tickets.get_or_err(id)?;
        if !ticket.status.can_transition_to(status) {
            return Err(ServiceError::Validation(format!(
                "kitchen ticket {} cannot move from {} to {}",
                ticket.id, ticket.status, status
            )));
        }

        ticket.status = status;
        match status {
            OrderStatus::Preparing if ticket.started_at.is_none() => {
                ticket.started_at = Some(comanda_core::now_rfc3339());
            }
            OrderStatus::Ready if ticket.ready_at.is_none() => {
                ticket.ready_at = Some(comanda_core::now_rfc3339());
            }
            _ => {}
        }

        let ticket = self.tickets.save(ticket)?;
        info!(ticket_id = %ticket.id, order_id = %ticket.order_id, to = %status, "kitchen ticket status changed");
        self.fire_order_sync(&ticket);
        Ok(ticket)
    }

    pub fn mark_ready(&self, id: &str) -> Result<KitchenOrder, ServiceError> {
        self.set_status(id, OrderStatus::Ready)
    }

    pub fn mark_delivered(&self, id: &str) -> Result<KitchenOrder, ServiceError> {
        self.set_status(id, OrderStatus::Delivered)
    }

    pub fn cancel(&self, id: &str) -> Result<KitchenOrder, ServiceError> {
        self.set_status(id, OrderStatus::Cancelled)
    }

    /// Mark every line READY and move the ticket to READY.
    pub fn mark_all_items_ready(&self, id: &str) -> Result<KitchenOrder, ServiceError> {
        let mut ticket = self.tickets.get_or_err(id)?;
        if !ticket.status.can_transition_to(OrderStatus::Ready) {
            return Err(ServiceError::Validation(format!(
                "kitchen ticket {} cannot move from {} to READY",
                ticket.id, ticket.status
            )));
        }
        for item in &mut ticket.items {
            item.preparation_status = PreparationStatus::Ready;
        }
        self.tickets.save(ticket)?;
        self.set_status(id, OrderStatus::Ready)
    }

    // =======================================================================
    // Ticket fields
    // =======================================================================

    pub fn set_priority(&self, id: &str, priority: u8) -> Result<KitchenOrder, ServiceError> {
        check_priority(priority)?;
        let mut ticket = self.tickets.get_or_err(id)?;
        ticket.priority = priority;
        self.tickets.save(ticket)
    }

    pub fn set_notes(&self, id: &str, notes: Option<String>) -> Result<KitchenOrder, ServiceError> {
        let mut ticket = self.tickets.get_or_err(id)?;
        ticket.notes = notes;
        self.tickets.save(ticket)
    }

    pub fn set_estimated_time(
        &self,
        id: &str,
        minutes: Option<u32>,
    ) -> Result<KitchenOrder, ServiceError> {
        let mut ticket = self.tickets.get_or_err(id)?;
        ticket.estimated_time = minutes;
        self.tickets.save(ticket)
    }

    // =======================================================================
    // Item progress
    // =======================================================================

    pub fn set_item_status(
        &self,
        id: &str,
        item_id: &str,
        status: PreparationStatus,
    ) -> Result<KitchenOrder, ServiceError> {
        let mut ticket = self.tickets.get_or_err(id)?;
        let item = find_item(&mut ticket, item_id)?;
        item.preparation_status = status;
        self.tickets.save(ticket)
    }

    pub fn set_item_notes(
        &self,
        id: &str,
        item_id: &str,
        notes: Option<String>,
    ) -> Result<KitchenOrder, ServiceError> {
        let mut ticket = self.tickets.get_or_err(id)?;
        let item = find_item(&mut ticket, item_id)?;
        item.preparation_notes = notes;
        self.tickets.save(ticket)
    }

    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.tickets.delete(id)
    }
}

fn check_priority(priority: u8) -> Result<(), ServiceError> {
    if !(PRIORITY_NORMAL..=PRIORITY_URGENT).contains(&priority) {
        return Err(ServiceError::Validation(format!(
            "priority must be between {} and {}",
            PRIORITY_NORMAL, PRIORITY_URGENT
        )));
    }
    Ok(())
}

fn find_item<'a>(
    ticket: &'a mut KitchenOrder,
    item_id: &str,
) -> Result<&'a mut KitchenOrderItem, ServiceError> {
    let ticket_id = ticket.id.clone();
    ticket
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "item '{}' not found on kitchen ticket '{}'",
                item_id, ticket_id
            ))
        })
}

fn sort_board(mut tickets: Vec<KitchenOrder>) -> Vec<KitchenOrder> {
    tickets.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    tickets
}
