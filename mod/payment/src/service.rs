use std::sync::{Arc, RwLock};

use tracing::info;

use comanda_core::{new_id, now_rfc3339, round_money, ServiceError};
use comanda_store::KvOps;

use crate::model::{
    CardPaymentRequest, CashPaymentRequest, CreatePaymentRequest, Payment, PaymentMethod,
    PaymentStatus, PixPaymentRequest, RevenueQuery, RevenueReport,
};

/// Callback fired when a payment completes, so the source order can be
/// marked PAID. Wired by the binary; failures there are logged, never
/// surfaced back into the payment operation.
pub type CompletionTrigger = Arc<dyn Fn(&Payment) + Send + Sync>;

/// Looks up an order's total amount by id. Wired by the binary so the
/// fully-paid check can compare against the order without a direct
/// dependency on the orders module.
pub type OrderTotalLookup = Arc<dyn Fn(&str) -> Option<f64> + Send + Sync>;

/// Payment records and the register-side processing flows.
pub struct PaymentService {
    payments: KvOps<Payment>,
    completion: RwLock<Option<CompletionTrigger>>,
    order_total: RwLock<Option<OrderTotalLookup>>,
}

impl PaymentService {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            payments: KvOps::new(kv),
            completion: RwLock::new(None),
            order_total: RwLock::new(None),
        }
    }

    /// Register the completion callback.
    pub fn set_completion_trigger(&self, trigger: CompletionTrigger) {
        *self.completion.write().unwrap() = Some(trigger);
    }

    /// Register the order total lookup.
    pub fn set_order_total_lookup(&self, lookup: OrderTotalLookup) {
        *self.order_total.write().unwrap() = Some(lookup);
    }

    fn fire_completion(&self, payment: &Payment) {
        let guard = self.completion.read().unwrap();
        if let Some(trigger) = guard.as_ref() {
            trigger(payment);
        }
    }

    // =======================================================================
    // CRUD
    // =======================================================================

    pub fn create(&self, req: CreatePaymentRequest) -> Result<Payment, ServiceError> {
        if !req.amount.is_finite() || req.amount <= 0.0 {
            return Err(ServiceError::Validation(
                "payment amount must be positive".into(),
            ));
        }
        self.payments.save_new(Payment {
            id: String::new(),
            order_id: req.order_id,
            amount: round_money(req.amount),
            method: req.method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            card_last_four: None,
            cash_received: None,
            change_amount: None,
            notes: req.notes,
            processed_by: None,
            created_at: String::new(),
            processed_at: None,
        })
    }

    pub fn get(&self, id: &str) -> Result<Payment, ServiceError> {
        self.payments.get_or_err(id)
    }

    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.payments.delete(id)
    }

    pub fn list(&self) -> Result<Vec<Payment>, ServiceError> {
        self.payments.list()
    }

    pub fn list_by_order(&self, order_id: &str) -> Result<Vec<Payment>, ServiceError> {
        self.list_where(|p| p.order_id == order_id)
    }

    pub fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, ServiceError> {
        self.list_where(|p| p.status == status)
    }

    pub fn list_by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, ServiceError> {
        self.list_where(|p| p.method == method)
    }

    /// Completed payments for one order.
    pub fn completed_by_order(&self, order_id: &str) -> Result<Vec<Payment>, ServiceError> {
        self.list_where(|p| p.order_id == order_id && p.status == PaymentStatus::Completed)
    }

    /// Payments processed by one user.
    pub fn list_by_processed_by(&self, user: &str) -> Result<Vec<Payment>, ServiceError> {
        self.list_where(|p| p.processed_by.as_deref() == Some(user))
    }

    /// Whether the COMPLETED payments for an order cover its total amount.
    pub fn order_fully_paid(&self, order_id: &str) -> Result<bool, ServiceError> {
        let total = {
            let guard = self.order_total.read().unwrap();
            guard.as_ref().and_then(|lookup| lookup(order_id))
        };
        let total = total
            .ok_or_else(|| ServiceError::NotFound(format!("order '{}' not found", order_id)))?;
        let paid: f64 = self
            .completed_by_order(order_id)?
            .iter()
            .map(|p| p.amount)
            .sum();
        Ok(round_money(paid) >= total)
    }

    fn list_where(
        &self,
        keep: impl Fn(&Payment) -> bool,
    ) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.payments.list()?.into_iter().filter(|p| keep(p)).collect())
    }

    // =======================================================================
    // Processing flows
    // =======================================================================

    /// Cash: requires the CASH method and enough money handed over; records
    /// the change and completes.
    pub fn process_cash(
        &self,
        id: &str,
        req: CashPaymentRequest,
    ) -> Result<Payment, ServiceError> {
        let mut payment = self.open_for_processing(id)?;
        if payment.method != PaymentMethod::Cash {
            return Err(ServiceError::Validation(format!(
                "payment {} uses {}, not CASH",
                payment.id, payment.method
            )));
        }
        if !req.cash_received.is_finite() || req.cash_received < payment.amount {
            return Err(ServiceError::Validation(format!(
                "cash received {:.2} is less than amount due {:.2}",
                req.cash_received, payment.amount
            )));
        }

        payment.cash_received = Some(round_money(req.cash_received));
        payment.change_amount = Some(round_money(req.cash_received - payment.amount));
        payment.processed_by = req.processed_by;
        self.complete(payment)
    }

    /// Card: any non-cash card-like method; records the transaction id and
    /// the card's last four digits and completes.
    pub fn process_card(
        &self,
        id: &str,
        req: CardPaymentRequest,
    ) -> Result<Payment, ServiceError> {
        let mut payment = self.open_for_processing(id)?;
        if payment.method == PaymentMethod::Cash {
            return Err(ServiceError::Validation(format!(
                "payment {} is CASH, use the cash flow",
                payment.id
            )));
        }

        payment.transaction_id = Some(req.transaction_id.unwrap_or_else(new_id));
        payment.card_last_four = req.card_last_four;
        payment.processed_by = req.processed_by;
        self.complete(payment)
    }

    /// Pix: requires the PIX method; records the transaction id and completes.
    pub fn process_pix(&self, id: &str, req: PixPaymentRequest) -> Result<Payment, ServiceError> {
        let mut payment = self.open_for_processing(id)?;
        if payment.method != PaymentMethod::Pix {
            return Err(ServiceError::Validation(format!(
                "payment {} uses {}, not PIX",
                payment.id, payment.method
            )));
        }

        payment.transaction_id = Some(req.transaction_id.unwrap_or_else(new_id));
        payment.processed_by = req.processed_by;
        self.complete(payment)
    }

    fn open_for_processing(&self, id: &str) -> Result<Payment, ServiceError> {
        let payment = self.payments.get_or_err(id)?;
        match payment.status {
            PaymentStatus::Pending | PaymentStatus::Processing => Ok(payment),
            other => Err(ServiceError::Validation(format!(
                "payment {} is {}, not open for processing",
                payment.id, other
            ))),
        }
    }

    fn complete(&self, mut payment: Payment) -> Result<Payment, ServiceError> {
        payment.status = PaymentStatus::Completed;
        if payment.processed_at.is_none() {
            payment.processed_at = Some(now_rfc3339());
        }
        let payment = self.payments.save(payment)?;
        info!(payment_id = %payment.id, order_id = %payment.order_id, method = %payment.method, "payment completed");
        self.fire_completion(&payment);
        Ok(payment)
    }

    // =======================================================================
    // Status, notes
    // =======================================================================

    /// Direct status update; a move into COMPLETED stamps processed_at and
    /// fires the completion callback.
    pub fn set_status(&self, id: &str, status: PaymentStatus) -> Result<Payment, ServiceError> {
        let mut payment = self.payments.get_or_err(id)?;
        let was_completed = payment.status == PaymentStatus::Completed;
        payment.status = status;
        if status == PaymentStatus::Completed && payment.processed_at.is_none() {
            payment.processed_at = Some(now_rfc3339());
        }
        let payment = self.payments.save(payment)?;
        if status == PaymentStatus::Completed && !was_completed {
            self.fire_completion(&payment);
        }
        Ok(payment)
    }

    pub fn set_notes(&self, id: &str, notes: Option<String>) -> Result<Payment, ServiceError> {
        let mut payment = self.payments.get_or_err(id)?;
        payment.notes = notes;
        self.payments.save(payment)
    }

    // =======================================================================
    // Revenue
    // =======================================================================

    /// Sum of COMPLETED payments, optionally bounded by RFC 3339 completion
    /// timestamps (inclusive from, exclusive to).
    pub fn revenue(&self, query: RevenueQuery) -> Result<RevenueReport, ServiceError> {
        let mut total = 0.0;
        let mut completed_count = 0;
        for payment in self.payments.list()? {
            if payment.status != PaymentStatus::Completed {
                continue;
            }
            let processed_at = payment.processed_at.as_deref().unwrap_or("");
            if let Some(from) = query.from.as_deref() {
                if processed_at < from {
                    continue;
                }
            }
            if let Some(to) = query.to.as_deref() {
                if processed_at >= to {
                    continue;
                }
            }
            total += payment.amount;
            completed_count += 1;
        }
        Ok(RevenueReport {
            total: round_money(total),
            completed_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn service() -> PaymentService {
        PaymentService::new(Arc::new(comanda_kv::MemStore::new()))
    }

    fn new_payment(svc: &PaymentService, method: PaymentMethod, amount: f64) -> Payment {
        svc.create(CreatePaymentRequest {
            order_id: "o1".into(),
            amount,
            method,
            notes: None,
        })
        .unwrap()
    }

    #[test]
    fn create_starts_pending() {
        let svc = service();
        let payment = new_payment(&svc, PaymentMethod::Cash, 51.80);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.processed_at.is_none());

        assert!(matches!(
            svc.create(CreatePaymentRequest {
                order_id: "o1".into(),
                amount: 0.0,
                method: PaymentMethod::Cash,
                notes: None,
            }),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn cash_computes_change_and_completes() {
        let svc = service();
        let payment = new_payment(&svc, PaymentMethod::Cash, 51.80);

        let done = svc
            .process_cash(
                &payment.id,
                CashPaymentRequest {
                    cash_received: 60.0,
                    processed_by: Some("maria".into()),
                },
            )
            .unwrap();
        assert_eq!(done.status, PaymentStatus::Completed);
        assert_eq!(done.cash_received, Some(60.0));
        assert_eq!(done.change_amount, Some(8.20));
        assert_eq!(done.processed_by.as_deref(), Some("maria"));
        assert!(done.processed_at.is_some());
    }

    #[test]
    fn cash_rejects_short_payment_and_wrong_method() {
        let svc = service();
        let cash = new_payment(&svc, PaymentMethod::Cash, 51.80);
        let err = svc
            .process_cash(
                &cash.id,
                CashPaymentRequest {
                    cash_received: 50.0,
                    processed_by: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get(&cash.id).unwrap().status, PaymentStatus::Pending);

        let card = new_payment(&svc, PaymentMethod::CreditCard, 51.80);
        assert!(matches!(
            svc.process_cash(
                &card.id,
                CashPaymentRequest { cash_received: 60.0, processed_by: None }
            ),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn card_flow_rejects_cash_method() {
        let svc = service();
        let cash = new_payment(&svc, PaymentMethod::Cash, 30.0);
        assert!(matches!(
            svc.process_card(&cash.id, CardPaymentRequest::default()),
            Err(ServiceError::Validation(_))
        ));

        let card = new_payment(&svc, PaymentMethod::DebitCard, 30.0);
        let done = svc
            .process_card(
                &card.id,
                CardPaymentRequest {
                    transaction_id: Some("txn-1".into()),
                    card_last_four: Some("4242".into()),
                    processed_by: None,
                },
            )
            .unwrap();
        assert_eq!(done.status, PaymentStatus::Completed);
        assert_eq!(done.transaction_id.as_deref(), Some("txn-1"));
        assert_eq!(done.card_last_four.as_deref(), Some("4242"));
    }

    #[test]
    fn pix_requires_pix_method_and_gets_transaction_id() {
        let svc = service();
        let card = new_payment(&svc, PaymentMethod::CreditCard, 30.0);
        assert!(matches!(
            svc.process_pix(&card.id, PixPaymentRequest::default()),
            Err(ServiceError::Validation(_))
        ));

        let pix = new_payment(&svc, PaymentMethod::Pix, 30.0);
        let done = svc.process_pix(&pix.id, PixPaymentRequest::default()).unwrap();
        assert_eq!(done.status, PaymentStatus::Completed);
        assert!(done.transaction_id.is_some());
    }

    #[test]
    fn completed_payment_cannot_be_reprocessed() {
        let svc = service();
        let pix = new_payment(&svc, PaymentMethod::Pix, 30.0);
        svc.process_pix(&pix.id, PixPaymentRequest::default()).unwrap();
        assert!(matches!(
            svc.process_pix(&pix.id, PixPaymentRequest::default()),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn completion_trigger_fires_once_per_completion() {
        let svc = service();
        let completed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&completed);
        svc.set_completion_trigger(Arc::new(move |payment: &Payment| {
            sink.lock().unwrap().push(payment.order_id.clone());
        }));

        let pix = new_payment(&svc, PaymentMethod::Pix, 30.0);
        svc.process_pix(&pix.id, PixPaymentRequest::default()).unwrap();
        assert_eq!(completed.lock().unwrap().as_slice(), &["o1".to_string()]);

        // A direct status update into COMPLETED also fires, but only on the
        // transition.
        let cash = new_payment(&svc, PaymentMethod::Cash, 10.0);
        svc.set_status(&cash.id, PaymentStatus::Completed).unwrap();
        svc.set_status(&cash.id, PaymentStatus::Completed).unwrap();
        assert_eq!(completed.lock().unwrap().len(), 2);
    }

    #[test]
    fn filters_by_order_status_and_method() {
        let svc = service();
        let pix = new_payment(&svc, PaymentMethod::Pix, 30.0);
        new_payment(&svc, PaymentMethod::Cash, 20.0);
        svc.process_pix(&pix.id, PixPaymentRequest::default()).unwrap();

        assert_eq!(svc.list().unwrap().len(), 2);
        assert_eq!(svc.list_by_order("o1").unwrap().len(), 2);
        assert_eq!(svc.list_by_order("ghost").unwrap().len(), 0);
        assert_eq!(svc.list_by_status(PaymentStatus::Completed).unwrap().len(), 1);
        assert_eq!(svc.list_by_method(PaymentMethod::Cash).unwrap().len(), 1);
        assert_eq!(svc.completed_by_order("o1").unwrap().len(), 1);
    }

    #[test]
    fn fully_paid_requires_completed_coverage() {
        let svc = service();
        svc.set_order_total_lookup(Arc::new(|order_id: &str| {
            (order_id == "o1").then_some(51.80)
        }));

        let first = new_payment(&svc, PaymentMethod::Pix, 30.0);
        let second = new_payment(&svc, PaymentMethod::Pix, 21.80);
        assert!(!svc.order_fully_paid("o1").unwrap());

        svc.process_pix(&first.id, PixPaymentRequest::default()).unwrap();
        assert!(!svc.order_fully_paid("o1").unwrap());

        svc.process_pix(&second.id, PixPaymentRequest::default()).unwrap();
        assert!(svc.order_fully_paid("o1").unwrap());

        assert!(matches!(
            svc.order_fully_paid("ghost"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn filters_by_processed_by() {
        let svc = service();
        let cash = new_payment(&svc, PaymentMethod::Cash, 20.0);
        svc.process_cash(
            &cash.id,
            CashPaymentRequest {
                cash_received: 20.0,
                processed_by: Some("maria".into()),
            },
        )
        .unwrap();
        new_payment(&svc, PaymentMethod::Cash, 10.0);

        assert_eq!(svc.list_by_processed_by("maria").unwrap().len(), 1);
        assert_eq!(svc.list_by_processed_by("joao").unwrap().len(), 0);
    }

    #[test]
    fn revenue_sums_completed_only() {
        let svc = service();
        let a = new_payment(&svc, PaymentMethod::Pix, 30.0);
        let b = new_payment(&svc, PaymentMethod::Pix, 21.80);
        new_payment(&svc, PaymentMethod::Pix, 99.0); // stays pending
        svc.process_pix(&a.id, PixPaymentRequest::default()).unwrap();
        svc.process_pix(&b.id, PixPaymentRequest::default()).unwrap();

        let report = svc.revenue(RevenueQuery::default()).unwrap();
        assert_eq!(report.total, 51.80);
        assert_eq!(report.completed_count, 2);
    }

    #[test]
    fn revenue_respects_date_bounds() {
        let svc = service();
        let payment = new_payment(&svc, PaymentMethod::Pix, 30.0);
        svc.process_pix(&payment.id, PixPaymentRequest::default()).unwrap();

        let past_only = svc
            .revenue(RevenueQuery {
                from: Some("2000-01-01T00:00:00+00:00".into()),
                to: Some("2001-01-01T00:00:00+00:00".into()),
            })
            .unwrap();
        assert_eq!(past_only.completed_count, 0);
        assert_eq!(past_only.total, 0.0);

        let open_ended = svc
            .revenue(RevenueQuery {
                from: Some("2000-01-01T00:00:00+00:00".into()),
                to: None,
            })
            .unwrap();
        assert_eq!(open_ended.completed_count, 1);
    }
}
