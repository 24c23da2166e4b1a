use std::sync::Arc;

use tracing::info;

use comanda_core::{merge_patch, ServiceError};
use comanda_store::KvOps;

use crate::model::Dish;

/// Catalog service — authoritative holder of the dish collection.
pub struct CatalogService {
    dishes: Arc<KvOps<Dish>>,
}

impl CatalogService {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            dishes: Arc::new(KvOps::new(kv)),
        }
    }

    /// Direct access to the dish ops (used by the orders module to
    /// denormalize name/price when items are added).
    pub fn dishes(&self) -> &Arc<KvOps<Dish>> {
        &self.dishes
    }

    pub fn list(&self) -> Result<Vec<Dish>, ServiceError> {
        self.dishes.list()
    }

    pub fn get(&self, id: &str) -> Result<Dish, ServiceError> {
        self.dishes.get_or_err(id)
    }

    pub fn create(&self, name: String, description: String, price: f64) -> Result<Dish, ServiceError> {
        validate(&name, price)?;
        let dish = self.dishes.save_new(Dish {
            id: String::new(),
            name,
            description,
            price,
            created_at: String::new(),
            updated_at: String::new(),
        })?;
        info!(dish_id = %dish.id, name = %dish.name, "dish created");
        Ok(dish)
    }

    /// Merge the given fields into an existing dish.
    pub fn update(&self, id: &str, patch: serde_json::Value) -> Result<Dish, ServiceError> {
        let existing = self.dishes.get_or_err(id)?;

        let mut value = serde_json::to_value(&existing)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        merge_patch(&mut value, &patch);

        let mut updated: Dish = serde_json::from_value(value)
            .map_err(|e| ServiceError::Validation(format!("invalid dish fields: {}", e)))?;
        // The identifier is immutable after creation.
        updated.id = existing.id;
        validate(&updated.name, updated.price)?;

        self.dishes.save(updated)
    }

    /// Remove a dish. Does not cascade: order items keep their copied
    /// name/price and views tolerate the dangling id.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.dishes.delete(id)?;
        info!(dish_id = %id, "dish deleted");
        Ok(())
    }
}

fn validate(name: &str, price: f64) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation("dish name must not be empty".into()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(ServiceError::Validation("dish price must be non-negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_service() -> CatalogService {
        CatalogService::new(Arc::new(comanda_kv::MemStore::new()))
    }

    #[test]
    fn create_and_get() {
        let svc = make_service();
        let dish = svc.create("Pizza".into(), "Margherita".into(), 25.90).unwrap();
        assert!(!dish.id.is_empty());

        let fetched = svc.get(&dish.id).unwrap();
        assert_eq!(fetched.name, "Pizza");
        assert_eq!(fetched.price, 25.90);
    }

    #[test]
    fn create_rejects_bad_input() {
        let svc = make_service();
        assert!(svc.create("".into(), String::new(), 10.0).is_err());
        assert!(svc.create("Pizza".into(), String::new(), -1.0).is_err());
    }

    #[test]
    fn update_merges_fields() {
        let svc = make_service();
        let dish = svc.create("Burger".into(), "Classic".into(), 18.50).unwrap();

        let updated = svc
            .update(&dish.id, serde_json::json!({"price": 19.90}))
            .unwrap();
        assert_eq!(updated.price, 19.90);
        assert_eq!(updated.name, "Burger");
        assert_eq!(updated.id, dish.id);
    }

    #[test]
    fn update_rejects_negative_price() {
        let svc = make_service();
        let dish = svc.create("Burger".into(), String::new(), 18.50).unwrap();
        let err = svc.update(&dish.id, serde_json::json!({"price": -5.0})).unwrap_err();
        assert!(err.to_string().contains("non-negative"));

        // Record unchanged.
        assert_eq!(svc.get(&dish.id).unwrap().price, 18.50);
    }

    #[test]
    fn missing_dish_is_not_found() {
        let svc = make_service();
        assert!(matches!(svc.get("nope"), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete("nope"), Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.update("nope", serde_json::json!({})),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn delete_leaves_other_dishes() {
        let svc = make_service();
        let a = svc.create("A".into(), String::new(), 1.0).unwrap();
        let b = svc.create("B".into(), String::new(), 2.0).unwrap();

        svc.delete(&a.id).unwrap();
        assert_eq!(svc.list().unwrap().len(), 1);
        assert_eq!(svc.get(&b.id).unwrap().name, "B");
    }
}
