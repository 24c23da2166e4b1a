use serde::{Deserialize, Serialize};

use comanda_core::{new_id, now_rfc3339};
use comanda_store::KvRecord;

/// A menu item with a fixed price at time of catalog entry.
///
/// Order items copy `name` and `price` when they are added, so editing or
/// deleting a dish never rewrites existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Non-negative price in currency units.
    pub price: f64,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl KvRecord for Dish {
    const NAME: &'static str = "dish";
    const PREFIX: &'static str = "catalog:dish:";

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

/// Body for `POST /dishes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDishRequest {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dish_json_uses_camel_case() {
        let dish = Dish {
            id: "d1".into(),
            name: "Pizza Margherita".into(),
            description: "Tomato, mozzarella, basil".into(),
            price: 25.90,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_string(&dish).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("\"created_at\""));

        let back: Dish = serde_json::from_str(&json).unwrap();
        assert_eq!(back.price, 25.90);
    }

    #[test]
    fn create_hook_fills_id_and_timestamps() {
        let mut dish = Dish {
            id: String::new(),
            name: "Caesar Salad".into(),
            description: String::new(),
            price: 15.90,
            created_at: String::new(),
            updated_at: String::new(),
        };
        dish.before_create();
        assert_eq!(dish.id.len(), 32);
        assert!(!dish.created_at.is_empty());
        assert_eq!(dish.created_at, dish.updated_at);
    }
}
