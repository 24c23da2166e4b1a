//! Demo menu loaded with `--seed`, matching the fixtures the original
//! development server shipped with.

use comanda_catalog::service::CatalogService;
use comanda_core::ServiceError;
use tracing::info;

const DEMO_DISHES: &[(&str, &str, f64)] = &[
    (
        "Pizza Margherita",
        "Molho de tomate, mussarela e manjericão",
        25.90,
    ),
    (
        "Hambúrguer Artesanal",
        "Pão brioche, blend 180g, queijo e salada",
        18.50,
    ),
    ("Salada Caesar", "Alface, croutons, parmesão e molho caesar", 15.90),
];

/// Load the demo dishes. Skipped when the catalog already has entries, so
/// restarting a seeded persistent server never duplicates the menu.
pub fn seed_dishes(catalog: &CatalogService) -> Result<usize, ServiceError> {
    if !catalog.list()?.is_empty() {
        info!("catalog already populated, skipping seed");
        return Ok(0);
    }
    for (name, description, price) in DEMO_DISHES {
        catalog.create(name.to_string(), description.to_string(), *price)?;
    }
    info!("seeded {} demo dishes", DEMO_DISHES.len());
    Ok(DEMO_DISHES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn seed_is_idempotent() {
        let catalog = CatalogService::new(Arc::new(comanda_kv::MemStore::new()));
        assert_eq!(seed_dishes(&catalog).unwrap(), 3);
        assert_eq!(seed_dishes(&catalog).unwrap(), 0);
        assert_eq!(catalog.list().unwrap().len(), 3);
    }
}
