//! Bulk import reconciliation.
//!
//! Rows are merged into a copy of the catalog: reference names are resolved
//! (or created) through a per-batch [`NameIndex`], rows whose id matches a
//! product that existed before the batch are merged onto it, and everything
//! else is appended under a fresh id. The caller swaps the returned
//! collections in as a whole; nothing is written when decoding fails.

use std::collections::{HashMap, HashSet};
use tracing::info;
use crate::catalog::csv_codec::{self, parse_lenient_number, ImportRow};
use crate::catalog::{id_sequence_exhausted, next_product_number, Catalog};
use crate::domain::aggregates::{Brand, Category, Condition, EntityKind, NamedEntity, Product, ProductPatch, Status};
use crate::domain::events::CatalogEvent;
use crate::domain::registry::NameIndex;
use crate::Result;

/// Replacement collections produced by one import batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportOutcome {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub conditions: Vec<Condition>,
    pub statuses: Vec<Status>,
    pub merged: usize,
    pub appended: usize,
    pub events: Vec<CatalogEvent>,
}

impl ImportOutcome {
    pub fn created_references(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, CatalogEvent::ReferenceCreated { .. })).count()
    }
}

/// Decodes `text` and reconciles it against `catalog`.
pub fn import_csv(catalog: &Catalog, text: &str) -> Result<ImportOutcome> {
    let rows = csv_codec::decode_rows(text)?;
    reconcile(catalog, &rows)
}

/// A reference collection together with its batch name index.
struct Working<T> {
    entities: Vec<T>,
    index: NameIndex,
}

impl<T: NamedEntity> Working<T> {
    fn new(kind: EntityKind, existing: &[T]) -> Self {
        Self { entities: existing.to_vec(), index: NameIndex::new(kind, existing) }
    }

    fn resolve(&mut self, name: &str, events: &mut Vec<CatalogEvent>) -> Option<String> {
        let resolved = self.index.resolve(&mut self.entities, name)?;
        if resolved.created {
            events.push(CatalogEvent::ReferenceCreated { kind: self.index.kind(), id: resolved.id.clone(), name: name.trim().to_string() });
        }
        Some(resolved.id)
    }
}

/// Fails only when the batch needs a sequential id and none is left.
pub fn reconcile(catalog: &Catalog, rows: &[ImportRow]) -> Result<ImportOutcome> {
    let mut events = Vec::new();
    let mut categories = Working::new(EntityKind::Category, &catalog.categories);
    let mut brands = Working::new(EntityKind::Brand, &catalog.brands);
    let mut conditions = Working::new(EntityKind::Condition, &catalog.conditions);
    let mut statuses = Working::new(EntityKind::Status, &catalog.statuses);
    let default_status = catalog.inactive_status_id().unwrap_or_default().to_string();

    let mut products = catalog.products.clone();
    let existing: HashMap<String, usize> = products.iter().enumerate().map(|(i, p)| (p.id.clone(), i)).collect();
    let mut taken: HashSet<String> = existing.keys().cloned().collect();
    let mut next_number = next_product_number(existing.keys().map(String::as_str));
    let (mut merged, mut appended) = (0, 0);

    for row in rows {
        let mut patch = ProductPatch {
            name: row.name.clone(),
            details: row.details.clone(),
            description: row.description.clone(),
            image_url: row.image_url.clone(),
            reference: row.reference.clone(),
            price: row.price.as_deref().map(parse_lenient_number),
            ..ProductPatch::default()
        };
        if let Some(name) = &row.category {
            patch.category = Some(categories.resolve(name, &mut events).unwrap_or_default());
        }
        if let Some(name) = &row.brand {
            patch.brand_id = Some(brands.resolve(name, &mut events).unwrap_or_default());
        }
        if let Some(name) = &row.condition {
            patch.condition_id = Some(conditions.resolve(name, &mut events).unwrap_or_default());
        }
        if let Some(name) = &row.status {
            patch.status_id = Some(statuses.resolve(name, &mut events).unwrap_or_else(|| default_status.clone()));
        }

        let requested = row.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
        match requested.and_then(|id| existing.get(id)) {
            Some(&i) => {
                products[i].apply(patch);
                merged += 1;
                events.push(CatalogEvent::ProductMerged { product_id: products[i].id.clone() });
            }
            None => {
                let id = assign_id(requested, &taken, &mut next_number)?;
                let mut product = Product { id: id.clone(), ..Product::default() };
                product.apply(patch);
                if product.status_id.is_empty() { product.status_id = default_status.clone(); }
                taken.insert(id.clone());
                products.push(product);
                appended += 1;
                events.push(CatalogEvent::ProductAppended { product_id: id });
            }
        }
    }

    events.push(CatalogEvent::ProductsImported { merged, appended });
    let outcome = ImportOutcome {
        products,
        categories: categories.entities,
        brands: brands.entities,
        conditions: conditions.entities,
        statuses: statuses.entities,
        merged,
        appended,
        events,
    };
    info!(rows = rows.len(), merged, appended, created_references = outcome.created_references(), "import reconciled");
    Ok(outcome)
}

/// Keeps a requested id when it is free. A numeric id that is taken is
/// incremented until free; any other taken or absent id, or a numeric id with
/// no room left above it, gets the next sequential number.
fn assign_id(requested: Option<&str>, taken: &HashSet<String>, next_number: &mut Option<u64>) -> Result<String> {
    if let Some(id) = requested {
        if !taken.contains(id) { return Ok(id.to_string()); }
        if let Ok(mut n) = id.parse::<u64>() {
            while let Some(bumped) = n.checked_add(1) {
                let candidate = bumped.to_string();
                if !taken.contains(&candidate) { return Ok(candidate); }
                n = bumped;
            }
        }
    }
    while let Some(n) = *next_number {
        *next_number = n.checked_add(1);
        let candidate = n.to_string();
        if !taken.contains(&candidate) { return Ok(candidate); }
    }
    Err(id_sequence_exhausted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_catalog;
    use crate::CatalogError;

    const HEADER: &str = "id,name,details,category,price,description,imageUrl,status,condition,brand,reference";

    fn ids(outcome: &ImportOutcome) -> Vec<&str> {
        outcome.products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_same_new_brand_is_created_once() {
        let catalog = seed_catalog();
        let text = format!("{HEADER}\n,Phone A,,Smartphones em Estoque,100,,,,,Acme,\n,Phone B,,Smartphones em Estoque,200,,,,,ACME,\n");
        let outcome = import_csv(&catalog, &text).unwrap();
        let acme: Vec<_> = outcome.brands.iter().filter(|b| b.name.eq_ignore_ascii_case("acme")).collect();
        assert_eq!(acme.len(), 1);
        assert_eq!(outcome.brands.len(), catalog.brands.len() + 1);
        let new: Vec<_> = outcome.products.iter().filter(|p| p.name.starts_with("Phone")).collect();
        assert_eq!(new.len(), 2);
        assert_eq!(new[0].brand_id.as_deref(), Some(acme[0].id.as_str()));
        assert_eq!(new[1].brand_id, new[0].brand_id);
        assert_eq!(outcome.created_references(), 1);
    }

    #[test]
    fn test_new_rows_get_sequential_ids() {
        let catalog = seed_catalog();
        assert_eq!(catalog.next_product_id().unwrap(), "20");
        let text = format!("{HEADER}\n,A,,,1,,,,,,\n,B,,,2,,,,,,\n,C,,,3,,,,,,\n");
        let outcome = import_csv(&catalog, &text).unwrap();
        assert_eq!(&ids(&outcome)[catalog.products.len()..], ["20", "21", "22"]);
        let unique: HashSet<_> = ids(&outcome).into_iter().collect();
        assert_eq!(unique.len(), outcome.products.len());
    }

    #[test]
    fn test_known_id_merges_unknown_id_appends() {
        let catalog = seed_catalog();
        let original = catalog.products[0].clone();
        let text = "id,price\n10,1500\n999,42\n";
        let outcome = import_csv(&catalog, text).unwrap();
        assert_eq!((outcome.merged, outcome.appended), (1, 1));
        let merged = &outcome.products[0];
        assert_eq!(merged.price, Some(1500.0));
        assert_eq!(merged.name, original.name);
        assert_eq!(merged.brand_id, original.brand_id);
        assert_eq!(merged.details, original.details);
        assert_eq!(merged.cost_usd, original.cost_usd);
        let appended = outcome.products.last().unwrap();
        assert_eq!(appended.id, "999");
        assert_eq!(appended.price, Some(42.0));
        assert_eq!(outcome.products.len(), catalog.products.len() + 1);
    }

    #[test]
    fn test_full_row_overwrites_listed_fields() {
        let catalog = seed_catalog();
        let text = format!("{HEADER}\n10,Iphone 11 Vitrine,,iPhone Swap,abc,,img.jpg,Por encomenda,,,\n");
        let outcome = import_csv(&catalog, &text).unwrap();
        let p = &outcome.products[0];
        assert_eq!(p.name, "Iphone 11 Vitrine");
        assert_eq!(p.price, Some(0.0));
        assert_eq!(p.status_id, "status2");
        assert_eq!(p.details, None);
        assert_eq!(p.brand_id, None);
        assert_eq!(p.condition_id, None);
        assert_eq!(p.supplier_id.as_deref(), Some("sup2"));
    }

    #[test]
    fn test_blank_status_defaults_to_inactive() {
        let mut catalog = seed_catalog();
        let text = format!("{HEADER}\n,Sem status,,,10,,,,,,\n");
        let outcome = import_csv(&catalog, &text).unwrap();
        assert_eq!(outcome.products.last().unwrap().status_id, "status3");

        catalog.statuses.iter_mut().for_each(|s| s.inactive = false);
        let outcome = import_csv(&catalog, &text).unwrap();
        assert_eq!(outcome.products.last().unwrap().status_id, "");
    }

    #[test]
    fn test_missing_status_column_still_defaults_new_rows() {
        let catalog = seed_catalog();
        let outcome = import_csv(&catalog, "name,price\nCabo USB-C,25\n").unwrap();
        let p = outcome.products.last().unwrap();
        assert_eq!(p.status_id, "status3");
        assert_eq!(p.category, "");
    }

    #[test]
    fn test_new_category_visible_to_later_rows() {
        let catalog = seed_catalog();
        let text = format!("{HEADER}\n,A,,Acessórios,1,,,Novo status,,,\n,B,,acessórios,2,,,novo STATUS,,,\n");
        let outcome = import_csv(&catalog, &text).unwrap();
        assert_eq!(outcome.categories.len(), catalog.categories.len() + 1);
        assert_eq!(outcome.statuses.len(), catalog.statuses.len() + 1);
        let n = outcome.products.len();
        assert_eq!(outcome.products[n - 1].category, outcome.products[n - 2].category);
        assert_eq!(outcome.products[n - 1].status_id, outcome.products[n - 2].status_id);
        assert!(outcome.products[n - 1].category.starts_with("cat_"));
    }

    #[test]
    fn test_colliding_explicit_ids_are_bumped() {
        let catalog = seed_catalog();
        let text = "id,name\n999,A\n999,B\n,C\nsku-x,D\nsku-x,E\n";
        let outcome = import_csv(&catalog, text).unwrap();
        assert_eq!(&ids(&outcome)[catalog.products.len()..], ["999", "1000", "20", "sku-x", "21"]);
    }

    #[test]
    fn test_taken_max_id_falls_back_to_sequence() {
        let catalog = seed_catalog();
        let text = "id,name\n18446744073709551615,A\n18446744073709551615,B\n";
        let outcome = import_csv(&catalog, text).unwrap();
        assert_eq!(&ids(&outcome)[catalog.products.len()..], ["18446744073709551615", "20"]);
    }

    #[test]
    fn test_exhausted_sequence_fails_the_batch() {
        let mut catalog = seed_catalog();
        catalog.products[0].id = "18446744073709551615".into();
        assert!(matches!(import_csv(&catalog, "id,name\n,A\n"), Err(CatalogError::Validation(_))));
        let merged = import_csv(&catalog, "id,name\n18446744073709551615,A\n").unwrap();
        assert_eq!(merged.merged, 1);
    }

    #[test]
    fn test_broken_batch_leaves_catalog_untouched() {
        let catalog = seed_catalog();
        let before = catalog.clone();
        let text = format!("{HEADER}\n,Phone A,,Nova,100,,,,,Acme,\n,Phone B,,Nova,12\n0,,,,,,\n");
        assert!(matches!(import_csv(&catalog, &text), Err(CatalogError::Parse { .. })));
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_export_then_import_is_a_no_op_merge() {
        let catalog = seed_catalog();
        let text = csv_codec::encode_products(&catalog).unwrap();
        let outcome = import_csv(&catalog, &text).unwrap();
        assert_eq!(outcome.merged, catalog.products.len());
        assert_eq!(outcome.appended, 0);
        assert_eq!(outcome.created_references(), 0);
        assert_eq!(outcome.products, catalog.products);
    }
}
