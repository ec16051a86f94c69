//! In-memory catalog store.
//!
//! Owns the [`Catalog`] and applies every admin mutation to it. Imports are
//! computed against the current state and swapped in only when the whole
//! batch succeeded. Callers serialize access (the HTTP layer holds it behind
//! a write lock), so at most one import runs against a collection at a time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

use crate::catalog::{csv_codec, id_sequence_exhausted, next_product_number, reconcile, Catalog};
use crate::domain::aggregates::{
    generate_id, Banner, BannerDraft, BannerPatch, Category, CategoryPatch, EntityKind, Identified, NamedEntity, NewCategory, NewReference, NewStatus, Page,
    PageDraft, PagePatch, Product, ProductDraft, ProductPatch, ReferenceEntity, ReferencePatch, Status, StatusPatch, StoreConfig,
};
use crate::domain::category_tree::{self, FlatCategory};
use crate::domain::events::CatalogEvent;
use crate::domain::pricing::FinancialField;
use crate::domain::registry;
use crate::domain::value_objects::{ExchangeRate, Slug};
use crate::{CatalogError, Result};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontQuery { pub page: Option<u32>, pub per_page: Option<u32>, pub category: Option<String>, pub search: Option<String> }

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter { pub search: Option<String>, pub category: Option<String>, pub status: Option<String>, pub brand: Option<String> }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> { pub data: Vec<T>, pub total: usize, pub page: u32, pub per_page: u32 }

/// Product with its references resolved to display names. A dangling id
/// resolves to `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub status_name: Option<String>,
    pub condition_name: Option<String>,
    pub brand_name: Option<String>,
    pub supplier_name: Option<String>,
}

/// Product fields that can be set on a selection at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkField { Category, Status, Brand, Condition, Supplier }

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary { pub merged: usize, pub appended: usize, pub created_references: usize, pub total_products: usize }

pub struct CatalogStore {
    catalog: Catalog,
    rate: Option<ExchangeRate>,
    events: Vec<CatalogEvent>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog, rate: Option<ExchangeRate>) -> Self {
        Self { catalog, rate, events: Vec::new() }
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn rate(&self) -> Option<ExchangeRate> { self.rate }
    pub fn set_rate(&mut self, rate: Option<ExchangeRate>) { self.rate = rate; }
    pub fn take_events(&mut self) -> Vec<CatalogEvent> { std::mem::take(&mut self.events) }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub fn get_product(&self, id: &str) -> Result<&Product> {
        self.catalog.products.iter().find(|p| p.id == id).ok_or_else(|| not_found(EntityKind::Product, id))
    }

    pub fn product_view(&self, id: &str) -> Result<ProductView> {
        self.get_product(id).map(|p| self.view(p))
    }

    /// Admin listing: name substring plus optional exact category, status
    /// and brand filters.
    pub fn list_products(&self, filter: &ProductFilter) -> Vec<Product> {
        let search = filter.search.as_deref().map(str::to_lowercase).unwrap_or_default();
        let matches = |wanted: &Option<String>, actual: Option<&str>| match wanted.as_deref() {
            Some(w) if !w.is_empty() => actual == Some(w),
            _ => true,
        };
        self.catalog
            .products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&search))
            .filter(|p| matches(&filter.category, Some(p.category.as_str())))
            .filter(|p| matches(&filter.status, Some(p.status_id.as_str())))
            .filter(|p| matches(&filter.brand, p.brand_id.as_deref()))
            .cloned()
            .collect()
    }

    /// Public listing: products with the inactive status are hidden.
    pub fn storefront(&self, query: &StorefrontQuery) -> Paginated<ProductView> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let hidden = self.catalog.inactive_status_id();
        let search = query.search.as_deref().map(str::to_lowercase).unwrap_or_default();
        let category = query.category.as_deref().filter(|c| !c.is_empty());

        let visible: Vec<&Product> = self
            .catalog
            .products
            .iter()
            .filter(|p| hidden != Some(p.status_id.as_str()))
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| p.name.to_lowercase().contains(&search))
            .collect();
        let total = visible.len();
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let data = visible.into_iter().skip(skip).take(per_page as usize).map(|p| self.view(p)).collect();
        Paginated { data, total, page, per_page }
    }

    pub fn next_product_id(&self) -> Result<String> { self.catalog.next_product_id() }

    pub fn add_product(&mut self, draft: ProductDraft) -> Result<Product> {
        validated(&draft)?;
        let product = Product::from_draft(self.next_product_id()?, draft);
        self.catalog.products.push(product.clone());
        self.events.push(CatalogEvent::Added { kind: EntityKind::Product, id: product.id.clone() });
        Ok(product)
    }

    pub fn update_product(&mut self, id: &str, patch: ProductPatch) -> Result<Product> {
        ensure_name(patch.name.as_deref())?;
        let product = find_mut(&mut self.catalog.products, EntityKind::Product, id)?;
        product.apply(patch);
        let updated = product.clone();
        self.events.push(CatalogEvent::Updated { kind: EntityKind::Product, id: id.to_string() });
        Ok(updated)
    }

    pub fn delete_product(&mut self, id: &str) -> Result<()> {
        remove(&mut self.catalog.products, EntityKind::Product, id)?;
        self.events.push(CatalogEvent::Deleted { kind: EntityKind::Product, id: id.to_string() });
        Ok(())
    }

    /// Replaces the whole product collection with an edited copy. Products
    /// without an id get the next sequential ids; duplicate ids are rejected.
    pub fn replace_products(&mut self, mut products: Vec<Product>) -> Result<()> {
        let mut next = next_product_number(self.catalog.products.iter().chain(products.iter()).map(|p| p.id.as_str()));
        let mut seen = HashSet::new();
        for p in products.iter_mut() {
            if p.id.trim().is_empty() {
                let n = next.ok_or_else(id_sequence_exhausted)?;
                p.id = n.to_string();
                next = n.checked_add(1);
            }
            if !seen.insert(p.id.clone()) {
                return Err(CatalogError::Validation(format!("duplicate product id '{}'", p.id)));
            }
        }
        info!(count = products.len(), "product collection replaced");
        self.events.push(CatalogEvent::ProductsReplaced { count: products.len() });
        self.catalog.products = products;
        Ok(())
    }

    /// Sets one reference field on every selected product; returns how many
    /// products were touched.
    pub fn bulk_assign(&mut self, ids: &[String], field: BulkField, value: &str) -> Result<usize> {
        if value.trim().is_empty() {
            return Err(CatalogError::Validation("bulk value is required".into()));
        }
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut touched = 0;
        for p in self.catalog.products.iter_mut().filter(|p| selected.contains(p.id.as_str())) {
            match field {
                BulkField::Category => p.category = value.to_string(),
                BulkField::Status => p.status_id = value.to_string(),
                BulkField::Brand => p.brand_id = Some(value.to_string()),
                BulkField::Condition => p.condition_id = Some(value.to_string()),
                BulkField::Supplier => p.supplier_id = Some(value.to_string()),
            }
            touched += 1;
            self.events.push(CatalogEvent::Updated { kind: EntityKind::Product, id: p.id.clone() });
        }
        Ok(touched)
    }

    pub fn bulk_delete(&mut self, ids: &[String]) -> usize {
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = self.catalog.products.len();
        let events = &mut self.events;
        self.catalog.products.retain(|p| {
            let keep = !selected.contains(p.id.as_str());
            if !keep { events.push(CatalogEvent::Deleted { kind: EntityKind::Product, id: p.id.clone() }); }
            keep
        });
        before - self.catalog.products.len()
    }

    /// Applies a single financial field edit and re-derives the rest using
    /// the store's exchange rate.
    pub fn edit_financials(&mut self, id: &str, field: FinancialField, value: f64) -> Result<Product> {
        let rate = self.rate;
        let product = find_mut(&mut self.catalog.products, EntityKind::Product, id)?;
        product.edit_financial(field, value, rate);
        let updated = product.clone();
        self.events.push(CatalogEvent::Updated { kind: EntityKind::Product, id: id.to_string() });
        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub fn categories(&self) -> &[Category] { &self.catalog.categories }

    pub fn category_tree(&self) -> Vec<FlatCategory> { category_tree::flatten_hierarchy(&self.catalog.categories) }

    pub fn add_category(&mut self, new: NewCategory) -> Result<Category> {
        validated(&new)?;
        let parent_id = new.parent_id.filter(|p| !p.is_empty());
        if let Some(parent) = &parent_id {
            self.ensure_category(parent)?;
        }
        let category = Category { id: generate_id(EntityKind::Category), name: new.name.trim().to_string(), parent_id };
        self.catalog.categories.push(category.clone());
        self.events.push(CatalogEvent::Added { kind: EntityKind::Category, id: category.id.clone() });
        Ok(category)
    }

    pub fn update_category(&mut self, id: &str, patch: CategoryPatch) -> Result<Category> {
        ensure_name(patch.name.as_deref())?;
        if let Some(parent) = patch.parent_id.as_deref().filter(|p| !p.is_empty()) {
            self.ensure_category(parent)?;
            if category_tree::would_create_cycle(&self.catalog.categories, id, parent) {
                warn!(category_id = id, parent_id = parent, "rejected category parent change that would create a cycle");
                return Err(CatalogError::CategoryCycle { id: id.to_string(), parent_id: parent.to_string() });
            }
        }
        let category = find_mut(&mut self.catalog.categories, EntityKind::Category, id)?;
        category.apply(patch);
        let updated = category.clone();
        self.events.push(CatalogEvent::Updated { kind: EntityKind::Category, id: id.to_string() });
        Ok(updated)
    }

    /// Products and child categories keep the now-dangling id.
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        remove(&mut self.catalog.categories, EntityKind::Category, id)?;
        self.events.push(CatalogEvent::Deleted { kind: EntityKind::Category, id: id.to_string() });
        Ok(())
    }

    fn ensure_category(&self, id: &str) -> Result<()> {
        if self.catalog.categories.iter().any(|c| c.id == id) { Ok(()) } else { Err(not_found(EntityKind::Category, id)) }
    }

    // -------------------------------------------------------------------------
    // Statuses
    // -------------------------------------------------------------------------

    pub fn statuses(&self) -> &[Status] { &self.catalog.statuses }

    /// Returns the existing status when one with the same name exists.
    pub fn add_status(&mut self, new: NewStatus) -> Result<Status> {
        validated(&new)?;
        let (mut status, created) = registry::add_if_absent(&mut self.catalog.statuses, EntityKind::Status, new.name.trim());
        if created {
            if new.inactive {
                let stored = find_mut(&mut self.catalog.statuses, EntityKind::Status, &status.id)?;
                stored.inactive = true;
                status.inactive = true;
            }
            self.events.push(CatalogEvent::Added { kind: EntityKind::Status, id: status.id.clone() });
        }
        Ok(status)
    }

    pub fn update_status(&mut self, id: &str, patch: StatusPatch) -> Result<Status> {
        ensure_name(patch.name.as_deref())?;
        let status = find_mut(&mut self.catalog.statuses, EntityKind::Status, id)?;
        status.apply(patch);
        let updated = status.clone();
        self.events.push(CatalogEvent::Updated { kind: EntityKind::Status, id: id.to_string() });
        Ok(updated)
    }

    pub fn delete_status(&mut self, id: &str) -> Result<()> {
        remove(&mut self.catalog.statuses, EntityKind::Status, id)?;
        self.events.push(CatalogEvent::Deleted { kind: EntityKind::Status, id: id.to_string() });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Brands, conditions, suppliers
    // -------------------------------------------------------------------------

    pub fn references(&self, kind: EntityKind) -> Result<&[ReferenceEntity]> {
        match kind {
            EntityKind::Brand => Ok(&self.catalog.brands),
            EntityKind::Condition => Ok(&self.catalog.conditions),
            EntityKind::Supplier => Ok(&self.catalog.suppliers),
            other => Err(CatalogError::Validation(format!("{other} is not a plain reference collection"))),
        }
    }

    fn references_mut(&mut self, kind: EntityKind) -> Result<&mut Vec<ReferenceEntity>> {
        match kind {
            EntityKind::Brand => Ok(&mut self.catalog.brands),
            EntityKind::Condition => Ok(&mut self.catalog.conditions),
            EntityKind::Supplier => Ok(&mut self.catalog.suppliers),
            other => Err(CatalogError::Validation(format!("{other} is not a plain reference collection"))),
        }
    }

    /// Find-or-create by name.
    pub fn add_reference(&mut self, kind: EntityKind, new: NewReference) -> Result<ReferenceEntity> {
        validated(&new)?;
        let (entity, created) = registry::add_if_absent(self.references_mut(kind)?, kind, new.name.trim());
        if created {
            self.events.push(CatalogEvent::Added { kind, id: entity.id.clone() });
        }
        Ok(entity)
    }

    pub fn update_reference(&mut self, kind: EntityKind, id: &str, patch: ReferencePatch) -> Result<ReferenceEntity> {
        ensure_name(patch.name.as_deref())?;
        let entity = find_mut(self.references_mut(kind)?, kind, id)?;
        entity.apply(patch);
        let updated = entity.clone();
        self.events.push(CatalogEvent::Updated { kind, id: id.to_string() });
        Ok(updated)
    }

    pub fn delete_reference(&mut self, kind: EntityKind, id: &str) -> Result<()> {
        remove(self.references_mut(kind)?, kind, id)?;
        self.events.push(CatalogEvent::Deleted { kind, id: id.to_string() });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Banners
    // -------------------------------------------------------------------------

    pub fn banners(&self) -> &[Banner] { &self.catalog.banners }

    pub fn add_banner(&mut self, draft: BannerDraft) -> Result<Banner> {
        validated(&draft)?;
        let banner = Banner::from_draft(generate_id(EntityKind::Banner), draft);
        self.catalog.banners.push(banner.clone());
        self.events.push(CatalogEvent::Added { kind: EntityKind::Banner, id: banner.id.clone() });
        Ok(banner)
    }

    pub fn update_banner(&mut self, id: &str, patch: BannerPatch) -> Result<Banner> {
        let banner = find_mut(&mut self.catalog.banners, EntityKind::Banner, id)?;
        banner.apply(patch);
        let updated = banner.clone();
        self.events.push(CatalogEvent::Updated { kind: EntityKind::Banner, id: id.to_string() });
        Ok(updated)
    }

    pub fn delete_banner(&mut self, id: &str) -> Result<()> {
        remove(&mut self.catalog.banners, EntityKind::Banner, id)?;
        self.events.push(CatalogEvent::Deleted { kind: EntityKind::Banner, id: id.to_string() });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pages
    // -------------------------------------------------------------------------

    pub fn pages(&self) -> &[Page] { &self.catalog.pages }

    /// Visible page by slug; hidden pages read as missing.
    pub fn visible_page(&self, slug: &str) -> Result<&Page> {
        self.catalog
            .pages
            .iter()
            .find(|p| p.is_visible && p.slug.as_str() == slug)
            .ok_or_else(|| not_found(EntityKind::Page, slug))
    }

    pub fn add_page(&mut self, draft: PageDraft) -> Result<Page> {
        validated(&draft)?;
        let slug = match draft.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Slug::new(s),
            None => Slug::from_title(&draft.title),
        }
        .map_err(|e| CatalogError::Validation(format!("slug: {e}")))?;
        self.ensure_slug_free(&slug, None)?;
        let page = Page { id: generate_id(EntityKind::Page), title: draft.title, slug, content: draft.content, is_visible: draft.is_visible };
        self.catalog.pages.push(page.clone());
        self.events.push(CatalogEvent::Added { kind: EntityKind::Page, id: page.id.clone() });
        Ok(page)
    }

    pub fn update_page(&mut self, id: &str, patch: PagePatch) -> Result<Page> {
        if let Some(slug) = &patch.slug {
            self.ensure_slug_free(slug, Some(id))?;
        }
        let page = find_mut(&mut self.catalog.pages, EntityKind::Page, id)?;
        page.apply(patch);
        let updated = page.clone();
        self.events.push(CatalogEvent::Updated { kind: EntityKind::Page, id: id.to_string() });
        Ok(updated)
    }

    /// Menu items pointing at the page are left dangling.
    pub fn delete_page(&mut self, id: &str) -> Result<()> {
        remove(&mut self.catalog.pages, EntityKind::Page, id)?;
        self.events.push(CatalogEvent::Deleted { kind: EntityKind::Page, id: id.to_string() });
        Ok(())
    }

    fn ensure_slug_free(&self, slug: &Slug, owner: Option<&str>) -> Result<()> {
        let clash = self.catalog.pages.iter().any(|p| &p.slug == slug && Some(p.id.as_str()) != owner);
        if clash { Err(CatalogError::DuplicateSlug(slug.to_string())) } else { Ok(()) }
    }

    // -------------------------------------------------------------------------
    // Store configuration
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &StoreConfig { &self.catalog.config }

    pub fn replace_config(&mut self, config: StoreConfig) -> Result<()> {
        config.validate_menu(&self.catalog.pages).map_err(|e| CatalogError::Validation(e.to_string()))?;
        self.catalog.config = config;
        self.events.push(CatalogEvent::ConfigReplaced);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bulk CSV
    // -------------------------------------------------------------------------

    pub fn export_csv(&self) -> Result<String> { csv_codec::encode_products(&self.catalog) }

    /// Reconciles `text` against the current catalog and swaps the result in.
    /// On error nothing changes.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportSummary> {
        let outcome = reconcile::import_csv(&self.catalog, text)?;
        let summary = ImportSummary {
            merged: outcome.merged,
            appended: outcome.appended,
            created_references: outcome.created_references(),
            total_products: outcome.products.len(),
        };
        self.catalog.products = outcome.products;
        self.catalog.categories = outcome.categories;
        self.catalog.brands = outcome.brands;
        self.catalog.conditions = outcome.conditions;
        self.catalog.statuses = outcome.statuses;
        self.events.extend(outcome.events);
        Ok(summary)
    }

    fn view(&self, p: &Product) -> ProductView {
        fn name_of<T: NamedEntity>(items: &[T], id: Option<&str>) -> Option<String> {
            let id = id?;
            items.iter().find(|e| e.id() == id).map(|e| e.name().to_string())
        }
        let c = &self.catalog;
        ProductView {
            category_name: name_of(&c.categories, Some(p.category.as_str())),
            status_name: name_of(&c.statuses, Some(p.status_id.as_str())),
            condition_name: name_of(&c.conditions, p.condition_id.as_deref()),
            brand_name: name_of(&c.brands, p.brand_id.as_deref()),
            supplier_name: name_of(&c.suppliers, p.supplier_id.as_deref()),
            product: p.clone(),
        }
    }
}

// -----------------------------------------------------------------------------
// Snapshots
// -----------------------------------------------------------------------------

/// Reads a JSON snapshot; a missing file is `Ok(None)`.
pub async fn load_snapshot(path: &Path) -> Result<Option<Catalog>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CatalogError::StorageError(format!("read {}: {e}", path.display()))),
    };
    let catalog = serde_json::from_str(&text).map_err(|e| CatalogError::StorageError(format!("decode {}: {e}", path.display())))?;
    info!(path = %path.display(), "catalog snapshot loaded");
    Ok(Some(catalog))
}

pub fn encode_snapshot(catalog: &Catalog) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(catalog).map_err(|e| CatalogError::StorageError(format!("encode snapshot: {e}")))
}

/// Writes encoded snapshot bytes to a sibling temp file and renames it over
/// `path`. Callers serialize writers to the same path.
pub async fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await.map_err(|e| CatalogError::StorageError(format!("write {}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| CatalogError::StorageError(format!("rename {}: {e}", path.display())))?;
    Ok(())
}

fn validated<T: Validate>(value: &T) -> Result<()> {
    value.validate().map_err(|e| CatalogError::Validation(e.to_string()))
}

/// Patch names may be absent but never blank.
fn ensure_name(name: Option<&str>) -> Result<()> {
    match name {
        Some(n) if n.trim().is_empty() => Err(CatalogError::Validation("name: name is required".into())),
        _ => Ok(()),
    }
}

fn not_found(kind: EntityKind, id: &str) -> CatalogError {
    CatalogError::NotFound { kind, id: id.to_string() }
}

fn find_mut<'a, T: Identified>(items: &'a mut [T], kind: EntityKind, id: &str) -> Result<&'a mut T> {
    items.iter_mut().find(|e| e.id() == id).ok_or_else(|| not_found(kind, id))
}

fn remove<T: Identified>(items: &mut Vec<T>, kind: EntityKind, id: &str) -> Result<()> {
    let before = items.len();
    items.retain(|e| e.id() != id);
    if items.len() == before { Err(not_found(kind, id)) } else { Ok(()) }
}
