//! Catalog state and the operations over whole collections.

pub mod csv_codec;
pub mod reconcile;
pub mod seed;
pub mod store;

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Banner, Brand, Category, Condition, Page, Product, Status, StoreConfig, Supplier};
use crate::{CatalogError, Result};

/// Product ids are sequential integers starting here.
pub const FIRST_PRODUCT_ID: u64 = 10;

/// Every collection of the store plus its configuration. This is the unit
/// that is snapshotted to disk and swapped wholesale on import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub brands: Vec<Brand>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub banners: Vec<Banner>,
    #[serde(default)]
    pub pages: Vec<Page>,
    pub config: StoreConfig,
}

impl Catalog {
    /// Id of the first status flagged inactive, if any.
    pub fn inactive_status_id(&self) -> Option<&str> {
        self.statuses.iter().find(|s| s.inactive).map(|s| s.id.as_str())
    }

    pub fn next_product_id(&self) -> Result<String> {
        next_product_number(self.products.iter().map(|p| p.id.as_str()))
            .map(|n| n.to_string())
            .ok_or_else(id_sequence_exhausted)
    }
}

/// One past the largest numeric id, never below [`FIRST_PRODUCT_ID`].
/// Non-numeric ids are ignored. `None` once `u64::MAX` is in use.
pub fn next_product_number<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<u64> {
    ids.into_iter()
        .filter_map(|id| id.trim().parse::<u64>().ok())
        .fold(FIRST_PRODUCT_ID - 1, u64::max)
        .checked_add(1)
}

pub(crate) fn id_sequence_exhausted() -> CatalogError {
    CatalogError::Validation("product id sequence exhausted".into())
}
