//! Aggregates module
pub mod product;
pub mod reference;
pub mod banner;
pub mod page;
pub mod store_config;

pub use product::{Product, ProductDraft, ProductPatch};
pub use reference::{Brand, Category, CategoryPatch, Condition, NewCategory, NewReference, NewStatus, ReferenceEntity, ReferencePatch, Status, StatusPatch, Supplier};
pub use banner::{Banner, BannerDraft, BannerPatch, TextPosition};
pub use page::{Page, PageDraft, PagePatch};
pub use store_config::{AnnouncementBar, BrandColors, MenuItem, MenuItemType, StoreConfig};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind { Product, Category, Brand, Condition, Status, Supplier, Banner, Page }

impl EntityKind {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Product => "prod",
            Self::Category => "cat",
            Self::Brand => "brand",
            Self::Condition => "cond",
            Self::Status => "status",
            Self::Supplier => "sup",
            Self::Banner => "banner",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Product => "Product",
            Self::Category => "Category",
            Self::Brand => "Brand",
            Self::Condition => "Condition",
            Self::Status => "Status",
            Self::Supplier => "Supplier",
            Self::Banner => "Banner",
            Self::Page => "Page",
        };
        f.write_str(label)
    }
}

/// Anything stored in a flat collection under a unique string id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A reference entity that can be looked up and created by display name.
pub trait NamedEntity: Identified + Clone {
    fn name(&self) -> &str;
    fn with_name(id: String, name: String) -> Self;
}

/// `prefix_<unix millis>_<9 random chars>`, used for every non-product entity.
pub fn generate_id(kind: EntityKind) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{}_{}_{}", kind.id_prefix(), Utc::now().timestamp_millis(), suffix)
}

/// Overwrites an optional text field from a patch value; an empty value clears it.
pub(crate) fn assign_optional(target: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *target = if v.is_empty() { None } else { Some(v) };
    }
}
