//! Catalog events
use crate::domain::aggregates::EntityKind;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CatalogEvent {
    Added { kind: EntityKind, id: String },
    Updated { kind: EntityKind, id: String },
    Deleted { kind: EntityKind, id: String },
    /// A reference entity created on the fly while importing.
    ReferenceCreated { kind: EntityKind, id: String, name: String },
    ProductMerged { product_id: String },
    ProductAppended { product_id: String },
    ProductsImported { merged: usize, appended: usize },
    /// The whole product collection was saved at once.
    ProductsReplaced { count: usize },
    ConfigReplaced,
}
