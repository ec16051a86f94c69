//! Reference registry: find-or-create of named lookup entities.

use std::collections::HashMap;
use tracing::debug;
use crate::domain::aggregates::{generate_id, EntityKind, NamedEntity};

/// Case-insensitive exact match on `name`; first match wins.
pub fn find_by_name<'a, T: NamedEntity>(collection: &'a [T], name: &str) -> Option<&'a T> {
    let wanted = name.to_lowercase();
    collection.iter().find(|e| e.name().to_lowercase() == wanted)
}

/// Returns the entity named `name`, appending a new one when none matches.
/// The flag is `true` when the entity was created by this call.
pub fn add_if_absent<T: NamedEntity>(collection: &mut Vec<T>, kind: EntityKind, name: &str) -> (T, bool) {
    if let Some(existing) = find_by_name(collection, name) {
        return (existing.clone(), false);
    }
    let entity = T::with_name(generate_id(kind), name.to_string());
    collection.push(entity.clone());
    debug!(%kind, id = entity.id(), name, "reference entity created");
    (entity, true)
}

/// Outcome of resolving a display name through a [`NameIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub id: String,
    pub created: bool,
}

/// Lowercased name → id cache over one collection, seeded from the existing
/// entities and updated on every creation so later rows of the same batch
/// see entities created by earlier ones.
#[derive(Clone, Debug)]
pub struct NameIndex {
    kind: EntityKind,
    ids: HashMap<String, String>,
}

impl NameIndex {
    pub fn new<T: NamedEntity>(kind: EntityKind, collection: &[T]) -> Self {
        let mut ids = HashMap::with_capacity(collection.len());
        for entity in collection {
            ids.entry(entity.name().to_lowercase()).or_insert_with(|| entity.id().to_string());
        }
        Self { kind, ids }
    }

    pub fn kind(&self) -> EntityKind { self.kind }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.ids.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Resolves `name` to an id, creating the entity in `collection` on a miss.
    /// Blank names resolve to nothing.
    pub fn resolve<T: NamedEntity>(&mut self, collection: &mut Vec<T>, name: &str) -> Option<Resolved> {
        let name = name.trim();
        if name.is_empty() { return None; }
        if let Some(id) = self.lookup(name) {
            return Some(Resolved { id: id.to_string(), created: false });
        }
        let entity = T::with_name(generate_id(self.kind), name.to_string());
        let id = entity.id().to_string();
        collection.push(entity);
        self.ids.insert(name.to_lowercase(), id.clone());
        debug!(kind = %self.kind, id = %id, name, "reference entity created during import");
        Some(Resolved { id, created: true })
    }
}
