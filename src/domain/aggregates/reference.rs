//! Reference entities: named lookup records referenced by products.

use serde::{Deserialize, Serialize};
use validator::Validate;
use super::{Identified, NamedEntity};

/// Shared shape of brands, conditions and suppliers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntity { pub id: String, pub name: String }

pub type Brand = ReferenceEntity;
pub type Condition = ReferenceEntity;
pub type Supplier = ReferenceEntity;

/// Categories form a tree through `parent_id`. Nothing here prevents cycles;
/// see [`crate::domain::category_tree`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Product status. `inactive` marks the status that hides products from the
/// storefront and is the import default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inactive: bool,
}

impl Identified for ReferenceEntity { fn id(&self) -> &str { &self.id } }
impl NamedEntity for ReferenceEntity {
    fn name(&self) -> &str { &self.name }
    fn with_name(id: String, name: String) -> Self { Self { id, name } }
}

impl Identified for Category { fn id(&self) -> &str { &self.id } }
impl NamedEntity for Category {
    fn name(&self) -> &str { &self.name }
    fn with_name(id: String, name: String) -> Self { Self { id, name, parent_id: None } }
}

impl Identified for Status { fn id(&self) -> &str { &self.id } }
impl NamedEntity for Status {
    fn name(&self) -> &str { &self.name }
    fn with_name(id: String, name: String) -> Self { Self { id, name, inactive: false } }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewReference {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewCategory {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewStatus {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferencePatch { pub name: Option<String> }

/// `parent_id: Some("")` detaches the category to the root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CategoryPatch { pub name: Option<String>, pub parent_id: Option<String> }

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusPatch { pub name: Option<String>, pub inactive: Option<bool> }

impl ReferenceEntity {
    pub fn apply(&mut self, patch: ReferencePatch) {
        if let Some(name) = patch.name { self.name = name; }
    }
}

impl Category {
    pub fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name { self.name = name; }
        super::assign_optional(&mut self.parent_id, patch.parent_id);
    }
}

impl Status {
    pub fn apply(&mut self, patch: StatusPatch) {
        if let Some(name) = patch.name { self.name = name; }
        if let Some(inactive) = patch.inactive { self.inactive = inactive; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_category_patch_detaches_parent() {
        let mut c = Category { id: "cat2".into(), name: "iPhone".into(), parent_id: Some("cat1".into()) };
        c.apply(CategoryPatch { name: None, parent_id: Some(String::new()) });
        assert_eq!(c.parent_id, None);
        assert_eq!(c.name, "iPhone");
    }
    #[test]
    fn test_patch_rejects_unknown_fields() {
        assert!(serde_json::from_str::<StatusPatch>(r#"{"name":"x","color":"red"}"#).is_err());
        let patch: StatusPatch = serde_json::from_str(r#"{"inactive":true}"#).unwrap();
        let mut s = Status::with_name("s1".into(), "Inativo".into());
        s.apply(patch);
        assert!(s.inactive);
    }
    #[test]
    fn test_new_reference_requires_name() {
        assert!(NewReference { name: String::new() }.validate().is_err());
        assert!(NewReference { name: "Apple".into() }.validate().is_ok());
    }
}
