//! Static content pages.

use serde::{Deserialize, Serialize};
use validator::Validate;
use super::Identified;
use crate::domain::value_objects::Slug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub slug: Slug,
    /// Raw HTML.
    pub content: String,
    pub is_visible: bool,
}

/// A missing or blank slug is derived from the title.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PageDraft {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
}

fn visible_by_default() -> bool { true }

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PagePatch {
    pub title: Option<String>,
    pub slug: Option<Slug>,
    pub content: Option<String>,
    pub is_visible: Option<bool>,
}

impl Identified for Page { fn id(&self) -> &str { &self.id } }

impl Page {
    pub fn apply(&mut self, patch: PagePatch) {
        if let Some(v) = patch.title { self.title = v; }
        if let Some(v) = patch.slug { self.slug = v; }
        if let Some(v) = patch.content { self.content = v; }
        if let Some(v) = patch.is_visible { self.is_visible = v; }
    }
}
