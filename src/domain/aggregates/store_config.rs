//! Store-wide configuration singleton.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use super::Page;
use crate::domain::value_objects::HexColor;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub store_name: String,
    pub slogan: String,
    pub logo_url: String,
    pub address: String,
    pub whatsapp_number: String,
    pub instagram_handle: String,
    pub colors: BrandColors,
    pub font: String,
    pub announcement_bar: AnnouncementBar,
    #[serde(default)]
    pub header_menu: Vec<MenuItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors { pub primary: HexColor, pub secondary: HexColor }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementBar { pub text: String, pub enabled: bool }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemType { Home, Page, Link }

/// `value` is `/` for home, a page id for page, and a URL for link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: MenuItemType,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuError { DuplicateId(String), EmptyLabel(String), UnknownPage { item: String, page: String } }
impl std::error::Error for MenuError {}
impl std::fmt::Display for MenuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate menu item id '{}'", id),
            Self::EmptyLabel(id) => write!(f, "menu item '{}' has an empty label", id),
            Self::UnknownPage { item, page } => write!(f, "menu item '{}' points at unknown page '{}'", item, page),
        }
    }
}

impl StoreConfig {
    /// Checks the header menu against the current pages. Pages deleted later
    /// leave the item dangling; renderers skip it.
    pub fn validate_menu(&self, pages: &[Page]) -> Result<(), MenuError> {
        let mut seen = HashSet::new();
        for item in &self.header_menu {
            if !seen.insert(item.id.as_str()) { return Err(MenuError::DuplicateId(item.id.clone())); }
            if item.label.trim().is_empty() { return Err(MenuError::EmptyLabel(item.id.clone())); }
            if item.kind == MenuItemType::Page && !pages.iter().any(|p| p.id == item.value) {
                return Err(MenuError::UnknownPage { item: item.id.clone(), page: item.value.clone() });
            }
        }
        Ok(())
    }
}
