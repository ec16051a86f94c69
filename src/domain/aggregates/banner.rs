//! Promotional banners shown on the storefront slider.

use serde::{Deserialize, Serialize};
use validator::Validate;
use super::{assign_optional, Identified};
use crate::domain::value_objects::HexColor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    #[default]
    CenterCenter,
    BottomLeft,
    BottomCenter,
    TopLeft,
    TopCenter,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub image_url: String,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<HexColor>,
    #[serde(default)]
    pub text_position: TextPosition,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BannerDraft {
    #[validate(length(min = 1, message = "image is required"))]
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub text_color: Option<HexColor>,
    #[serde(default)]
    pub text_position: TextPosition,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BannerPatch {
    pub image_url: Option<String>,
    pub alt_text: Option<String>,
    pub link_url: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub text_color: Option<HexColor>,
    pub text_position: Option<TextPosition>,
}

impl Identified for Banner { fn id(&self) -> &str { &self.id } }

impl Banner {
    pub fn from_draft(id: impl Into<String>, draft: BannerDraft) -> Self {
        let mut banner = Self {
            id: id.into(), image_url: draft.image_url, alt_text: draft.alt_text, link_url: None,
            title: draft.title, subtitle: draft.subtitle, text_color: draft.text_color, text_position: draft.text_position,
        };
        assign_optional(&mut banner.link_url, draft.link_url);
        banner
    }

    pub fn apply(&mut self, patch: BannerPatch) {
        if let Some(v) = patch.image_url { self.image_url = v; }
        if let Some(v) = patch.alt_text { self.alt_text = v; }
        if let Some(v) = patch.title { self.title = v; }
        if let Some(v) = patch.subtitle { self.subtitle = v; }
        if let Some(v) = patch.text_position { self.text_position = v; }
        if patch.text_color.is_some() { self.text_color = patch.text_color; }
        assign_optional(&mut self.link_url, patch.link_url);
    }
}
