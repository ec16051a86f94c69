//! Product Aggregate

use serde::{Deserialize, Serialize};
use validator::Validate;
use super::{assign_optional, Identified};
use crate::domain::pricing::{self, FinancialField, Financials};
use crate::domain::value_objects::ExchangeRate;

/// Catalog product. Foreign keys are plain ids and may dangle after the
/// referenced entity is deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Category id.
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    #[serde(default, rename = "costUSD", skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, rename = "costBRL", skip_serializing_if = "Option::is_none")]
    pub cost_brl: Option<f64>,
    /// Percentage over cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<f64>,
    #[serde(default, rename = "profitBRL", skip_serializing_if = "Option::is_none")]
    pub profit_brl: Option<f64>,
}

/// Payload for creating a product; the id is assigned by the store.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<f64>,
    pub details: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status_id: String,
    pub condition_id: Option<String>,
    pub brand_id: Option<String>,
    pub reference: Option<String>,
    pub supplier_id: Option<String>,
    #[serde(rename = "costUSD")]
    pub cost_usd: Option<f64>,
    #[serde(rename = "costBRL")]
    pub cost_brl: Option<f64>,
    pub markup: Option<f64>,
    #[serde(rename = "profitBRL")]
    pub profit_brl: Option<f64>,
}

/// Partial update. `None` leaves a field untouched; an empty string clears an
/// optional text field.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub details: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status_id: Option<String>,
    pub condition_id: Option<String>,
    pub brand_id: Option<String>,
    pub reference: Option<String>,
    pub supplier_id: Option<String>,
    #[serde(rename = "costUSD")]
    pub cost_usd: Option<f64>,
    #[serde(rename = "costBRL")]
    pub cost_brl: Option<f64>,
    pub markup: Option<f64>,
    #[serde(rename = "profitBRL")]
    pub profit_brl: Option<f64>,
}

impl Identified for Product { fn id(&self) -> &str { &self.id } }

impl Product {
    pub fn from_draft(id: impl Into<String>, draft: ProductDraft) -> Self {
        let mut product = Self {
            id: id.into(), name: draft.name, category: draft.category, price: draft.price,
            image_url: draft.image_url, status_id: draft.status_id,
            cost_usd: draft.cost_usd, cost_brl: draft.cost_brl, markup: draft.markup, profit_brl: draft.profit_brl,
            ..Self::default()
        };
        assign_optional(&mut product.details, draft.details);
        assign_optional(&mut product.description, draft.description);
        assign_optional(&mut product.condition_id, draft.condition_id);
        assign_optional(&mut product.brand_id, draft.brand_id);
        assign_optional(&mut product.reference, draft.reference);
        assign_optional(&mut product.supplier_id, draft.supplier_id);
        product
    }

    /// Field-by-field merge of `patch` onto this record.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(v) = patch.name { self.name = v; }
        if let Some(v) = patch.category { self.category = v; }
        if let Some(v) = patch.image_url { self.image_url = v; }
        if let Some(v) = patch.status_id { self.status_id = v; }
        assign_optional(&mut self.details, patch.details);
        assign_optional(&mut self.description, patch.description);
        assign_optional(&mut self.condition_id, patch.condition_id);
        assign_optional(&mut self.brand_id, patch.brand_id);
        assign_optional(&mut self.reference, patch.reference);
        assign_optional(&mut self.supplier_id, patch.supplier_id);
        if patch.price.is_some() { self.price = patch.price; }
        if patch.cost_usd.is_some() { self.cost_usd = patch.cost_usd; }
        if patch.cost_brl.is_some() { self.cost_brl = patch.cost_brl; }
        if patch.markup.is_some() { self.markup = patch.markup; }
        if patch.profit_brl.is_some() { self.profit_brl = patch.profit_brl; }
    }

    /// Numeric view of the financial fields; missing values read as 0.
    pub fn financials(&self) -> Financials {
        Financials {
            cost_usd: self.cost_usd.unwrap_or(0.0),
            cost_brl: self.cost_brl.unwrap_or(0.0),
            markup: self.markup.unwrap_or(0.0),
            price: self.price.unwrap_or(0.0),
            profit_brl: self.profit_brl.unwrap_or(0.0),
        }
    }

    pub fn set_financials(&mut self, f: Financials) {
        self.cost_usd = Some(f.cost_usd);
        self.cost_brl = Some(f.cost_brl);
        self.markup = Some(f.markup);
        self.price = Some(f.price);
        self.profit_brl = Some(f.profit_brl);
    }

    /// Sets `field` to `value` and re-derives the other financial fields.
    /// Without a rate only the edited field changes.
    pub fn edit_financial(&mut self, field: FinancialField, value: f64, rate: Option<ExchangeRate>) {
        let mut current = self.financials();
        current.set(field, value);
        match rate {
            Some(_) => self.set_financials(pricing::recalculate(current, field, rate)),
            None => match field {
                FinancialField::CostUsd => self.cost_usd = Some(value),
                FinancialField::CostBrl => self.cost_brl = Some(value),
                FinancialField::Markup => self.markup = Some(value),
                FinancialField::Price => self.price = Some(value),
                FinancialField::ProfitBrl => self.profit_brl = Some(value),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: "10".into(), name: "Iphone 11 128GB".into(), category: "cat3".into(), price: Some(1695.0),
            status_id: "status1".into(), brand_id: Some("brand1".into()), details: Some("Bateria 85%".into()),
            ..Product::default()
        }
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut p = sample();
        p.apply(ProductPatch { price: Some(1500.0), brand_id: Some(String::new()), ..ProductPatch::default() });
        assert_eq!(p.price, Some(1500.0));
        assert_eq!(p.brand_id, None);
        assert_eq!(p.name, "Iphone 11 128GB");
        assert_eq!(p.details.as_deref(), Some("Bateria 85%"));
    }

    #[test]
    fn test_serde_uses_storefront_field_names() {
        let mut p = sample();
        p.cost_usd = Some(250.0);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["costUSD"], 250.0);
        assert_eq!(json["statusId"], "status1");
        assert!(json.get("costBRL").is_none());
        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_edit_financial_with_rate() {
        let mut p = sample();
        p.edit_financial(FinancialField::CostUsd, 100.0, Some(ExchangeRate::new(5.0).unwrap()));
        assert_eq!(p.cost_brl, Some(500.0));
        assert_eq!(p.price, Some(500.0));
        assert_eq!(p.profit_brl, Some(0.0));
    }

    #[test]
    fn test_edit_financial_without_rate_only_sets_field() {
        let mut p = sample();
        p.edit_financial(FinancialField::CostUsd, 100.0, None);
        assert_eq!(p.cost_usd, Some(100.0));
        assert_eq!(p.cost_brl, None);
        assert_eq!(p.price, Some(1695.0));
    }
}
