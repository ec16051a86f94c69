//! Price / cost / markup / profit consistency.
//!
//! Exactly one of the five numeric fields is the independent variable per
//! call; the other four are derived from it and the USD→BRL rate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::value_objects::ExchangeRate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
    #[serde(rename = "costBRL")]
    pub cost_brl: f64,
    pub markup: f64,
    pub price: f64,
    #[serde(rename = "profitBRL")]
    pub profit_brl: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinancialField {
    #[serde(rename = "costUSD")]
    CostUsd,
    #[serde(rename = "costBRL")]
    CostBrl,
    #[serde(rename = "markup")]
    Markup,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "profitBRL")]
    ProfitBrl,
}

impl FinancialField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CostUsd => "costUSD",
            Self::CostBrl => "costBRL",
            Self::Markup => "markup",
            Self::Price => "price",
            Self::ProfitBrl => "profitBRL",
        }
    }
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for FinancialField {
    type Err = UnknownFinancialField;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "costUSD" => Ok(Self::CostUsd),
            "costBRL" => Ok(Self::CostBrl),
            "markup" => Ok(Self::Markup),
            "price" => Ok(Self::Price),
            "profitBRL" => Ok(Self::ProfitBrl),
            other => Err(UnknownFinancialField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)] pub struct UnknownFinancialField(pub String);
impl std::error::Error for UnknownFinancialField {}
impl fmt::Display for UnknownFinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown financial field '{}'", self.0) }
}

impl Financials {
    pub fn get(&self, field: FinancialField) -> f64 {
        match field {
            FinancialField::CostUsd => self.cost_usd,
            FinancialField::CostBrl => self.cost_brl,
            FinancialField::Markup => self.markup,
            FinancialField::Price => self.price,
            FinancialField::ProfitBrl => self.profit_brl,
        }
    }

    pub fn set(&mut self, field: FinancialField, value: f64) {
        let slot = match field {
            FinancialField::CostUsd => &mut self.cost_usd,
            FinancialField::CostBrl => &mut self.cost_brl,
            FinancialField::Markup => &mut self.markup,
            FinancialField::Price => &mut self.price,
            FinancialField::ProfitBrl => &mut self.profit_brl,
        };
        *slot = value;
    }
}

/// Recomputes the dependent fields after `changed` was edited.
///
/// Returns `record` unchanged when no rate is available. Any non-finite
/// intermediate reads as 0, and a zero cost yields a zero markup.
pub fn recalculate(record: Financials, changed: FinancialField, rate: Option<ExchangeRate>) -> Financials {
    let Some(rate) = rate else { return record };
    let Financials { mut cost_usd, mut cost_brl, mut markup, mut price, mut profit_brl } = sanitize(record);

    match changed {
        FinancialField::CostUsd => cost_brl = finite_or_zero(cost_usd * rate.value()),
        FinancialField::CostBrl => cost_usd = finite_or_zero(cost_brl / rate.value()),
        _ => {}
    }

    match changed {
        FinancialField::CostUsd | FinancialField::CostBrl | FinancialField::Markup => {
            price = finite_or_zero(cost_brl * (1.0 + markup / 100.0));
            profit_brl = finite_or_zero(price - cost_brl);
        }
        FinancialField::ProfitBrl => {
            price = finite_or_zero(cost_brl + profit_brl);
            markup = markup_from(price, cost_brl);
        }
        FinancialField::Price => {
            profit_brl = finite_or_zero(price - cost_brl);
            markup = markup_from(price, cost_brl);
        }
    }

    Financials { cost_usd, cost_brl, markup, price, profit_brl }
}

fn markup_from(price: f64, cost_brl: f64) -> f64 {
    if cost_brl > 0.0 { finite_or_zero((price / cost_brl - 1.0) * 100.0) } else { 0.0 }
}

fn sanitize(f: Financials) -> Financials {
    Financials {
        cost_usd: finite_or_zero(f.cost_usd),
        cost_brl: finite_or_zero(f.cost_brl),
        markup: finite_or_zero(f.markup),
        price: finite_or_zero(f.price),
        profit_brl: finite_or_zero(f.profit_brl),
    }
}

fn finite_or_zero(v: f64) -> f64 { if v.is_finite() { v } else { 0.0 } }

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> Option<ExchangeRate> { Some(ExchangeRate::new(5.25).unwrap()) }
    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

    #[test]
    fn test_recompute_is_idempotent() {
        let input = Financials { cost_usd: 250.0, markup: 25.5, ..Financials::default() };
        let first = recalculate(input, FinancialField::CostUsd, rate());
        let second = recalculate(input, FinancialField::CostUsd, rate());
        assert_eq!(first, second);
        assert!(close(first.cost_brl, 1312.5));
        assert!(close(first.price, 1312.5 * 1.255));
    }

    #[test]
    fn test_markup_change_derives_price_and_profit() {
        let input = Financials { cost_brl: 1000.0, markup: 20.0, ..Financials::default() };
        let out = recalculate(input, FinancialField::Markup, rate());
        assert!(close(out.price, 1200.0));
        assert!(close(out.profit_brl, 200.0));
        assert_eq!(out.cost_brl, 1000.0);
    }

    #[test]
    fn test_zero_cost_forces_zero_markup() {
        for field in [FinancialField::Price, FinancialField::ProfitBrl] {
            let input = Financials { price: 300.0, profit_brl: 300.0, markup: 40.0, ..Financials::default() };
            let out = recalculate(input, field, rate());
            assert_eq!(out.markup, 0.0, "field {}", field);
            assert!(out.markup.is_finite());
        }
    }

    #[test]
    fn test_cost_brl_derives_cost_usd() {
        let input = Financials { cost_brl: 525.0, markup: 10.0, ..Financials::default() };
        let out = recalculate(input, FinancialField::CostBrl, rate());
        assert!(close(out.cost_usd, 100.0));
        assert!(close(out.price, 577.5));
        assert!(close(out.profit_brl, 52.5));
    }

    #[test]
    fn test_price_and_profit_derive_markup() {
        let base = Financials { cost_brl: 1000.0, ..Financials::default() };
        let by_price = recalculate(Financials { price: 1500.0, ..base }, FinancialField::Price, rate());
        assert!(close(by_price.profit_brl, 500.0));
        assert!(close(by_price.markup, 50.0));
        let by_profit = recalculate(Financials { profit_brl: 250.0, ..base }, FinancialField::ProfitBrl, rate());
        assert!(close(by_profit.price, 1250.0));
        assert!(close(by_profit.markup, 25.0));
    }

    #[test]
    fn test_no_rate_leaves_record_unchanged() {
        let input = Financials { cost_usd: 10.0, cost_brl: 1.0, markup: 3.0, price: 4.0, profit_brl: 5.0 };
        assert_eq!(recalculate(input, FinancialField::CostUsd, None), input);
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!("costUSD".parse::<FinancialField>().unwrap(), FinancialField::CostUsd);
        assert_eq!("profitBRL".parse::<FinancialField>().unwrap(), FinancialField::ProfitBrl);
        assert!("stock".parse::<FinancialField>().is_err());
        assert_eq!(serde_json::to_string(&FinancialField::CostBrl).unwrap(), "\"costBRL\"");
    }
}
