//! Process configuration read from the environment.

use std::path::PathBuf;
use tracing::warn;
use crate::domain::value_objects::ExchangeRate;

pub const DEFAULT_PORT: u16 = 8083;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    /// USD to BRL rate used for financial recomputation.
    pub exchange_rate: ExchangeRate,
    /// JSON snapshot file; `None` keeps the catalog in memory only.
    pub snapshot_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Invalid values are logged and
    /// replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let exchange_rate = match lookup("USD_BRL_RATE") {
            Some(raw) => raw
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .and_then(|v| ExchangeRate::new(v).ok())
                .unwrap_or_else(|| {
                    warn!(value = %raw, "invalid USD_BRL_RATE, using fallback rate");
                    ExchangeRate::fallback()
                }),
            None => ExchangeRate::fallback(),
        };
        let snapshot_path = lookup("CATALOG_SNAPSHOT").filter(|p| !p.trim().is_empty()).map(PathBuf::from);
        Self { port, exchange_rate, snapshot_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.port, 8083);
        assert_eq!(c.exchange_rate.value(), 5.25);
        assert_eq!(c.snapshot_path, None);
    }

    #[test]
    fn test_reads_values() {
        let c = config(&[("PORT", "9000"), ("USD_BRL_RATE", "5,61"), ("CATALOG_SNAPSHOT", "/tmp/catalog.json")]);
        assert_eq!(c.port, 9000);
        assert_eq!(c.exchange_rate.value(), 5.61);
        assert_eq!(c.snapshot_path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let c = config(&[("PORT", "http"), ("USD_BRL_RATE", "-1"), ("CATALOG_SNAPSHOT", " ")]);
        assert_eq!(c.port, 8083);
        assert_eq!(c.exchange_rate, ExchangeRate::fallback());
        assert_eq!(c.snapshot_path, None);
    }
}
