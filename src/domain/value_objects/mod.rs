//! Value Objects for the catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rate used when no quote is configured.
pub const FALLBACK_USD_BRL_RATE: f64 = 5.25;

/// USD to BRL exchange rate. Always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    pub fn new(value: f64) -> Result<Self, ExchangeRateError> {
        if !value.is_finite() || value <= 0.0 { return Err(ExchangeRateError::NotPositive(value)); }
        Ok(Self(value))
    }
    pub fn fallback() -> Self { Self(FALLBACK_USD_BRL_RATE) }
    pub fn value(&self) -> f64 { self.0 }
}

impl TryFrom<f64> for ExchangeRate {
    type Error = ExchangeRateError;
    fn try_from(value: f64) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<ExchangeRate> for f64 {
    fn from(rate: ExchangeRate) -> Self { rate.0 }
}

#[derive(Debug, Clone, PartialEq)] pub enum ExchangeRateError { NotPositive(f64) }
impl std::error::Error for ExchangeRateError {}
impl fmt::Display for ExchangeRateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::NotPositive(v) => write!(f, "exchange rate must be positive, got {}", v) }
    }
}

/// URL-safe page slug: lowercase ASCII letters, digits, `-` and `_`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(SlugError::Empty); }
        if let Some(c) = value.chars().find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')) {
            return Err(SlugError::InvalidChar(c));
        }
        Ok(Self(value))
    }

    /// Derives a slug from a free-text title.
    pub fn from_title(title: &str) -> Result<Self, SlugError> { Self::new(slugify(title)) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self { slug.0 }
}

#[derive(Debug, Clone, PartialEq)] pub enum SlugError { Empty, InvalidChar(char) }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "slug empty"),
            Self::InvalidChar(c) => write!(f, "slug contains invalid character '{}'", c),
        }
    }
}

/// Lowercases, folds common Latin accents, turns whitespace runs into `-`,
/// drops anything that is not a word character or `-`, and collapses dashes.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        let c = fold_accent(c);
        if c.is_whitespace() || c == '-' {
            if !out.ends_with('-') { out.push('-'); }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }
    out.trim_matches('-').to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// CSS hex color, `#RGB` or `#RRGGBB`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn new(value: impl Into<String>) -> Result<Self, ColorError> {
        let value = value.into().trim().to_string();
        let digits = value.strip_prefix('#').ok_or_else(|| ColorError(value.clone()))?;
        if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError(value));
        }
        Ok(Self(value.to_uppercase()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self { color.0 }
}

#[derive(Debug, Clone, PartialEq)] pub struct ColorError(pub String);
impl std::error::Error for ColorError {}
impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "invalid hex color '{}'", self.0) }
}
