//! Currency codes and the catalog of supported currencies.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::CodeError;

/// Currency code, always stored uppercase.
///
/// Remote documents use lowercase codes and include non-ISO entries such as
/// `1inch`, so the code is not restricted to three letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a code from any-case text without validation.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Parse a code typed by a user.
    pub fn parse(code: &str) -> Result<Self, CodeError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(CodeError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacter(trimmed.to_string()));
        }
        Ok(Self::new(trimmed))
    }

    /// Get the code as an uppercase string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used in remote document keys and URLs.
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }

    pub fn inr() -> Self {
        Self::new("INR")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A supported currency with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub name: String,
}

impl Currency {
    pub fn new(code: impl Into<CurrencyCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Whether the code or the name contains `needle` (already lowercased).
    fn matches(&self, needle: &str) -> bool {
        self.code.as_str().to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
    }
}

/// Compare display names the way a locale-aware collator orders them.
///
/// Letters compare first with accents and case ignored, so "Émirati" sits
/// next to "Euro" rather than after "Z". Ties are broken by accents
/// (unaccented first), then by case (lowercase first).
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| {
            a.nfd()
                .flat_map(char::to_lowercase)
                .cmp(b.nfd().flat_map(char::to_lowercase))
        })
        .then_with(|| b.cmp(a))
}

fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Sort currencies by display name. The sort is stable, so currencies with
/// equal names keep their input order.
pub fn sort_by_name(currencies: &mut [Currency]) {
    currencies.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// The full list of supported currencies, sorted by display name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    currencies: Vec<Currency>,
    names: HashMap<CurrencyCode, String>,
}

impl Catalog {
    /// Build a catalog, sorting the list by display name.
    pub fn new(mut currencies: Vec<Currency>) -> Self {
        sort_by_name(&mut currencies);
        let names = currencies
            .iter()
            .map(|c| (c.code.clone(), c.name.clone()))
            .collect();
        Self { currencies, names }
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.names.contains_key(code)
    }

    /// Display name for a code, or the code itself if unknown.
    pub fn name_of(&self, code: &CurrencyCode) -> String {
        self.names
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Currencies whose code or name contains `term`, ignoring case.
    /// A blank term yields the whole catalog.
    pub fn search(&self, term: &str) -> Vec<Currency> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.currencies.clone();
        }
        self.currencies
            .iter()
            .filter(|c| c.matches(&needle))
            .cloned()
            .collect()
    }
}
