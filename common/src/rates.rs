//! Base-relative exchange rate tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::currency::CurrencyCode;

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    /// Loaded from the remote rate document.
    Live,
    /// Static table used when the remote document could not be loaded.
    Fallback,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Live => write!(f, "live"),
            RateSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Approximate USD-relative rates used when no live table is available.
pub const FALLBACK_RATES: [(&str, f64); 5] = [
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.0),
    ("INR", 83.0),
];

/// A mapping from currency code to its value in units per one base unit.
///
/// The base currency's own entry is always exactly `1`, and every other
/// entry is a finite positive number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, f64>,
    source: RateSource,
    /// Publication date reported by the remote document, if any.
    as_of: Option<String>,
    loaded_at: DateTime<Utc>,
}

impl RateTable {
    /// Build a table, dropping unusable entries and pinning the base to 1.
    pub fn new(
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, f64)>,
        source: RateSource,
    ) -> Self {
        let mut rates: HashMap<CurrencyCode, f64> = rates
            .into_iter()
            .filter(|(_, rate)| is_usable_rate(*rate))
            .collect();
        rates.insert(base.clone(), 1.0);

        Self {
            base,
            rates,
            source,
            as_of: None,
            loaded_at: Utc::now(),
        }
    }

    /// The static USD-based fallback table.
    pub fn fallback() -> Self {
        Self::new(
            CurrencyCode::usd(),
            FALLBACK_RATES
                .iter()
                .map(|(code, rate)| (CurrencyCode::new(*code), *rate)),
            RateSource::Fallback,
        )
    }

    /// Attach the publication date reported by the source.
    pub fn with_as_of(mut self, as_of: impl Into<String>) -> Self {
        self.as_of = Some(as_of.into());
        self
    }

    /// Express the same rates relative to another base present in the table.
    pub fn rebased(&self, base: &CurrencyCode) -> Option<Self> {
        let divisor = self.get(base)?;
        let mut table = Self::new(
            base.clone(),
            self.rates
                .iter()
                .map(|(code, rate)| (code.clone(), rate / divisor)),
            self.source,
        );
        table.as_of = self.as_of.clone();
        Some(table)
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn source(&self) -> RateSource {
        self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }

    pub fn as_of(&self) -> Option<&str> {
        self.as_of.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Rate for a code, if present.
    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Set or overwrite a single rate. Unusable values and attempts to move
    /// the base away from 1 are ignored.
    pub fn set(&mut self, code: CurrencyCode, rate: f64) -> bool {
        if code == self.base || !is_usable_rate(rate) {
            return false;
        }
        self.rates.insert(code, rate);
        true
    }

    /// Units of `to` per one unit of `from`.
    pub fn cross_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        Some(self.get(to)? / self.get(from)?)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// All codes with a rate, sorted.
    pub fn codes(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }
}

/// Whether a value can be used as a rate: finite and strictly positive.
pub fn is_usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
