//! Conversion engine.

use std::sync::Arc;

use fxwidget_common::{format_amount, format_rate, round_amount, CurrencyCode, RateSource, RateTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::{LookupCache, LookupCacheConfig};
use crate::config::Endpoints;
use crate::error::{FxError, FxResult};
use crate::schema::RateDocument;
use crate::source::DocumentSource;
use crate::store::SharedRateStore;

/// Shown while there is no positive amount to convert.
pub const IDLE_TEXT: &str = "Enter amount";

/// Shown when a conversion could not be computed.
pub const FAILED_TEXT: &str = "Enter amount to convert";

/// Text written to the result area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionDisplay {
    pub text: String,
    pub rate_text: String,
}

impl ConversionDisplay {
    fn placeholder(text: &str) -> Self {
        Self {
            text: text.to_string(),
            rate_text: String::new(),
        }
    }
}

/// Where the rate for a conversion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatePath {
    /// Ratio of two rates held in the store.
    Stored,
    /// Per-currency table fetched on demand.
    Direct,
}

/// A computed conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Units of `to` per one unit of `from`.
    pub rate: f64,
    /// `amount * rate`, rounded to two decimals.
    pub result: f64,
    pub path: RatePath,
}

impl Conversion {
    pub fn new(amount: f64, from: CurrencyCode, to: CurrencyCode, rate: f64, path: RatePath) -> Self {
        Self {
            amount,
            from,
            to,
            rate,
            result: round_amount(amount * rate),
            path,
        }
    }

    /// `"100.00 USD = 92.00 EUR"`
    pub fn display_text(&self) -> String {
        format!(
            "{} {} = {} {}",
            format_amount(self.amount),
            self.from,
            format_amount(self.result),
            self.to
        )
    }

    /// `"1 USD = 0.920000 EUR"`
    pub fn rate_text(&self) -> String {
        format!("1 {} = {} {}", self.from, format_rate(self.rate), self.to)
    }
}

/// Result of one conversion request.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// No positive amount entered.
    Idle,
    Converted(Conversion),
    /// The rate could not be determined.
    Failed,
}

impl ConversionOutcome {
    pub fn display(&self) -> ConversionDisplay {
        match self {
            ConversionOutcome::Idle => ConversionDisplay::placeholder(IDLE_TEXT),
            ConversionOutcome::Converted(c) => ConversionDisplay {
                text: c.display_text(),
                rate_text: c.rate_text(),
            },
            ConversionOutcome::Failed => ConversionDisplay::placeholder(FAILED_TEXT),
        }
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        match self {
            ConversionOutcome::Converted(c) => Some(c),
            _ => None,
        }
    }
}

/// Parse an amount leniently: the longest leading decimal literal counts,
/// anything unparsable is `0`.
///
/// `"12.5abc"` is `12.5`, `" 3e2 "` is `300`, `"abc"` is `0`.
pub fn parse_amount(text: &str) -> f64 {
    let s = text.trim_start().as_bytes();
    let mut end = 0;

    if matches!(s.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    // Integer part
    let int_start = end;
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    // Fraction
    if end < s.len() && s[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < s.len() && s[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return 0.0;
    }

    // Exponent, only if followed by digits
    if end < s.len() && (s[end] == b'e' || s[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < s.len() && (s[exp_end] == b'+' || s[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < s.len() && s[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    std::str::from_utf8(&s[..end])
        .ok()
        .and_then(|literal| literal.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Computes conversions from the shared store, falling back to a direct
/// per-currency lookup when either rate is missing.
pub struct ConversionEngine {
    store: SharedRateStore,
    source: Arc<dyn DocumentSource>,
    endpoints: Endpoints,
    cache: LookupCache,
}

impl ConversionEngine {
    pub fn new(
        store: SharedRateStore,
        source: Arc<dyn DocumentSource>,
        endpoints: Endpoints,
        cache: LookupCacheConfig,
    ) -> Self {
        Self {
            store,
            source,
            endpoints,
            cache: LookupCache::with_config(cache),
        }
    }

    /// Convert `amount` units of `from` into `to`.
    ///
    /// Never returns an error: lookup failures become
    /// [`ConversionOutcome::Failed`] and are only logged.
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    pub async fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) -> ConversionOutcome {
        if !(amount.is_finite() && amount > 0.0) {
            return ConversionOutcome::Idle;
        }

        // Stored rates first, then the per-currency table.
        let (rate, path) = match self.store.cross_rate(from, to) {
            Some(rate) => {
                debug!(rate, "Using stored rates");
                (rate, RatePath::Stored)
            }
            None => match self.lookup_rate(from, to).await {
                Ok(rate) => (rate, RatePath::Direct),
                Err(e) => {
                    warn!(error = %e, "Conversion lookup failed");
                    return ConversionOutcome::Failed;
                }
            },
        };

        let conversion = Conversion::new(amount, from.clone(), to.clone(), rate, path);
        if !conversion.result.is_finite() {
            warn!(amount, rate, "Conversion result out of range");
            return ConversionOutcome::Failed;
        }
        ConversionOutcome::Converted(conversion)
    }

    /// Parse `text` with [`parse_amount`] and convert.
    pub async fn convert_text(&self, text: &str, from: &CurrencyCode, to: &CurrencyCode) -> ConversionOutcome {
        self.convert(parse_amount(text), from, to).await
    }

    /// Fetch the rate table based on `from` and read the `to` entry.
    pub async fn lookup_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> FxResult<f64> {
        let table = match self.cache.get(from) {
            Some(table) => table,
            None => {
                let table = self.fetch_table(from).await.map_err(|e| FxError::LookupFailed {
                    from: from.clone(),
                    to: to.clone(),
                    reason: e.to_string(),
                })?;
                self.cache.insert(table.clone());
                table
            }
        };

        table.get(to).ok_or_else(|| FxError::LookupFailed {
            from: from.clone(),
            to: to.clone(),
            reason: format!("no rate for {}", to),
        })
    }

    async fn fetch_table(&self, base: &CurrencyCode) -> FxResult<RateTable> {
        let url = self.endpoints.rates_for(base);
        let doc = RateDocument::parse(self.source.fetch_json(&url).await?, base)?;

        let mut table = RateTable::new(base.clone(), doc.rates, RateSource::Live);
        if let Some(date) = doc.date {
            table = table.with_as_of(date);
        }
        Ok(table)
    }

    /// Number of per-currency tables currently cached.
    pub fn cached_tables(&self) -> usize {
        self.cache.len()
    }
}
