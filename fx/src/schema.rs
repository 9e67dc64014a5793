//! Explicit shapes of the remote JSON documents.
//!
//! The currency API serves three shapes:
//!
//! - a flat catalog, `{ "usd": "US Dollar", ... }`
//! - a catalog nested under a currency key, `{ "date": "...", "usd": { ... } }`
//! - a rate table nested the same way, `{ "date": "...", "usd": { "eur": 0.92, ... } }`
//!
//! Values are coerced defensively: non-string names fall back to the code,
//! non-numeric rates are skipped.

use fxwidget_common::{Currency, CurrencyCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FxError, FxResult};

/// Envelope shared by nested documents.
#[derive(Debug, Deserialize)]
struct NestedEnvelope {
    #[serde(default)]
    date: Option<String>,
    #[serde(flatten)]
    entries: Map<String, Value>,
}

/// A catalog document, entries in document order.
#[derive(Debug, Clone)]
pub struct CatalogDocument {
    entries: Map<String, Value>,
}

impl CatalogDocument {
    /// Parse the flat shape.
    pub fn from_flat(doc: Value) -> FxResult<Self> {
        match doc {
            Value::Object(entries) => Self::non_empty(entries),
            other => Err(FxError::MalformedDocument(format!(
                "catalog must be an object, got {}",
                kind(&other)
            ))),
        }
    }

    /// Parse the shape nested under `key` (lowercase currency code).
    pub fn from_nested(doc: Value, key: &str) -> FxResult<Self> {
        let entries = nested_entries(doc, key)?.1;
        Self::non_empty(entries)
    }

    fn non_empty(entries: Map<String, Value>) -> FxResult<Self> {
        if entries.is_empty() {
            return Err(FxError::MalformedDocument("catalog is empty".to_string()));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Currencies in document order, codes uppercased.
    pub fn into_currencies(self) -> Vec<Currency> {
        self.entries
            .into_iter()
            .map(|(code, name)| {
                let code = CurrencyCode::new(code);
                let name = match name {
                    Value::String(name) => name,
                    _ => code.to_string(),
                };
                Currency { code, name }
            })
            .collect()
    }
}

/// A rate document: rates of every listed currency per one unit of `base`.
#[derive(Debug, Clone)]
pub struct RateDocument {
    pub base: CurrencyCode,
    pub date: Option<String>,
    pub rates: Vec<(CurrencyCode, f64)>,
}

impl RateDocument {
    /// Parse a rate table nested under `base`.
    pub fn parse(doc: Value, base: &CurrencyCode) -> FxResult<Self> {
        let (date, entries) = nested_entries(doc, &base.to_lowercase())?;

        let rates: Vec<(CurrencyCode, f64)> = entries
            .into_iter()
            .filter_map(|(code, rate)| rate.as_f64().map(|r| (CurrencyCode::new(code), r)))
            .collect();

        if rates.is_empty() {
            return Err(FxError::MalformedDocument(format!(
                "no numeric rates under \"{}\"",
                base.to_lowercase()
            )));
        }

        Ok(Self {
            base: base.clone(),
            date,
            rates,
        })
    }

    /// Rate of `code` per one unit of the document base.
    pub fn rate_of(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, rate)| *rate)
    }
}

fn nested_entries(doc: Value, key: &str) -> FxResult<(Option<String>, Map<String, Value>)> {
    let mut envelope: NestedEnvelope = serde_json::from_value(doc)
        .map_err(|e| FxError::MalformedDocument(format!("expected an object: {}", e)))?;

    match envelope.entries.remove(key) {
        Some(Value::Object(entries)) => Ok((envelope.date, entries)),
        Some(other) => Err(FxError::MalformedDocument(format!(
            "\"{}\" must be an object, got {}",
            key,
            kind(&other)
        ))),
        None => Err(FxError::MalformedDocument(format!("missing \"{}\" key", key))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
