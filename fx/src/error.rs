//! Error types for loading and conversion.

use fxwidget_common::{CodeError, CurrencyCode};
use thiserror::Error;

/// A single failed attempt against one catalog source.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Errors that can occur while loading currency data or converting.
#[derive(Debug, Error)]
pub enum FxError {
    /// Every catalog source failed. Fatal for initialization.
    #[error("Could not load currency data: {}", summarize(.attempts))]
    CatalogUnavailable { attempts: Vec<SourceFailure> },

    /// The bulk rate table could not be loaded.
    #[error("Exchange rates unavailable: {0}")]
    RateLoad(#[source] Box<FxError>),

    /// The on-demand rate lookup for a single pair failed.
    #[error("Rate lookup {from}->{to} failed: {reason}")]
    LookupFailed {
        from: CurrencyCode,
        to: CurrencyCode,
        reason: String,
    },

    /// Transport-level failure talking to a source.
    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// Request exceeded the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Source answered with a non-success status.
    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Response body did not have the expected shape.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Currency not present in the loaded catalog.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error(transparent)]
    InvalidCode(#[from] CodeError),

    /// Operation requires a loaded catalog.
    #[error("Currency data has not been loaded")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FxError {
    /// Whether this error must stop initialization.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FxError::CatalogUnavailable { .. })
    }
}

fn summarize(attempts: &[SourceFailure]) -> String {
    if attempts.is_empty() {
        return "no sources configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.source, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for fxwidget operations.
pub type FxResult<T> = Result<T, FxError>;
