//! Bulk exchange rate loading.

use fxwidget_common::{CurrencyCode, RateSource, RateTable};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::Endpoints;
use crate::error::{FxError, FxResult};
use crate::schema::RateDocument;
use crate::source::DocumentSource;
use crate::store::SharedRateStore;

/// Loads the base-relative rate table into the store.
pub struct RateLoader {
    source: Arc<dyn DocumentSource>,
    url: String,
    base: CurrencyCode,
    store: SharedRateStore,
}

impl RateLoader {
    pub fn new(source: Arc<dyn DocumentSource>, endpoints: &Endpoints, store: SharedRateStore) -> Self {
        Self {
            source,
            url: endpoints.base_rates(),
            base: endpoints.base().clone(),
            store,
        }
    }

    /// Fetch the live table. Does not touch the store.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn load_rates(&self) -> FxResult<RateTable> {
        let doc = self
            .fetch_document()
            .await
            .map_err(|e| FxError::RateLoad(Box::new(e)))?;

        let mut table = RateTable::new(self.base.clone(), doc.rates, RateSource::Live);
        if let Some(date) = doc.date {
            table = table.with_as_of(date);
        }
        Ok(table)
    }

    async fn fetch_document(&self) -> FxResult<RateDocument> {
        let doc = self.source.fetch_json(&self.url).await?;
        RateDocument::parse(doc, &self.base)
    }

    /// The static fallback table, expressed in this loader's base when possible.
    pub fn fallback_table(&self) -> RateTable {
        let fallback = RateTable::fallback();
        fallback.rebased(&self.base).unwrap_or(fallback)
    }

    /// Load the live table, substituting the fallback table on any failure,
    /// and replace the store's rates with the result. Never fails.
    pub async fn load_or_fallback(&self) -> RateTable {
        let table = match self.load_rates().await {
            Ok(table) => {
                info!(
                    count = table.len(),
                    as_of = table.as_of().unwrap_or("unknown"),
                    "Exchange rates loaded"
                );
                table
            }
            Err(e) => {
                warn!(error = %e, "Using fallback exchange rates");
                self.fallback_table()
            }
        };

        self.store.replace_rates(table.clone());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::source::{MockResponse, MockSource};
    use crate::store::RateStore;
    use serde_json::json;
    use std::time::Duration;

    fn setup(base: CurrencyCode) -> (Arc<MockSource>, Endpoints, SharedRateStore) {
        let source = Arc::new(MockSource::new("test"));
        let sources = SourceConfig {
            base_url: "https://primary.test/v1".to_string(),
            fallback_url: "https://mirror.test/v1".to_string(),
            ..Default::default()
        };
        let endpoints = Endpoints::new(&sources, base.clone());
        let store = Arc::new(RateStore::new(base));
        (source, endpoints, store)
    }

    #[tokio::test]
    async fn test_load_live_rates() {
        let (source, endpoints, store) = setup(CurrencyCode::usd());
        source.set_document(
            endpoints.base_rates(),
            json!({"date": "2024-03-01", "usd": {"usd": 0.97, "eur": 0.92, "gbp": 0.79, "chf": 0.88}}),
        );
        let loader = RateLoader::new(source, &endpoints, store.clone());

        let table = loader.load_or_fallback().await;

        assert!(!table.is_fallback());
        assert_eq!(table.as_of(), Some("2024-03-01"));
        assert_eq!(store.rate(&CurrencyCode::usd()), Some(1.0));
        assert_eq!(store.rate(&CurrencyCode::eur()), Some(0.92));
        assert_eq!(store.rate(&CurrencyCode::new("CHF")), Some(0.88));
    }

    #[tokio::test]
    async fn test_load_rates_reports_error() {
        let (source, endpoints, store) = setup(CurrencyCode::usd());
        source.set_response(endpoints.base_rates(), MockResponse::Status(500), Duration::ZERO);
        let loader = RateLoader::new(source, &endpoints, store.clone());

        let result = loader.load_rates().await;

        assert!(matches!(result, Err(FxError::RateLoad(_))));
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_fallback_on_network_failure() {
        let (source, endpoints, store) = setup(CurrencyCode::usd());
        source.set_response(endpoints.base_rates(), MockResponse::Timeout, Duration::ZERO);
        let loader = RateLoader::new(source, &endpoints, store.clone());

        let table = loader.load_or_fallback().await;

        assert!(table.is_fallback());
        assert_eq!(store.rate(&CurrencyCode::usd()), Some(1.0));
        assert_eq!(store.rate(&CurrencyCode::eur()), Some(0.92));
        assert_eq!(store.rate(&CurrencyCode::gbp()), Some(0.79));
        assert_eq!(store.rate(&CurrencyCode::jpy()), Some(149.0));
        assert_eq!(store.rate(&CurrencyCode::inr()), Some(83.0));
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_document() {
        let (source, endpoints, store) = setup(CurrencyCode::usd());
        source.set_document(endpoints.base_rates(), json!({"eur": {"usd": 1.08}}));
        let loader = RateLoader::new(source, &endpoints, store.clone());

        let table = loader.load_or_fallback().await;

        assert!(table.is_fallback());
        assert_eq!(table.len(), 5);
    }

    #[tokio::test]
    async fn test_fallback_never_mixes_with_live() {
        let (source, endpoints, store) = setup(CurrencyCode::usd());
        source.set_document(endpoints.base_rates(), json!({"usd": {"chf": 0.88}}));
        let loader = RateLoader::new(source.clone(), &endpoints, store.clone());
        loader.load_or_fallback().await;
        assert_eq!(store.rate(&CurrencyCode::new("CHF")), Some(0.88));

        source.set_response(endpoints.base_rates(), MockResponse::Status(502), Duration::ZERO);
        loader.load_or_fallback().await;

        assert_eq!(store.rate(&CurrencyCode::new("CHF")), None);
        assert!(store.rate_table().is_fallback());
    }

    #[tokio::test]
    async fn test_fallback_rebased_to_configured_base() {
        let (source, endpoints, store) = setup(CurrencyCode::eur());
        let loader = RateLoader::new(source, &endpoints, store.clone());

        let table = loader.load_or_fallback().await;

        assert_eq!(table.base(), &CurrencyCode::eur());
        assert_eq!(store.rate(&CurrencyCode::eur()), Some(1.0));
        let usd = store.rate(&CurrencyCode::usd()).unwrap();
        assert!((usd - 1.0 / 0.92).abs() < 1e-12);
    }
}
