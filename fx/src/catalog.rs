//! Currency catalog loading with ordered fallback sources.

use fxwidget_common::{sort_by_name, Currency};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::Endpoints;
use crate::error::{FxError, FxResult, SourceFailure};
use crate::schema::CatalogDocument;
use crate::source::DocumentSource;
use crate::store::SharedRateStore;

/// One way of obtaining the catalog document.
#[derive(Debug, Clone)]
pub enum CatalogStrategy {
    /// Flat `code -> name` document.
    Flat { url: String },
    /// Document nesting the mapping under `key`.
    Nested { url: String, key: String },
}

impl CatalogStrategy {
    pub fn url(&self) -> &str {
        match self {
            CatalogStrategy::Flat { url } | CatalogStrategy::Nested { url, .. } => url,
        }
    }

    async fn fetch(&self, source: &dyn DocumentSource) -> FxResult<CatalogDocument> {
        let doc = source.fetch_json(self.url()).await?;
        match self {
            CatalogStrategy::Flat { .. } => CatalogDocument::from_flat(doc),
            CatalogStrategy::Nested { key, .. } => CatalogDocument::from_nested(doc, key),
        }
    }
}

/// Loads the catalog, trying each strategy in order until one succeeds.
pub struct CatalogLoader {
    source: Arc<dyn DocumentSource>,
    strategies: Vec<CatalogStrategy>,
    store: SharedRateStore,
}

impl CatalogLoader {
    /// Create a loader with explicit strategies.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        strategies: Vec<CatalogStrategy>,
        store: SharedRateStore,
    ) -> Self {
        Self {
            source,
            strategies,
            store,
        }
    }

    /// Primary flat catalog, then the nested mirror.
    pub fn with_endpoints(
        source: Arc<dyn DocumentSource>,
        endpoints: &Endpoints,
        store: SharedRateStore,
    ) -> Self {
        let strategies = vec![
            CatalogStrategy::Flat {
                url: endpoints.catalog(),
            },
            CatalogStrategy::Nested {
                url: endpoints.fallback_catalog(),
                key: endpoints.base().to_lowercase(),
            },
        ];
        Self::new(source, strategies, store)
    }

    /// Load the catalog sorted by display name and publish it to the store.
    #[instrument(skip(self), fields(strategies = self.strategies.len()))]
    pub async fn load_catalog(&self) -> FxResult<Vec<Currency>> {
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            match strategy.fetch(self.source.as_ref()).await {
                Ok(doc) => {
                    let mut currencies = doc.into_currencies();
                    sort_by_name(&mut currencies);

                    self.store.replace_currencies(currencies.clone());

                    info!(
                        url = strategy.url(),
                        count = currencies.len(),
                        "{} currencies loaded",
                        currencies.len()
                    );
                    return Ok(currencies);
                }
                Err(e) => {
                    warn!(
                        url = strategy.url(),
                        error = %e,
                        "Catalog source failed, trying next"
                    );
                    attempts.push(SourceFailure {
                        source: strategy.url().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(FxError::CatalogUnavailable { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::source::{MockResponse, MockSource};
    use crate::store::RateStore;
    use fxwidget_common::CurrencyCode;
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Arc<MockSource>, Endpoints, SharedRateStore) {
        let source = Arc::new(MockSource::new("test"));
        let sources = SourceConfig {
            base_url: "https://primary.test/v1".to_string(),
            fallback_url: "https://mirror.test/v1".to_string(),
            ..Default::default()
        };
        let endpoints = Endpoints::new(&sources, CurrencyCode::usd());
        let store = Arc::new(RateStore::new(CurrencyCode::usd()));
        (source, endpoints, store)
    }

    #[tokio::test]
    async fn test_primary_catalog() {
        let (source, endpoints, store) = setup();
        source.set_document(
            endpoints.catalog(),
            json!({"pln": "Zloty", "usd": "Dollar", "eur": "Euro"}),
        );
        let loader = CatalogLoader::with_endpoints(source.clone(), &endpoints, store.clone());

        let currencies = loader.load_catalog().await.unwrap();

        let names: Vec<&str> = currencies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Dollar", "Euro", "Zloty"]);
        assert_eq!(store.currency_count(), 3);
        assert_eq!(store.currency_name(&CurrencyCode::new("PLN")), "Zloty");
        assert_eq!(source.requests(&endpoints.fallback_catalog()), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_mirror() {
        let (source, endpoints, store) = setup();
        source.set_response(endpoints.catalog(), MockResponse::Status(503), Duration::ZERO);
        source.set_document(
            endpoints.fallback_catalog(),
            json!({"date": "2024-03-01", "usd": {"eur": "Euro", "gbp": 7}}),
        );
        let loader = CatalogLoader::with_endpoints(source.clone(), &endpoints, store.clone());

        let currencies = loader.load_catalog().await.unwrap();

        assert_eq!(currencies.len(), 2);
        assert_eq!(store.currency_name(&CurrencyCode::gbp()), "GBP");
        assert_eq!(source.requests(&endpoints.catalog()), 1);
        assert_eq!(source.requests(&endpoints.fallback_catalog()), 1);
    }

    #[tokio::test]
    async fn test_malformed_primary_falls_back() {
        let (source, endpoints, store) = setup();
        source.set_document(endpoints.catalog(), json!("not a catalog"));
        source.set_document(
            endpoints.fallback_catalog(),
            json!({"usd": {"eur": "Euro"}}),
        );
        let loader = CatalogLoader::with_endpoints(source, &endpoints, store);

        let currencies = loader.load_catalog().await.unwrap();

        assert_eq!(currencies, vec![Currency::new("EUR", "Euro")]);
    }

    #[tokio::test]
    async fn test_both_sources_fail() {
        let (source, endpoints, store) = setup();
        source.set_response(endpoints.catalog(), MockResponse::Timeout, Duration::ZERO);
        let loader = CatalogLoader::with_endpoints(source, &endpoints, store.clone());

        let result = loader.load_catalog().await;

        match result {
            Err(FxError::CatalogUnavailable { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].reason.contains("timed out"));
                assert!(attempts[1].reason.contains("404"));
            }
            other => panic!("expected CatalogUnavailable, got {:?}", other),
        }
        assert_eq!(store.currency_count(), 0);
    }

    #[tokio::test]
    async fn test_no_strategies() {
        let (source, _, store) = setup();
        let loader = CatalogLoader::new(source, Vec::new(), store);

        let err = loader.load_catalog().await.unwrap_err();

        assert!(err.is_fatal());
    }
}
