//! Converter session wiring the loaders, engine and selection together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fxwidget_common::{Currency, CurrencyCode};
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use crate::cache::LookupCacheConfig;
use crate::catalog::CatalogLoader;
use crate::config::WidgetConfig;
use crate::engine::{ConversionDisplay, ConversionEngine};
use crate::error::{FxError, FxResult};
use crate::rates::RateLoader;
use crate::selection::Selection;
use crate::sequence::ConversionSequencer;
use crate::source::{DocumentSource, HttpSource};
use crate::store::{RateStore, SharedRateStore};

/// Message shown when startup data could not be loaded.
pub const LOAD_FAILURE_NOTICE: &str =
    "Failed to load data. Please refresh the page and check your internet connection.";

/// A time-limited user-visible message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    shown_at: Instant,
    duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            duration,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.shown_at.elapsed() < self.duration
    }
}

/// One converter session.
pub struct Widget {
    config: WidgetConfig,
    store: SharedRateStore,
    catalog_loader: CatalogLoader,
    rate_loader: RateLoader,
    engine: ConversionEngine,
    sequencer: ConversionSequencer,
    selection: RwLock<Selection>,
    amount: RwLock<String>,
    notice: Mutex<Option<Notice>>,
    ready: AtomicBool,
}

impl Widget {
    pub fn new(config: WidgetConfig, source: Arc<dyn DocumentSource>) -> Self {
        let endpoints = config.endpoints();
        let store: SharedRateStore = Arc::new(RateStore::new(config.base_currency.clone()));

        let catalog_loader = CatalogLoader::with_endpoints(source.clone(), &endpoints, store.clone());
        let rate_loader = RateLoader::new(source.clone(), &endpoints, store.clone());
        let engine = ConversionEngine::new(
            store.clone(),
            source,
            endpoints,
            LookupCacheConfig {
                ttl: config.lookup_ttl,
                ..Default::default()
            },
        );
        let selection = Selection::new(config.default_from.clone(), config.default_to.clone());

        Self {
            config,
            store,
            catalog_loader,
            rate_loader,
            engine,
            sequencer: ConversionSequencer::new(),
            selection: RwLock::new(selection),
            amount: RwLock::new(String::new()),
            notice: Mutex::new(None),
            ready: AtomicBool::new(false),
        }
    }

    /// Session backed by the HTTP client.
    pub fn from_config(config: WidgetConfig) -> FxResult<Self> {
        config.validate().map_err(FxError::Config)?;
        let source = HttpSource::new(config.sources.request_timeout)?;
        Ok(Self::new(config, Arc::new(source)))
    }

    /// Load the catalog and rates, then run the first conversion.
    ///
    /// A catalog failure is fatal: the load failure notice is raised and the
    /// session stays uninitialized. Rate failures fall back silently.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> FxResult<Option<ConversionDisplay>> {
        if let Err(e) = self.catalog_loader.load_catalog().await {
            error!(error = %e, "Initialization failed");
            *self.notice.lock() = Some(Notice::new(LOAD_FAILURE_NOTICE, self.config.notice_duration));
            return Err(e);
        }

        // Keep the selection within the loaded catalog
        {
            let catalog = self.store.catalog();
            let mut selection = self.selection.write();
            if selection.reconcile(&catalog) {
                warn!(
                    from = %selection.from,
                    to = %selection.to,
                    "Default currencies not in catalog, selection adjusted"
                );
            }
        }

        self.rate_loader.load_or_fallback().await;
        self.ready.store(true, Ordering::SeqCst);
        info!(status = %self.status(), "Widget initialized");

        self.refresh().await
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Record the amount text and convert.
    pub async fn on_amount_input(&self, text: &str) -> FxResult<Option<ConversionDisplay>> {
        self.ensure_ready()?;
        *self.amount.write() = text.to_string();
        self.refresh().await
    }

    pub async fn select_from(&self, code: CurrencyCode) -> FxResult<Option<ConversionDisplay>> {
        self.ensure_ready()?;
        let catalog = self.store.catalog();
        self.selection.write().set_from(code, &catalog)?;
        self.refresh().await
    }

    pub async fn select_to(&self, code: CurrencyCode) -> FxResult<Option<ConversionDisplay>> {
        self.ensure_ready()?;
        let catalog = self.store.catalog();
        self.selection.write().set_to(code, &catalog)?;
        self.refresh().await
    }

    pub async fn swap(&self) -> FxResult<Option<ConversionDisplay>> {
        self.ensure_ready()?;
        self.selection.write().swap();
        self.refresh().await
    }

    /// Convert the current amount and selection.
    ///
    /// Returns `None` when a newer conversion published first.
    pub async fn refresh(&self) -> FxResult<Option<ConversionDisplay>> {
        self.ensure_ready()?;
        let ticket = self.sequencer.issue();
        let amount = self.amount.read().clone();
        let Selection { from, to } = self.selection.read().clone();

        let display = self.engine.convert_text(&amount, &from, &to).await.display();
        if self.sequencer.publish(ticket, display.clone()) {
            Ok(Some(display))
        } else {
            Ok(None)
        }
    }

    /// `"N currencies loaded"`
    pub fn status(&self) -> String {
        format!("{} currencies loaded", self.store.currency_count())
    }

    /// Catalog entries matching `term`.
    pub fn search(&self, term: &str) -> Vec<Currency> {
        self.store.search(term)
    }

    /// The notice, while still visible.
    pub fn notice(&self) -> Option<Notice> {
        let mut notice = self.notice.lock();
        if notice.as_ref().map_or(false, |n| !n.is_visible()) {
            *notice = None;
        }
        notice.clone()
    }

    /// Current selection, or `None` before initialization.
    pub fn selection(&self) -> Option<Selection> {
        self.is_ready().then(|| self.selection.read().clone())
    }

    /// Newest published display.
    pub fn latest(&self) -> Option<ConversionDisplay> {
        self.sequencer.latest()
    }

    pub fn store(&self) -> &SharedRateStore {
        &self.store
    }

    fn ensure_ready(&self) -> FxResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(FxError::NotInitialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::engine::{FAILED_TEXT, IDLE_TEXT};
    use crate::source::{MockResponse, MockSource};
    use serde_json::json;

    fn config() -> WidgetConfig {
        WidgetConfig {
            sources: SourceConfig {
                base_url: "https://primary.test/v1".to_string(),
                fallback_url: "https://mirror.test/v1".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn seeded_source() -> Arc<MockSource> {
        let source = Arc::new(MockSource::new("test"));
        let endpoints = config().endpoints();
        source.set_document(
            endpoints.catalog(),
            json!({
                "usd": "US Dollar",
                "eur": "Euro",
                "gbp": "British Pound",
                "jpy": "Japanese Yen",
                "inr": "Indian Rupee",
                "chf": "Swiss Franc"
            }),
        );
        source.set_document(
            endpoints.base_rates(),
            json!({"date": "2024-03-01", "usd": {"eur": 0.92, "gbp": 0.79}}),
        );
        source
    }

    #[tokio::test]
    async fn test_initialize_and_convert() {
        let widget = Widget::new(config(), seeded_source());

        let initial = widget.initialize().await.unwrap().unwrap();
        assert_eq!(initial.text, IDLE_TEXT);
        assert_eq!(widget.status(), "6 currencies loaded");
        assert!(widget.notice().is_none());

        let display = widget.on_amount_input("100").await.unwrap().unwrap();
        assert_eq!(display.text, "100.00 USD = 92.00 EUR");
        assert_eq!(display.rate_text, "1 USD = 0.920000 EUR");

        let display = widget.swap().await.unwrap().unwrap();
        assert!(display.text.starts_with("100.00 EUR = "));
        assert_eq!(widget.latest(), Some(display));
    }

    #[tokio::test]
    async fn test_select_validates_catalog() {
        let widget = Widget::new(config(), seeded_source());
        widget.initialize().await.unwrap();

        let display = widget.select_to(CurrencyCode::gbp()).await.unwrap().unwrap();
        assert_eq!(display.text, IDLE_TEXT);

        let err = widget.select_from(CurrencyCode::new("XYZ")).await.unwrap_err();
        assert!(matches!(err, FxError::UnknownCurrency(_)));
        assert_eq!(widget.selection().unwrap().from, CurrencyCode::usd());
    }

    #[tokio::test]
    async fn test_default_pair_checked_against_catalog() {
        let source = Arc::new(MockSource::new("test"));
        let endpoints = config().endpoints();
        source.set_document(
            endpoints.catalog(),
            json!({"usd": "US Dollar", "gbp": "British Pound", "jpy": "Japanese Yen"}),
        );
        let widget = Widget::new(config(), source);

        widget.initialize().await.unwrap();

        let selection = widget.selection().unwrap();
        assert_eq!(selection.from, CurrencyCode::usd());
        assert_eq!(selection.to, CurrencyCode::gbp());
    }

    #[tokio::test]
    async fn test_catalog_failure_is_fatal() {
        let source = Arc::new(MockSource::new("test"));
        let endpoints = config().endpoints();
        source.set_response(endpoints.catalog(), MockResponse::Status(503), Duration::ZERO);
        source.set_response(endpoints.fallback_catalog(), MockResponse::Timeout, Duration::ZERO);
        let widget = Widget::new(config(), source);

        let err = widget.initialize().await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(widget.notice().unwrap().message, LOAD_FAILURE_NOTICE);
        assert!(widget.selection().is_none());
        assert!(widget.search("").is_empty());
        assert!(matches!(
            widget.on_amount_input("5").await,
            Err(FxError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_notice_expires() {
        let source = Arc::new(MockSource::new("test"));
        let widget = Widget::new(
            WidgetConfig {
                notice_duration: Duration::from_millis(20),
                ..config()
            },
            source,
        );

        assert!(widget.initialize().await.is_err());
        assert!(widget.notice().is_some());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(widget.notice().is_none());
    }

    #[tokio::test]
    async fn test_rate_failure_uses_fallback() {
        let source = seeded_source();
        let endpoints = config().endpoints();
        source.set_response(endpoints.base_rates(), MockResponse::Status(500), Duration::ZERO);
        let widget = Widget::new(config(), source);

        widget.initialize().await.unwrap();
        assert!(widget.store().rate_table().is_fallback());

        widget.on_amount_input("1").await.unwrap();
        let display = widget.select_to(CurrencyCode::jpy()).await.unwrap().unwrap();
        assert_eq!(display.text, "1.00 USD = 149.00 JPY");

        let display = widget.select_to(CurrencyCode::inr()).await.unwrap().unwrap();
        assert_eq!(display.text, "1.00 USD = 83.00 INR");
    }

    #[tokio::test]
    async fn test_missing_rate_shows_failure_text() {
        let widget = Widget::new(config(), seeded_source());
        widget.initialize().await.unwrap();

        widget.on_amount_input("10").await.unwrap();
        let display = widget.select_from(CurrencyCode::new("CHF")).await.unwrap().unwrap();

        assert_eq!(display.text, FAILED_TEXT);
        assert!(display.rate_text.is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = config();
        config.sources.fallback_url.clear();

        assert!(matches!(Widget::from_config(config), Err(FxError::Config(_))));
    }
}
