//! Widget configuration.

use std::time::Duration;

use fxwidget_common::CurrencyCode;

/// Remote source configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Root of the primary currency API.
    pub base_url: String,
    /// Root of the mirror used when the primary catalog is unavailable.
    pub fallback_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1"
                .to_string(),
            fallback_url: "https://latest.currency-api.pages.dev/v1".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Main widget configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Source configuration.
    pub sources: SourceConfig,
    /// Currency the bulk rate table is expressed in.
    pub base_currency: CurrencyCode,
    /// Initial "from" selection.
    pub default_from: CurrencyCode,
    /// Initial "to" selection.
    pub default_to: CurrencyCode,
    /// How long a per-currency lookup table stays cached.
    pub lookup_ttl: chrono::Duration,
    /// How long the startup failure notice stays visible.
    pub notice_duration: Duration,
    /// Log level.
    pub log_level: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            base_currency: CurrencyCode::usd(),
            default_from: CurrencyCode::usd(),
            default_to: CurrencyCode::eur(),
            lookup_ttl: chrono::Duration::seconds(60),
            notice_duration: Duration::from_secs(5),
            log_level: "info".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FXWIDGET_BASE_URL") {
            config.sources.base_url = url;
        }

        if let Ok(url) = std::env::var("FXWIDGET_FALLBACK_URL") {
            config.sources.fallback_url = url;
        }

        if let Ok(base) = std::env::var("FXWIDGET_BASE_CURRENCY") {
            config.base_currency = CurrencyCode::new(base);
        }

        if let Ok(ms) = std::env::var("FXWIDGET_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.sources.request_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(secs) = std::env::var("FXWIDGET_LOOKUP_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.lookup_ttl = chrono::Duration::seconds(secs);
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.sources.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if self.sources.fallback_url.is_empty() {
            return Err("Fallback URL cannot be empty".to_string());
        }

        if self.sources.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if self.base_currency.as_str().is_empty() {
            return Err("Base currency cannot be empty".to_string());
        }

        if self.lookup_ttl < chrono::Duration::zero() {
            return Err("Lookup TTL cannot be negative".to_string());
        }

        Ok(())
    }

    /// URLs derived from this configuration.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.sources, self.base_currency.clone())
    }
}

/// Concrete document URLs for each remote source.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
    fallback_url: String,
    base: CurrencyCode,
}

impl Endpoints {
    pub fn new(sources: &SourceConfig, base: CurrencyCode) -> Self {
        Self {
            base_url: sources.base_url.trim_end_matches('/').to_string(),
            fallback_url: sources.fallback_url.trim_end_matches('/').to_string(),
            base,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Flat code → name document.
    pub fn catalog(&self) -> String {
        format!("{}/currencies.min.json", self.base_url)
    }

    /// Catalog mirror, nested under the base currency key.
    pub fn fallback_catalog(&self) -> String {
        format!("{}/currencies/{}.json", self.fallback_url, self.base.to_lowercase())
    }

    /// Bulk rate table for the base currency.
    pub fn base_rates(&self) -> String {
        self.rates_for(&self.base)
    }

    /// Rate table expressed relative to `code`.
    pub fn rates_for(&self, code: &CurrencyCode) -> String {
        format!("{}/currencies/{}.min.json", self.base_url, code.to_lowercase())
    }
}
