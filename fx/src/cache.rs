//! TTL cache for per-currency rate tables fetched on demand.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use fxwidget_common::{CurrencyCode, RateTable};
use tracing::debug;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: RateTable,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(table: RateTable, ttl: Duration) -> Self {
        Self {
            table,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < self.ttl
    }
}

/// Configuration for the lookup cache.
#[derive(Debug, Clone)]
pub struct LookupCacheConfig {
    /// How long a fetched table is reused.
    pub ttl: Duration,
    /// Maximum number of tables kept.
    pub max_entries: usize,
}

impl Default for LookupCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(60),
            max_entries: 64,
        }
    }
}

/// Rate tables keyed by their base currency.
///
/// Kept apart from the rate store: tables here are never merged into it.
pub struct LookupCache {
    cache: DashMap<CurrencyCode, CacheEntry>,
    config: LookupCacheConfig,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::with_config(LookupCacheConfig::default())
    }

    pub fn with_config(config: LookupCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get the table based on `code` if still fresh.
    pub fn get(&self, code: &CurrencyCode) -> Option<RateTable> {
        if let Some(entry) = self.cache.get(code) {
            if entry.is_valid() {
                debug!(base = %code, "Lookup cache hit");
                return Some(entry.table.clone());
            }
            drop(entry);
            debug!(base = %code, "Lookup cache entry expired");
            self.cache.remove(code);
        }

        None
    }

    /// Insert a table under its own base currency.
    pub fn insert(&self, table: RateTable) {
        if self.config.ttl <= Duration::zero() {
            return;
        }

        // Check capacity
        if self.cache.len() >= self.config.max_entries {
            self.evict_expired();
        }
        // Still full: drop the oldest entry
        if self.cache.len() >= self.config.max_entries {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|e| e.cached_at)
                .map(|e| e.key().clone());
            if let Some(code) = oldest {
                self.cache.remove(&code);
            }
        }

        let base = table.base().clone();
        self.cache.insert(base, CacheEntry::new(table, self.config.ttl));
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Evict expired entries.
    pub fn evict_expired(&self) {
        self.cache.retain(|_, entry| entry.is_valid());
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.cache.len();
        let valid = self.cache.iter().filter(|e| e.is_valid()).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
