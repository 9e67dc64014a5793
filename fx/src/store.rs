//! Shared store of currency names and rates.

use fxwidget_common::{Catalog, Currency, CurrencyCode, RateSource, RateTable};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
struct StoreState {
    catalog: Catalog,
    rates: RateTable,
    rates_loaded: bool,
}

/// Holds the catalog and the base-relative rate table.
///
/// Written by the catalog and rate loaders, read by the conversion engine
/// and the selector. Writes are visible to the next read.
#[derive(Debug)]
pub struct RateStore {
    base: CurrencyCode,
    state: RwLock<StoreState>,
}

impl RateStore {
    /// Create an empty store for rates expressed relative to `base`.
    pub fn new(base: CurrencyCode) -> Self {
        let rates = RateTable::new(base.clone(), std::iter::empty(), RateSource::Live);
        Self {
            base,
            state: RwLock::new(StoreState {
                catalog: Catalog::default(),
                rates,
                rates_loaded: false,
            }),
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Display name for a code, or the code itself if unknown.
    pub fn currency_name(&self, code: &CurrencyCode) -> String {
        self.state.read().catalog.name_of(code)
    }

    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.state.read().rates.get(code)
    }

    /// Patch a single rate into the current table.
    pub fn set_rate(&self, code: CurrencyCode, rate: f64) -> bool {
        self.state.write().rates.set(code, rate)
    }

    /// Replace the whole rate table.
    pub fn replace_rates(&self, table: RateTable) {
        let mut state = self.state.write();
        state.rates = table;
        state.rates_loaded = true;
    }

    /// Replace the whole catalog.
    pub fn replace_currencies(&self, currencies: Vec<Currency>) {
        self.state.write().catalog = Catalog::new(currencies);
    }

    /// Units of `to` per one unit of `from`, if both are stored.
    pub fn cross_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        self.state.read().rates.cross_rate(from, to)
    }

    /// Snapshot of the catalog.
    pub fn catalog(&self) -> Catalog {
        self.state.read().catalog.clone()
    }

    /// Snapshot of the rate table.
    pub fn rate_table(&self) -> RateTable {
        self.state.read().rates.clone()
    }

    pub fn contains_currency(&self, code: &CurrencyCode) -> bool {
        self.state.read().catalog.contains(code)
    }

    pub fn currency_count(&self) -> usize {
        self.state.read().catalog.len()
    }

    /// Search the catalog by code or name.
    pub fn search(&self, term: &str) -> Vec<Currency> {
        self.state.read().catalog.search(term)
    }

    /// Whether both the catalog and a rate table have been loaded.
    pub fn is_ready(&self) -> bool {
        let state = self.state.read();
        !state.catalog.is_empty() && state.rates_loaded
    }
}

/// Shared rate store.
pub type SharedRateStore = Arc<RateStore>;

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_table(entries: &[(&str, f64)]) -> RateTable {
        RateTable::new(
            CurrencyCode::usd(),
            entries.iter().map(|(c, r)| (CurrencyCode::new(*c), *r)),
            RateSource::Live,
        )
    }

    #[test]
    fn test_empty_store() {
        let store = RateStore::new(CurrencyCode::usd());

        assert!(!store.is_ready());
        assert_eq!(store.rate(&CurrencyCode::usd()), Some(1.0));
        assert_eq!(store.rate(&CurrencyCode::eur()), None);
        assert_eq!(store.currency_name(&CurrencyCode::eur()), "EUR");
    }

    #[test]
    fn test_replace_currencies() {
        let store = RateStore::new(CurrencyCode::usd());
        store.replace_currencies(vec![
            Currency::new("USD", "US Dollar"),
            Currency::new("EUR", "Euro"),
        ]);

        assert_eq!(store.currency_count(), 2);
        assert_eq!(store.currency_name(&CurrencyCode::eur()), "Euro");
        assert!(store.contains_currency(&CurrencyCode::usd()));
        assert_eq!(store.catalog().currencies()[0].name, "Euro");

        store.replace_currencies(vec![Currency::new("GBP", "Pound")]);
        assert_eq!(store.currency_count(), 1);
        assert!(!store.contains_currency(&CurrencyCode::usd()));
    }

    #[test]
    fn test_replace_rates_is_wholesale() {
        let store = RateStore::new(CurrencyCode::usd());
        store.replace_rates(usd_table(&[("EUR", 0.92), ("CHF", 0.88)]));
        store.replace_rates(RateTable::fallback());

        assert_eq!(store.rate(&CurrencyCode::new("CHF")), None);
        assert_eq!(store.rate(&CurrencyCode::eur()), Some(0.92));
        assert!(store.rate_table().is_fallback());
    }

    #[test]
    fn test_set_rate_visible_immediately() {
        let store = RateStore::new(CurrencyCode::usd());
        store.replace_rates(usd_table(&[("EUR", 0.92)]));

        assert!(store.set_rate(CurrencyCode::new("CHF"), 0.88));
        assert_eq!(store.rate(&CurrencyCode::new("CHF")), Some(0.88));
        assert!(!store.set_rate(CurrencyCode::usd(), 3.0));
        assert_eq!(store.rate(&CurrencyCode::usd()), Some(1.0));
    }

    #[test]
    fn test_ready_after_both_loads() {
        let store = RateStore::new(CurrencyCode::usd());
        store.replace_currencies(vec![Currency::new("USD", "US Dollar")]);
        assert!(!store.is_ready());

        store.replace_rates(RateTable::fallback());
        assert!(store.is_ready());
    }
}
