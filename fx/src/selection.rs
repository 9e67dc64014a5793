//! Currency pair selection and searchable list navigation.

use fxwidget_common::{Catalog, Currency, CurrencyCode};
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// The selected `from` and `to` currencies. They may be equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl Selection {
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }

    /// Select the source currency; it must be in the catalog.
    pub fn set_from(&mut self, code: CurrencyCode, catalog: &Catalog) -> FxResult<()> {
        self.from = Self::checked(code, catalog)?;
        Ok(())
    }

    /// Select the target currency; it must be in the catalog.
    pub fn set_to(&mut self, code: CurrencyCode, catalog: &Catalog) -> FxResult<()> {
        self.to = Self::checked(code, catalog)?;
        Ok(())
    }

    /// Replace any code missing from `catalog` with its first entry.
    /// Returns whether anything changed.
    pub fn reconcile(&mut self, catalog: &Catalog) -> bool {
        let Some(first) = catalog.currencies().first().map(|c| c.code.clone()) else {
            return false;
        };

        let mut changed = false;
        let from = self.from.clone();
        if self.set_from(from, catalog).is_err() {
            self.from = first.clone();
            changed = true;
        }
        let to = self.to.clone();
        if self.set_to(to, catalog).is_err() {
            self.to = first;
            changed = true;
        }
        changed
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    fn checked(code: CurrencyCode, catalog: &Catalog) -> FxResult<CurrencyCode> {
        if catalog.contains(&code) {
            Ok(code)
        } else {
            Err(FxError::UnknownCurrency(code))
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(CurrencyCode::usd(), CurrencyCode::eur())
    }
}

/// Keyboard-style navigation over a filtered currency list.
///
/// Nothing is highlighted until the first move; moves wrap at both ends.
#[derive(Debug, Clone, Default)]
pub struct SelectorCursor {
    items: Vec<Currency>,
    active: Option<usize>,
}

impl SelectorCursor {
    pub fn new(items: Vec<Currency>) -> Self {
        Self {
            items,
            active: None,
        }
    }

    /// Cursor over the catalog entries matching `term`.
    pub fn search(catalog: &Catalog, term: &str) -> Self {
        Self::new(catalog.search(term))
    }

    /// Replace the list, clearing the highlight.
    pub fn reset(&mut self, items: Vec<Currency>) {
        self.items = items;
        self.active = None;
    }

    pub fn items(&self) -> &[Currency] {
        &self.items
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Move the highlight down.
    pub fn next(&mut self) -> Option<&Currency> {
        if self.items.is_empty() {
            return None;
        }
        self.active = Some(match self.active {
            Some(i) => (i + 1) % self.items.len(),
            None => 0,
        });
        self.current()
    }

    /// Move the highlight up.
    pub fn prev(&mut self) -> Option<&Currency> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len();
        self.active = Some(match self.active {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        });
        self.current()
    }

    /// The highlighted entry.
    pub fn current(&self) -> Option<&Currency> {
        self.active.and_then(|i| self.items.get(i))
    }
}
