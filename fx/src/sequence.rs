//! Ordering of overlapping conversion requests.
//!
//! Conversions triggered by keystrokes and selection changes may complete out
//! of order when some of them wait on a network lookup. Each request takes a
//! ticket when it starts; a finished result is published only if no newer
//! ticket has published already.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::engine::ConversionDisplay;

/// Sequence number of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Published {
    ticket: Option<Ticket>,
    display: Option<ConversionDisplay>,
}

/// Issues tickets and keeps the newest published display.
#[derive(Debug, Default)]
pub struct ConversionSequencer {
    next: AtomicU64,
    published: Mutex<Published>,
}

impl ConversionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket. Tickets increase monotonically.
    pub fn issue(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publish `display` for `ticket`. Returns `false` and drops the display
    /// when a newer ticket has already published.
    pub fn publish(&self, ticket: Ticket, display: ConversionDisplay) -> bool {
        let mut published = self.published.lock();
        if let Some(current) = published.ticket {
            if ticket <= current {
                debug!(
                    ticket = ticket.value(),
                    current = current.value(),
                    "Discarding stale conversion result"
                );
                return false;
            }
        }
        published.ticket = Some(ticket);
        published.display = Some(display);
        true
    }

    /// The newest published display.
    pub fn latest(&self) -> Option<ConversionDisplay> {
        self.published.lock().display.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LookupCacheConfig;
    use crate::config::{Endpoints, SourceConfig};
    use crate::engine::ConversionEngine;
    use crate::source::{MockResponse, MockSource};
    use crate::store::RateStore;
    use fxwidget_common::{CurrencyCode, RateTable};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn display(text: &str) -> ConversionDisplay {
        ConversionDisplay {
            text: text.to_string(),
            rate_text: String::new(),
        }
    }

    #[test]
    fn test_tickets_increase() {
        let sequencer = ConversionSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();

        assert!(second > first);
        assert_eq!(second.value(), first.value() + 1);
    }

    #[test]
    fn test_stale_result_discarded() {
        let sequencer = ConversionSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();

        assert!(sequencer.publish(second, display("second")));
        assert!(!sequencer.publish(first, display("first")));

        assert_eq!(sequencer.latest().unwrap().text, "second");
    }

    #[test]
    fn test_in_order_results_published() {
        let sequencer = ConversionSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();

        assert!(sequencer.publish(first, display("first")));
        assert!(sequencer.publish(second, display("second")));
        assert_eq!(sequencer.latest().unwrap().text, "second");
    }

    #[tokio::test]
    async fn test_slow_lookup_does_not_overwrite_newer_result() {
        let source = Arc::new(MockSource::new("test"));
        let endpoints = Endpoints::new(&SourceConfig::default(), CurrencyCode::usd());
        let chf = CurrencyCode::new("CHF");
        source.set_response(
            endpoints.rates_for(&chf),
            MockResponse::Document(json!({"chf": {"eur": 1.05}})),
            Duration::from_millis(50),
        );

        let store = Arc::new(RateStore::new(CurrencyCode::usd()));
        store.replace_rates(RateTable::fallback());
        let engine = ConversionEngine::new(store, source, endpoints, LookupCacheConfig::default());
        let sequencer = ConversionSequencer::new();

        let slow = async {
            let ticket = sequencer.issue();
            let outcome = engine.convert(10.0, &chf, &CurrencyCode::eur()).await;
            sequencer.publish(ticket, outcome.display())
        };
        let fast = async {
            let ticket = sequencer.issue();
            let outcome = engine.convert(10.0, &CurrencyCode::usd(), &CurrencyCode::eur()).await;
            sequencer.publish(ticket, outcome.display())
        };

        let (slow_published, fast_published) = tokio::join!(slow, fast);

        assert!(fast_published);
        assert!(!slow_published);
        assert_eq!(sequencer.latest().unwrap().text, "10.00 USD = 9.20 EUR");
    }
}
