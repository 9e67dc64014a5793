//! fxwidget FX Engine
//!
//! Currency catalog and exchange rate loading plus the conversion engine
//! behind the fxwidget converter.
//!
//! # Features
//!
//! - Catalog loading from a primary source with a mirror fallback
//! - Bulk rate loading with a static fallback table
//! - Direct per-currency lookups with a TTL cache
//! - Sequenced conversions so the newest request wins
//!
//! # Example
//!
//! ```rust,ignore
//! use fxwidget_fx::{Widget, WidgetConfig};
//! use fxwidget_common::CurrencyCode;
//!
//! let widget = Widget::from_config(WidgetConfig::from_env())?;
//! widget.initialize().await?;
//!
//! widget.select_to(CurrencyCode::gbp()).await?;
//! let display = widget.on_amount_input("250").await?;
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod rates;
pub mod schema;
pub mod selection;
pub mod sequence;
pub mod source;
pub mod store;
pub mod widget;

pub use cache::{LookupCache, LookupCacheConfig};
pub use catalog::{CatalogLoader, CatalogStrategy};
pub use config::{Endpoints, SourceConfig, WidgetConfig};
pub use engine::{parse_amount, Conversion, ConversionDisplay, ConversionEngine, ConversionOutcome, RatePath};
pub use error::{FxError, FxResult};
pub use rates::RateLoader;
pub use selection::{Selection, SelectorCursor};
pub use sequence::{ConversionSequencer, Ticket};
pub use source::{DocumentSource, HttpSource};
pub use store::{RateStore, SharedRateStore};
pub use widget::{Notice, Widget, LOAD_FAILURE_NOTICE};
