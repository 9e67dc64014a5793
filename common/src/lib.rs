//! fxwidget Common Types
//!
//! Shared types used across the fxwidget crates: currency codes and the
//! catalog of supported currencies, base-relative rate tables, and the
//! numeric formatting used for display.

pub mod currency;
pub mod rates;
pub mod format;
pub mod error;

pub use currency::*;
pub use rates::*;
pub use format::*;
pub use error::*;
