//! Error handling foundation for hirepath.
//!
//! Only the `Result` alias lives here. Each crate defines its own error enums
//! and wraps them in rootcause's `Report` as they propagate.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
