//! Page retrieval and article-body extraction.
//!
//! This module turns an article link into clean text and a handful of images.
//! It is split the same way the work flows:
//!
//! | Step | Module | Notes |
//! |------|--------|-------|
//! | Fetch | [`fetch`] | `reqwest` client with timeout and browser headers |
//! | Locate body | [`selectors`] | Per-domain selector table, generic fallback list |
//! | Extract | [`extract`] | Selector cascade, then paragraphs, then body text |
//! | Clean | [`normalize`] | Whitespace, zero-width characters, HTML entities |
//! | Images | [`images`] | `src`/`data-src`, absolute URLs, icon filtering, max 5 |
//!
//! # Common Patterns
//!
//! - Selectors are compiled once when the table is built; extraction itself
//!   cannot fail and returns [`extract::ExtractionStrategy::Empty`] when a page
//!   has nothing usable.
//! - Only the fetch step produces errors ([`crate::error::FetchError`]).

pub mod extract;
pub mod fetch;
pub mod images;
pub mod normalize;
pub mod selectors;

pub use extract::{Extraction, ExtractionStrategy, Extractor};
pub use fetch::{HttpFetcher, PageFetcher};
pub use selectors::SelectorTable;
