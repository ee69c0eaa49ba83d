//! # OAS Generator classifiers
//!
//! Pure predicates the generator applies before and during inference:
//!
//! - [`is_gibberish`] / [`is_version_string`] decide whether a URL path
//!   segment is an identifier that must become a path parameter.
//! - [`extension_ignored`], [`ctype_ignored`], [`header_ignored`] drop
//!   static assets and boilerplate headers.
//!
//! The compiled pattern table and the trigram vocabulary are built once
//! per process and shared read-only between threads.

mod gibberish;
mod ignores;
mod trigrams;

pub use gibberish::{is_gibberish, is_version_string, noise_level};
pub use ignores::{ctype_ignored, extension_ignored, header_ignored};
