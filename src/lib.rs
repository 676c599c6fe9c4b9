//! # Page Mirror
//!
//! Download a single web page together with its same-origin assets and
//! rewrite the markup so the saved copy works offline.
//!
//! ## Architecture
//!
//! - **naming**: URL to filesystem-safe name derivation
//! - **rewrite**: Asset discovery and markup rewriting
//! - **fetch**: HTTP client wrapper (page text, asset downloads)
//! - **mirror**: Pipeline orchestration and the run-level error taxonomy
//! - **config**: Configuration loading and validation

pub mod config;
pub mod fetch;
pub mod mirror;
pub mod naming;
pub mod rewrite;

pub use fetch::{FetchError, Fetcher, FetcherConfig};
pub use mirror::{mirror_page, MirrorError, MirrorResult};
pub use rewrite::{ResourceRef, RewrittenPage};
