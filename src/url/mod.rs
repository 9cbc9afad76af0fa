//! URL handling module for Sumi-Sweep
//!
//! This module provides URL normalization, the stable ledger hash, politeness
//! keys, and the scope predicate that decides which URLs may be crawled.

mod domain;
mod normalize;
mod scope;

pub use domain::{domain_key, origin};
pub use normalize::{normalize_url, url_hash};
pub use scope::{matches_wildcard, Scope};
