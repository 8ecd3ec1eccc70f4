// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod commons;
pub mod config;
pub mod range;
pub mod rank;
pub mod resolve;
pub mod table;

// ---- Re-exports for stable public API ----
pub use crate::classify::{looks_fossil_or_mount, looks_paleoart, Vocabulary};
pub use crate::commons::{CommonsClient, ImageCandidate, MetadataSource};
pub use crate::config::ResolverConfig;
pub use crate::range::{color_for, parse_range, Period, TimeRange, PERIODS};
pub use crate::rank::{pick_best_art, rank_candidates, ScoringParams};
pub use crate::resolve::{placeholder_url, Resolution, Resolver, Stage};
pub use crate::table::{load_table, read_table, ParsedTable, Row};

use std::sync::Arc;

/// Build a Commons-backed resolver from config (convenience for binaries).
pub fn commons_resolver(cfg: &ResolverConfig) -> anyhow::Result<Arc<Resolver<CommonsClient>>> {
    let client = CommonsClient::new(cfg)?;
    Ok(Arc::new(Resolver::from_config(client, cfg)))
}
