// src/resolve.rs
//! Per-row image resolution: an ordered list of attempts, first hit wins.
//!
//! 1. `art_url` is a File page → ask the metadata source for its image.
//! 2. `art_url` is a direct image file (not a File page) → use it verbatim.
//! 3. Category "Life restorations of <id>" → rank → best.
//! 4. Full-text search → rank → best.
//! 5. Embedded placeholder (never fails).
//!
//! Remote attempts absorb their own failures, so a broken step only means
//! "no candidate here" and the chain moves on.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::classify::Vocabulary;
use crate::commons::{ensure_metrics_described, MetadataSource};
use crate::config::ResolverConfig;
use crate::rank::{pick_best_art, ScoringParams};
use crate::table::Row;

static HTTP_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").expect("http regex"));
static FILE_PAGE_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/wiki/File:").expect("file page hint regex"));
static DIRECT_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)(\?.*)?$").expect("direct image regex")
});

const PLACEHOLDER_SVG: &str = r##"
    <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 640 420">
      <defs><linearGradient id="g" x1="0" y1="0" x2="1" y2="1">
        <stop stop-color="#172448"/><stop offset="1" stop-color="#0b1330"/></linearGradient></defs>
      <rect width="640" height="420" fill="url(#g)"/>
      <g fill="#7aa2ff" opacity=".9">
        <path d="M60,320 Q240,180 360,260 Q440,300 580,290 Q520,330 450,340 Q360,350 280,330 Q200,310 120,350 Z"/>
      </g>
    </svg>"##;

/// Inline SVG data URI returned when nothing else resolves.
pub static PLACEHOLDER_URL: Lazy<String> = Lazy::new(|| {
    format!(
        "data:image/svg+xml;utf8,{}",
        urlencoding::encode(PLACEHOLDER_SVG)
    )
});

pub fn placeholder_url() -> &'static str {
    PLACEHOLDER_URL.as_str()
}

/// Which attempt produced the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FilePage,
    DirectUrl,
    Category,
    Search,
    Placeholder,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FilePage => "file_page",
            Stage::DirectUrl => "direct_url",
            Stage::Category => "category",
            Stage::Search => "search",
            Stage::Placeholder => "placeholder",
        }
    }
}

/// The fallible stages, in priority order. `Stage::Placeholder` follows them.
#[derive(Debug, Clone, Copy)]
enum Attempt {
    FilePage,
    DirectUrl,
    Category,
    Search,
}

impl Attempt {
    const ORDER: [Attempt; 4] = [
        Attempt::FilePage,
        Attempt::DirectUrl,
        Attempt::Category,
        Attempt::Search,
    ];

    fn stage(self) -> Stage {
        match self {
            Attempt::FilePage => Stage::FilePage,
            Attempt::DirectUrl => Stage::DirectUrl,
            Attempt::Category => Stage::Category,
            Attempt::Search => Stage::Search,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub url: String,
    pub stage: Stage,
}

impl Resolution {
    fn placeholder() -> Self {
        Self {
            url: PLACEHOLDER_URL.clone(),
            stage: Stage::Placeholder,
        }
    }
}

/// `art_url` values worth a look: absolute http(s) links only.
fn http_art_url(row: &Row) -> Option<&str> {
    row.art_url.as_deref().filter(|u| HTTP_URL.is_match(u))
}

pub struct Resolver<S> {
    source: S,
    vocab: Vocabulary,
    scoring: ScoringParams,
    max_concurrent: usize,
}

impl<S: MetadataSource> Resolver<S> {
    /// Built-in vocabulary and scoring constants.
    pub fn new(source: S) -> Self {
        ensure_metrics_described();
        Self {
            source,
            vocab: Vocabulary::default(),
            scoring: ScoringParams::default(),
            max_concurrent: 4,
        }
    }

    pub fn from_config(source: S, cfg: &ResolverConfig) -> Self {
        Self {
            vocab: cfg.vocabulary.clone(),
            scoring: cfg.scoring,
            max_concurrent: cfg.max_concurrent.max(1),
            ..Self::new(source)
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn attempt(&self, attempt: Attempt, row: &Row) -> Option<String> {
        match attempt {
            Attempt::FilePage => {
                let url = http_art_url(row).filter(|u| FILE_PAGE_HINT.is_match(u))?;
                self.source.file_page_image(url).await
            }
            // A File page is HTML even when its title ends in ".png".
            Attempt::DirectUrl => http_art_url(row)
                .filter(|u| !FILE_PAGE_HINT.is_match(u) && DIRECT_IMAGE.is_match(u))
                .map(str::to_string),
            Attempt::Category => {
                let cands = self.source.category_candidates(row.id()).await;
                pick_best_art(&cands, &self.vocab, &self.scoring)
            }
            Attempt::Search => {
                let cands = self.source.search_candidates(row.id()).await;
                pick_best_art(&cands, &self.vocab, &self.scoring)
            }
        }
    }

    /// Resolve one row. Always yields a displayable URL.
    pub async fn resolve(&self, row: &Row) -> Resolution {
        let mut resolution = Resolution::placeholder();
        for attempt in Attempt::ORDER {
            let stage = attempt.stage();
            if let Some(url) = self.attempt(attempt, row).await {
                resolution = Resolution { url, stage };
                break;
            }
            debug!(id = row.id(), stage = stage.as_str(), "stage declined");
        }

        counter!("resolve_stage_total", "stage" => resolution.stage.as_str()).increment(1);
        info!(
            id = row.id(),
            stage = resolution.stage.as_str(),
            source = self.source.name(),
            "resolved image"
        );
        resolution
    }

    pub async fn resolve_url(&self, row: &Row) -> String {
        self.resolve(row).await.url
    }
}

impl<S: MetadataSource + 'static> Resolver<S> {
    /// Resolve many rows concurrently (at most `max_concurrent` in flight).
    /// Output order matches `rows`; a panicked task yields the placeholder.
    pub async fn resolve_all(self: Arc<Self>, rows: Vec<Row>) -> Vec<Resolution> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut out: Vec<Option<Resolution>> = vec![None; rows.len()];
        let mut set = JoinSet::new();

        for (i, row) in rows.into_iter().enumerate() {
            let this = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                // Semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                (i, this.resolve(&row).await)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((i, r)) => out[i] = Some(r),
                Err(e) => warn!(error = ?e, "resolution task failed"),
            }
        }

        out.into_iter()
            .map(|r| r.unwrap_or_else(Resolution::placeholder))
            .collect()
    }
}
