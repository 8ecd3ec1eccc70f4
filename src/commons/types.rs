// src/commons/types.rs
use serde::{Deserialize, Serialize};

/// One remote image file considered as a row's illustration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageCandidate {
    /// e.g. "File:Allosaurus life restoration.png"
    pub title: String,
    /// Thumbnail if offered, else the original.
    pub url: Option<String>,
    /// `""` when the service omitted it.
    pub mime: String,
    pub width: u64,
    pub height: u64,
}

impl ImageCandidate {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// Read-only image metadata lookups. Implementations never fail outwardly:
/// transport or decode problems come back as `None` / an empty list.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Direct image URL for a `…/wiki/File:<title>` page URL.
    /// `None` when the URL is not a recognized File page.
    async fn file_page_image(&self, page_url: &str) -> Option<String>;

    /// Members of "Category:Life restorations of <taxon>".
    async fn category_candidates(&self, taxon: &str) -> Vec<ImageCandidate>;

    /// Full-text bitmap search for artwork of `taxon`.
    async fn search_candidates(&self, taxon: &str) -> Vec<ImageCandidate>;

    fn name(&self) -> &'static str;
}
