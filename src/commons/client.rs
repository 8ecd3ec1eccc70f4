// src/commons/client.rs
//! Reqwest-backed `MetadataSource` for the MediaWiki `api.php` endpoint.
//!
//! Single attempt per query, no retries. Any non-2xx status, transport error or
//! undecodable body is logged, counted, and absorbed as "no candidates".

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use std::time::{Duration, Instant};

use super::types::{ImageCandidate, MetadataSource};
use super::{candidates_from_response, ensure_metrics_described, parse_file_page, special_file_path};
use crate::config::ResolverConfig;

const SEARCH_KEYWORDS: &str = "(life restoration OR paleoart OR reconstruction OR illustration)";

pub struct CommonsClient {
    http: reqwest::Client,
    api_host: String,
    thumb_width: u32,
    category_limit: u32,
    search_limit: u32,
}

impl CommonsClient {
    pub fn new(cfg: &ResolverConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("building commons http client")?;
        ensure_metrics_described();
        Ok(Self {
            http,
            api_host: cfg.api_host.trim_end_matches('/').to_string(),
            thumb_width: cfg.thumb_width,
            category_limit: cfg.category_limit,
            search_limit: cfg.search_limit,
        })
    }

    /// GET `<host>/w/api.php?format=json&…` and decode the JSON body.
    async fn query(&self, host: &str, kind: &'static str, params: &[(&str, String)]) -> Result<Value> {
        counter!("commons_requests_total", "query" => kind).increment(1);
        let t0 = Instant::now();

        let endpoint = format!("{host}/w/api.php");
        let resp = self
            .http
            .get(&endpoint)
            .query(&[("action", "query"), ("format", "json")])
            .query(params)
            .send()
            .await
            .with_context(|| format!("commons {kind} get()"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("commons {kind} HTTP {status}"));
        }
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("commons {kind} .json()"))?;

        histogram!("commons_request_ms", "query" => kind).record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(body)
    }

    /// Run a generator query, absorbing every failure into an empty list.
    async fn candidates(&self, kind: &'static str, params: Vec<(&str, String)>) -> Vec<ImageCandidate> {
        match self.query(&self.api_host, kind, &params).await {
            Ok(body) => {
                let out = candidates_from_response(&body);
                counter!("commons_candidates_total", "query" => kind).increment(out.len() as u64);
                tracing::debug!(query = kind, count = out.len(), "commons candidates");
                out
            }
            Err(e) => {
                tracing::warn!(error = ?e, query = kind, "commons query failed");
                counter!("commons_request_errors_total", "query" => kind).increment(1);
                Vec::new()
            }
        }
    }

    fn imageinfo_params(&self) -> [(&'static str, String); 4] {
        [
            ("prop", "imageinfo|info".to_string()),
            ("inprop", "url".to_string()),
            ("iiprop", "url|size|mime".to_string()),
            ("iiurlwidth", self.thumb_width.to_string()),
        ]
    }
}

#[async_trait]
impl MetadataSource for CommonsClient {
    async fn file_page_image(&self, page_url: &str) -> Option<String> {
        let (host, title) = parse_file_page(page_url)?;
        let params = [
            ("titles", format!("File:{title}")),
            ("prop", "imageinfo".to_string()),
            ("iiprop", "url|mime|size".to_string()),
            ("iiurlwidth", self.thumb_width.to_string()),
        ];

        match self.query(&host, "file_page", &params).await {
            Ok(body) => {
                let direct = candidates_from_response(&body)
                    .into_iter()
                    .find_map(|c| c.url);
                Some(direct.unwrap_or_else(|| {
                    special_file_path(&host, &title, Some(self.thumb_width))
                }))
            }
            Err(e) => {
                tracing::warn!(error = ?e, page = page_url, "file page lookup failed; using FilePath guess");
                counter!("commons_request_errors_total", "query" => "file_page").increment(1);
                Some(special_file_path(&self.api_host, &title, None))
            }
        }
    }

    async fn category_candidates(&self, taxon: &str) -> Vec<ImageCandidate> {
        let mut params = vec![
            ("generator", "categorymembers".to_string()),
            ("gcmtitle", format!("Category:Life restorations of {taxon}")),
            ("gcmtype", "file".to_string()),
            ("gcmlimit", self.category_limit.to_string()),
        ];
        params.extend(self.imageinfo_params());
        self.candidates("category", params).await
    }

    async fn search_candidates(&self, taxon: &str) -> Vec<ImageCandidate> {
        let mut params = vec![
            ("generator", "search".to_string()),
            ("gsrsearch", format!("filetype:bitmap {taxon} {SEARCH_KEYWORDS}")),
            ("gsrlimit", self.search_limit.to_string()),
        ];
        params.extend(self.imageinfo_params());
        self.candidates("search", params).await
    }

    fn name(&self) -> &'static str {
        "commons"
    }
}
