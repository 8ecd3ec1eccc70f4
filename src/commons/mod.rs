// src/commons/mod.rs
pub mod client;
pub mod types;

pub use client::CommonsClient;
pub use types::{ImageCandidate, MetadataSource};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// `<scheme://host>/wiki/File:<title>`; title is still percent-encoded.
pub(crate) static FILE_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?://[^/]+)/wiki/File:(.+)$").expect("file page regex"));

/// One-time metrics registration (so series show up once a recorder exists).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("commons_requests_total", "Commons API requests issued.");
        describe_counter!(
            "commons_request_errors_total",
            "Commons API requests absorbed as empty results."
        );
        describe_counter!(
            "commons_candidates_total",
            "Image candidates returned by Commons queries."
        );
        describe_histogram!("commons_request_ms", "Commons API round-trip in milliseconds.");
        describe_counter!(
            "resolve_stage_total",
            "Rows resolved, labelled by the stage that produced the URL."
        );
    });
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<QueryBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryBlock {
    #[serde(default)]
    pages: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageInfo {
    thumburl: Option<String>,
    url: Option<String>,
    mime: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Position of a page-id key that counts as an array index (canonical
/// decimal below `u32::MAX`). Such keys enumerate first, in numeric order.
fn page_id_key(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|n| *n != u32::MAX && n.to_string() == key)
}

/// Map any Commons `action=query` response into candidates.
///
/// `query.pages` may be keyed by page id (formatversion=1) or a plain array
/// (formatversion=2). Pages that fail to decode are skipped.
///
/// Order: an array keeps response order. A keyed object yields numeric page
/// ids ascending, then any other keys (e.g. `"-1"` for missing pages) in
/// response order. The search `index` field is not consulted.
pub fn candidates_from_response(body: &Value) -> Vec<ImageCandidate> {
    let resp: ApiResponse = match ApiResponse::deserialize(body) {
        Ok(r) => r,
        Err(_) => return Vec::new(),
    };
    let pages: Vec<Value> = match resp.query.and_then(|q| q.pages) {
        Some(Value::Object(map)) => {
            let mut keyed: Vec<(Option<u32>, Value)> = map
                .into_iter()
                .map(|(k, v)| (page_id_key(&k), v))
                .collect();
            // Stable: non-numeric keys keep response order after the numeric ones.
            keyed.sort_by_key(|(id, _)| (id.is_none(), id.unwrap_or(0)));
            keyed.into_iter().map(|(_, v)| v).collect()
        }
        Some(Value::Array(list)) => list,
        _ => return Vec::new(),
    };

    pages
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Page>(v).ok())
        .map(|p| {
            let info = p.imageinfo.into_iter().next().unwrap_or_default();
            ImageCandidate {
                title: p.title,
                url: non_empty(info.thumburl).or_else(|| non_empty(info.url)),
                mime: info.mime.unwrap_or_default(),
                width: info.width.unwrap_or(0),
                height: info.height.unwrap_or(0),
            }
        })
        .collect()
}

/// Split a File page URL into (`scheme://host`, decoded title without "File:").
pub fn parse_file_page(url: &str) -> Option<(String, String)> {
    let caps = FILE_PAGE_RE.captures(url.trim())?;
    let host = caps.get(1)?.as_str().to_string();
    let raw = caps.get(2)?.as_str();
    let title = urlencoding::decode(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let title = title.trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some((host, title))
}

/// `<host>/wiki/Special:FilePath/<title>`, optionally sized.
pub fn special_file_path(host: &str, title: &str, width: Option<u32>) -> String {
    let mut out = format!(
        "{}/wiki/Special:FilePath/{}",
        host.trim_end_matches('/'),
        urlencoding::encode(title)
    );
    if let Some(w) = width {
        out.push_str(&format!("?width={w}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyed_pages_map_to_candidates() {
        let body = json!({
            "query": { "pages": {
                "11": { "title": "File:A.png", "imageinfo": [
                    { "url": "https://u/A.png", "thumburl": "https://t/A.png",
                      "mime": "image/png", "width": 1200, "height": 800 } ] },
                "-1": { "title": "File:Missing.png", "missing": "" }
            } }
        });
        let c = candidates_from_response(&body);
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].url.as_deref(), Some("https://t/A.png"));
        assert_eq!(c[0].width * c[0].height, 960_000);
        assert_eq!(c[1].url, None);
        assert_eq!(c[1].mime, "");
    }

    #[test]
    fn array_pages_keep_response_order() {
        let body = json!({ "query": { "pages": [
            { "title": "File:Second.png", "index": 2, "imageinfo": [ { "url": "https://u/2" } ] },
            { "title": "File:First.png", "index": 1, "imageinfo": [ { "url": "https://u/1", "thumburl": "" } ] }
        ] } });
        let c = candidates_from_response(&body);
        assert_eq!(c[0].title, "File:Second.png");
        assert_eq!(c[1].title, "File:First.png");
        assert_eq!(c[1].url.as_deref(), Some("https://u/1"));
    }

    #[test]
    fn keyed_pages_follow_numeric_page_id_order() {
        let body = json!({ "query": { "pages": {
            "300": { "title": "File:C.png", "index": 1 },
            "-1": { "title": "File:Missing.png", "missing": "" },
            "20": { "title": "File:B.png", "index": 3 },
            "007": { "title": "File:Odd key.png" },
            "4": { "title": "File:A.png", "index": 2 }
        } } });
        let titles: Vec<String> = candidates_from_response(&body)
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(
            titles,
            ["File:A.png", "File:B.png", "File:C.png", "File:Missing.png", "File:Odd key.png"]
        );
    }

    #[test]
    fn unexpected_shapes_are_empty() {
        assert!(candidates_from_response(&json!({ "error": { "code": "x" } })).is_empty());
        assert!(candidates_from_response(&json!([1, 2, 3])).is_empty());
        assert!(candidates_from_response(&json!({ "batchcomplete": "" })).is_empty());
    }

    #[test]
    fn file_page_title_is_decoded() {
        let (host, title) =
            parse_file_page("https://commons.wikimedia.org/wiki/File:T%20rex%20restoration.png")
                .unwrap();
        assert_eq!(host, "https://commons.wikimedia.org");
        assert_eq!(title, "T rex restoration.png");
        assert!(parse_file_page("https://example.org/img/x.png").is_none());
        assert!(parse_file_page("https://example.org/wiki/File:").is_none());
    }

    #[test]
    fn special_file_path_encodes_title() {
        assert_eq!(
            special_file_path("https://c.org/", "T rex.png", Some(800)),
            "https://c.org/wiki/Special:FilePath/T%20rex.png?width=800"
        );
    }
}
