// tests/commons_http.rs
//
// HTTP-level tests for CommonsClient against an in-process stand-in for
// `/w/api.php`, served by axum on 127.0.0.1:0.
//
// Covered:
// - file page lookup (thumb URL, FilePath fallback, transport failure guess)
// - category + search query shapes and candidate normalization
// - non-2xx and malformed bodies absorbed as empty results
// - full Resolver chain over HTTP

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use paleoart_resolver::commons::{CommonsClient, MetadataSource};
use paleoart_resolver::config::ResolverConfig;
use paleoart_resolver::resolve::{placeholder_url, Resolver, Stage};
use paleoart_resolver::table::Row;

const CATEGORY_JSON: &str = include_str!("fixtures/category_response.json");

/// Mirrors the real API closely enough: validates the fixed parameters, then
/// answers per query shape. Unknown shapes get a 400.
async fn api(Query(q): Query<HashMap<String, String>>) -> Response {
    let param = |k: &str| q.get(k).map(String::as_str).unwrap_or("");
    if param("action") != "query" || param("format") != "json" {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match (param("generator"), param("titles")) {
        ("categorymembers", _) => {
            let ok = param("gcmtitle") == "Category:Life restorations of Allosaurus"
                && param("gcmtype") == "file"
                && param("gcmlimit") == "20"
                && param("iiurlwidth") == "800"
                && param("iiprop") == "url|size|mime";
            if !ok {
                return StatusCode::BAD_REQUEST.into_response();
            }
            let body: Value = serde_json::from_str(CATEGORY_JSON).expect("fixture json");
            Json(body).into_response()
        }
        ("search", _) => {
            let ok = param("gsrsearch")
                == "filetype:bitmap Iguanodon (life restoration OR paleoart OR reconstruction OR illustration)"
                && param("gsrlimit") == "40";
            if !ok {
                return StatusCode::BAD_REQUEST.into_response();
            }
            Json(json!({ "query": { "pages": [
                { "title": "File:Iguanodon museum mount.jpg", "index": 1,
                  "imageinfo": [{ "url": "https://img/mount.jpg", "mime": "image/jpeg", "width": 3000, "height": 2000 }] },
                { "title": "File:Iguanodon illustration.png", "index": 2,
                  "imageinfo": [{ "url": "https://img/igu.png", "mime": "image/png", "width": 900, "height": 600 }] }
            ] } }))
            .into_response()
        }
        ("", "File:Thumb ok.png") => Json(json!({ "query": { "pages": { "5": {
            "title": "File:Thumb ok.png",
            "imageinfo": [{ "url": "https://img/full.png", "thumburl": "https://img/800px.png" }]
        } } } }))
        .into_response(),
        ("", "File:No info.png") => Json(json!({ "query": { "pages": { "-1": {
            "title": "File:No info.png", "missing": ""
        } } } }))
        .into_response(),
        ("", "File:Broken.png") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        ("", "File:Garbage.png") => "<html>not json</html>".into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Serve the stand-in and return its base URL.
async fn spawn_api() -> String {
    let app = Router::new().route("/w/api.php", get(api));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test api");
    });
    format!("http://{addr}")
}

fn client_for(base: &str) -> CommonsClient {
    let cfg = ResolverConfig {
        api_host: base.to_string(),
        timeout_secs: Some(5),
        ..ResolverConfig::default()
    };
    CommonsClient::new(&cfg).expect("build client")
}

#[tokio::test]
async fn file_page_prefers_thumbnail() {
    let base = spawn_api().await;
    let client = client_for(&base);
    let url = client
        .file_page_image(&format!("{base}/wiki/File:Thumb%20ok.png"))
        .await;
    assert_eq!(url.as_deref(), Some("https://img/800px.png"));
}

#[tokio::test]
async fn file_page_without_imageinfo_builds_file_path() {
    let base = spawn_api().await;
    let client = client_for(&base);
    let url = client
        .file_page_image(&format!("{base}/wiki/File:No%20info.png"))
        .await;
    assert_eq!(
        url.as_deref(),
        Some(format!("{base}/wiki/Special:FilePath/No%20info.png?width=800").as_str())
    );
}

#[tokio::test]
async fn file_page_failures_fall_back_to_file_path_guess() {
    let base = spawn_api().await;
    let client = client_for(&base);

    for title in ["Broken.png", "Garbage.png"] {
        let url = client
            .file_page_image(&format!("{base}/wiki/File:{title}"))
            .await;
        assert_eq!(
            url,
            Some(format!("{base}/wiki/Special:FilePath/{title}")),
            "title {title}"
        );
    }
}

#[tokio::test]
async fn unrecognized_page_urls_decline() {
    let base = spawn_api().await;
    let client = client_for(&base);
    assert_eq!(client.file_page_image("https://example.org/a.png").await, None);
    assert_eq!(client.file_page_image(&format!("{base}/wiki/File:")).await, None);
}

#[tokio::test]
async fn category_query_normalizes_pages() {
    let base = spawn_api().await;
    let client = client_for(&base);
    let cands = client.category_candidates("Allosaurus").await;

    assert_eq!(cands.len(), 3);
    assert_eq!(cands[0].title, "File:Allosaurus life restoration.png");
    assert_eq!(cands[0].url.as_deref(), Some("https://img/800px-allo.png"));
    assert_eq!((cands[0].width, cands[0].height), (2400, 1600));
    assert_eq!(cands[2].url, None, "page without imageinfo keeps url None");
}

#[tokio::test]
async fn rejected_queries_are_empty_not_errors() {
    let base = spawn_api().await;
    let client = client_for(&base);
    // Wrong taxon → stand-in answers 400.
    assert!(client.category_candidates("Nope").await.is_empty());
    assert!(client.search_candidates("Nope").await.is_empty());

    // Nothing listening at all.
    let dead = client_for("http://127.0.0.1:9");
    assert!(dead.category_candidates("Allosaurus").await.is_empty());
}

#[tokio::test]
async fn resolver_over_http_walks_the_chain() {
    let base = spawn_api().await;
    let resolver = Resolver::new(client_for(&base));

    let allo = Row::new("genus", [("genus", "Allosaurus")], None);
    let res = resolver.resolve(&allo).await;
    assert_eq!(res.stage, Stage::Category);
    assert_eq!(res.url, "https://img/800px-allo.png");

    // Category 400s, search finds the illustration (the mount is filtered out).
    let igu = Row::new("genus", [("genus", "Iguanodon")], None);
    let res = resolver.resolve(&igu).await;
    assert_eq!(res.stage, Stage::Search);
    assert_eq!(res.url, "https://img/igu.png");

    let nothing = Row::new("genus", [("genus", "Nope")], None);
    let res = resolver.resolve(&nothing).await;
    assert_eq!(res.stage, Stage::Placeholder);
    assert_eq!(res.url, placeholder_url());
}
