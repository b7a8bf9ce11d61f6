// tests/reddit_mock.rs
//
// RedditClient against an in-process mock of the token + search endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};

use social_sentiment_analyzer::config::RedditSettings;
use social_sentiment_analyzer::ingest::{PostSource, RedditClient, RedditCredentials};

#[derive(Clone, Default)]
struct MockState {
    token_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
    me_calls: Arc<AtomicUsize>,
}

async fn token(
    State(st): State<MockState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    st.token_calls.fetch_add(1, Ordering::SeqCst);
    let has_basic = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !has_basic || form.get("username").map(String::as_str) == Some("wrong") {
        // Reddit answers bad credentials with 200 + error body
        return Json(json!({ "error": "invalid_grant" }));
    }
    let expires_in = if form.get("username").map(String::as_str) == Some("forever") {
        u64::MAX
    } else {
        3600
    };
    Json(json!({ "access_token": "tok-123", "token_type": "bearer", "expires_in": expires_in }))
}

/// An authenticated endpoint that search must never reach.
async fn me(State(st): State<MockState>) -> Json<Value> {
    st.me_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "kind": "Listing", "data": {
        "after": null,
        "children": [ post_json("SECRET-ENDPOINT", "") ]
    }}))
}

fn post_json(title: &str, selftext: &str) -> Value {
    json!({ "kind": "t3", "data": { "title": title, "selftext": selftext } })
}

async fn search(
    State(st): State<MockState>,
    Path(sub): Path<String>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    st.search_calls.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != "Bearer tok-123" {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if sub == "broken" {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    assert_eq!(q.get("restrict_sr").map(String::as_str), Some("on"));
    let body = match q.get("after").map(String::as_str) {
        None => json!({ "kind": "Listing", "data": {
            "after": "t3_b",
            "children": [
                post_json(&format!("{} in r/{sub}", q["q"]), "Love it &amp; the battery"),
                post_json("Second", ""),
            ]
        }}),
        Some("t3_b") => json!({ "kind": "Listing", "data": {
            "after": null,
            "children": [ post_json("Third", "Terrible support") ]
        }}),
        Some(_) => json!({ "kind": "Listing", "data": { "after": null, "children": [] } }),
    };
    Ok(Json(body))
}

async fn spawn_mock() -> (SocketAddr, MockState) {
    let st = MockState::default();
    let app = Router::new()
        .route("/api/v1/access_token", post(token))
        .route("/r/{sub}/search", get(search))
        .route("/api/v1/me", get(me))
        .with_state(st.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, st)
}

fn settings(addr: SocketAddr) -> RedditSettings {
    RedditSettings {
        auth_url: format!("http://{addr}/api/v1/access_token"),
        api_url: format!("http://{addr}"),
        ..RedditSettings::default()
    }
}

fn creds(username: &str) -> RedditCredentials {
    RedditCredentials {
        client_id: "cid".into(),
        client_secret: "secret".into(),
        username: username.into(),
        password: "pw".into(),
        user_agent: Some("tests/0.1".into()),
    }
}

#[tokio::test]
async fn paginates_and_decodes_entities() {
    let (addr, st) = spawn_mock().await;
    let client = RedditClient::new(settings(addr), Some(creds("me"))).unwrap();

    let posts = client.search("pixel", "android", 50).await;
    assert_eq!(
        posts,
        vec![
            "pixel in r/android Love it & the battery".to_string(),
            "Second ".to_string(),
            "Third Terrible support".to_string(),
        ]
    );
    assert_eq!(st.search_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn limit_truncates_and_token_is_cached() {
    let (addr, st) = spawn_mock().await;
    let client = RedditClient::new(settings(addr), Some(creds("me"))).unwrap();

    assert_eq!(client.search("a", "all", 1).await.len(), 1);
    assert_eq!(client.search("b", "all", 2).await.len(), 2);
    assert_eq!(st.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blank_community_falls_back_to_default() {
    let (addr, _st) = spawn_mock().await;
    let client = RedditClient::new(settings(addr), Some(creds("me"))).unwrap();
    let posts = client.search("q", "  ", 1).await;
    assert_eq!(posts, vec!["q in r/all Love it & the battery".to_string()]);
}

#[tokio::test]
async fn failures_yield_empty_results() {
    let (addr, _st) = spawn_mock().await;

    let rejected = RedditClient::new(settings(addr), Some(creds("wrong"))).unwrap();
    assert!(rejected.search("pixel", "all", 10).await.is_empty());

    let ok = RedditClient::new(settings(addr), Some(creds("me"))).unwrap();
    assert!(ok.search("pixel", "broken", 10).await.is_empty());
    assert!(ok.search("   ", "all", 10).await.is_empty());

    // nothing listening here
    let dead = RedditSettings {
        auth_url: "http://127.0.0.1:9/api/v1/access_token".into(),
        api_url: "http://127.0.0.1:9".into(),
        ..RedditSettings::default()
    };
    let unreachable = RedditClient::new(dead, Some(creds("me"))).unwrap();
    assert!(unreachable.search("pixel", "all", 10).await.is_empty());
}

#[tokio::test]
async fn subreddit_cannot_escape_the_search_path() {
    let (addr, st) = spawn_mock().await;
    let client = RedditClient::new(settings(addr), Some(creds("me"))).unwrap();

    for community in ["x/../../api/v1/me?", "../api/v1/me", "all/../../api/v1/me"] {
        assert!(client.search("q", community, 5).await.is_empty(), "{community}");
    }
    assert_eq!(st.me_calls.load(Ordering::SeqCst), 0);
    assert_eq!(st.search_calls.load(Ordering::SeqCst), 0);
    assert_eq!(st.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn huge_token_lifetime_does_not_panic() {
    let (addr, st) = spawn_mock().await;
    let client = Arc::new(RedditClient::new(settings(addr), Some(creds("forever"))).unwrap());

    let c = Arc::clone(&client);
    let posts = tokio::spawn(async move { c.search("pixel", "all", 1).await })
        .await
        .expect("search task must not panic");
    assert_eq!(posts.len(), 1);

    // still cached, bounded lifetime
    assert_eq!(client.search("pixel", "all", 1).await.len(), 1);
    assert_eq!(st.token_calls.load(Ordering::SeqCst), 1);
}
