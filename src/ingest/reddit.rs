// src/ingest/reddit.rs
//! Reddit search via the OAuth API (script-app password grant).
//!
//! Credentials come from the environment (`.env` is honoured by the binary):
//! REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET, REDDIT_USERNAME, REDDIT_PASSWORD and
//! optionally REDDIT_USER_AGENT. Without them the client still builds, but every
//! search returns an empty vec.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::RedditSettings;
use crate::ingest::types::PostSource;

/// Reddit returns at most this many submissions per listing page.
const PAGE_SIZE: usize = 100;
/// Refresh the token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);
/// Upper bound on how long a token is cached, whatever `expires_in` says.
const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Subreddit names, including `a+b` multireddits.
fn re_subreddit() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_+]{1,50}$").expect("valid subreddit regex"))
}

pub fn is_valid_subreddit(name: &str) -> bool {
    re_subreddit().is_match(name)
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "reddit_fetch_errors_total",
            "Reddit searches that failed or were not configured."
        );
        describe_counter!("reddit_posts_total", "Posts fetched from Reddit.");
    });
}

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl RedditCredentials {
    /// `None` unless all four required variables are set and non-blank.
    pub fn from_env() -> Option<Self> {
        fn var(name: &str) -> Option<String> {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Some(Self {
            client_id: var("REDDIT_CLIENT_ID")?,
            client_secret: var("REDDIT_CLIENT_SECRET")?,
            username: var("REDDIT_USERNAME")?,
            password: var("REDDIT_PASSWORD")?,
            user_agent: var("REDDIT_USER_AGENT"),
        })
    }
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResp {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Deserialize)]
struct Child {
    data: Submission,
}

#[derive(Deserialize)]
struct Submission {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
}

impl Submission {
    fn into_text(self) -> String {
        let joined = format!("{} {}", self.title, self.selftext);
        html_escape::decode_html_entities(&joined).into_owned()
    }
}

pub struct RedditClient {
    http: reqwest::Client,
    credentials: Option<RedditCredentials>,
    settings: RedditSettings,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    pub fn new(settings: RedditSettings, credentials: Option<RedditCredentials>) -> Result<Self> {
        let user_agent = credentials
            .as_ref()
            .and_then(|c| c.user_agent.clone())
            .unwrap_or_else(|| settings.user_agent.clone());
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building reddit http client")?;
        if credentials.is_none() {
            warn!(target: "reddit", "Reddit credentials missing; searches will return nothing");
        }
        Ok(Self {
            http,
            credentials,
            settings,
            token: Mutex::new(None),
        })
    }

    /// Credentials from the environment.
    pub fn from_env(settings: RedditSettings) -> Result<Self> {
        Self::new(settings, RedditCredentials::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn access_token(&self) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow!("reddit client not configured"))?;

        let mut guard = self.token.lock().await;
        if let Some(t) = guard.as_ref() {
            if Instant::now() < t.expires_at {
                return Ok(t.value.clone());
            }
        }

        let resp = self
            .http
            .post(&self.settings.auth_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", creds.username.as_str()),
                ("password", creds.password.as_str()),
            ])
            .send()
            .await
            .context("requesting reddit token")?
            .error_for_status()
            .context("reddit token endpoint")?;
        let body: TokenResp = resp.json().await.context("decoding reddit token")?;

        // Reddit reports bad credentials as 200 + {"error": ...}.
        let value = match (body.access_token, body.error) {
            (Some(tok), _) => tok,
            (None, Some(err)) => return Err(anyhow!("reddit auth rejected: {err}")),
            (None, None) => return Err(anyhow!("reddit auth returned no token")),
        };
        let ttl = Duration::from_secs(body.expires_in.unwrap_or(3600))
            .min(MAX_TOKEN_TTL)
            .saturating_sub(TOKEN_SLACK);
        *guard = Instant::now()
            .checked_add(ttl)
            .map(|expires_at| CachedToken {
                value: value.clone(),
                expires_at,
            });
        Ok(value)
    }

    async fn try_search(&self, query: &str, community: &str, limit: usize) -> Result<Vec<String>> {
        let token = self.access_token().await?;
        let mut url = Url::parse(&self.settings.api_url).context("parsing reddit api_url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("reddit api_url cannot carry a path"))?
            .pop_if_empty()
            .extend(["r", community, "search"]);

        let mut out = Vec::with_capacity(limit);
        let mut after: Option<String> = None;
        while out.len() < limit {
            let page = (limit - out.len()).min(PAGE_SIZE).to_string();
            let mut req = self.http.get(url.clone()).bearer_auth(&token).query(&[
                ("q", query),
                ("restrict_sr", "on"),
                ("sort", "relevance"),
                ("t", "all"),
                ("limit", page.as_str()),
            ]);
            if let Some(a) = after.take() {
                req = req.query(&[("after", a)]);
            }

            let listing: Listing = req
                .send()
                .await
                .context("reddit search request")?
                .error_for_status()
                .context("reddit search status")?
                .json()
                .await
                .context("decoding reddit listing")?;

            if listing.data.children.is_empty() {
                break;
            }
            out.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .map(|c| c.data.into_text()),
            );
            after = listing.data.after;
            if after.is_none() {
                break;
            }
        }
        out.truncate(limit);
        Ok(out)
    }
}

#[async_trait]
impl PostSource for RedditClient {
    async fn search(&self, query: &str, community: &str, limit: usize) -> Vec<String> {
        ensure_metrics_described();
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let community = self.settings.subreddit_or_default(Some(community)).to_string();
        if !is_valid_subreddit(&community) {
            counter!("reddit_fetch_errors_total").increment(1);
            warn!(target: "reddit", community = ?community, "rejecting invalid subreddit name");
            return Vec::new();
        }

        match self.try_search(query, &community, limit).await {
            Ok(posts) => {
                counter!("reddit_posts_total").increment(posts.len() as u64);
                info!(target: "reddit", %community, found = posts.len(), "reddit search done");
                posts
            }
            Err(e) => {
                counter!("reddit_fetch_errors_total").increment(1);
                warn!(target: "reddit", %community, error = ?e, "reddit search failed");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}
