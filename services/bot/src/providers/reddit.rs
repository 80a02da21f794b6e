//! Content Source over the Reddit OAuth API.
//!
//! Uses the password grant for a script app. The bearer token is cached and
//! refreshed a minute before it expires.

use super::{decode_error, ensure_success, http_client, transport_error};
use pixel_core::content::{ContentQuery, ContentSource, Topic};
use pixel_core::error::ServiceError;
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::RedditCredentials;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub struct Thing {
    pub data: Post,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub stickied: bool,
}

impl Listing {
    pub fn into_topics(self) -> Vec<Topic> {
        self.data
            .children
            .into_iter()
            .map(|thing| Topic {
                title: thing.data.title,
                pinned: thing.data.stickied,
            })
            .collect()
    }
}

struct CachedToken {
    value: SecretString,
    refresh_at: Instant,
}

pub struct RedditClient {
    http: Client,
    credentials: RedditCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(Some(&credentials.user_agent))?,
            credentials,
            token: Mutex::new(None),
        })
    }

    fn access_token(&self) -> Result<SecretString, ServiceError> {
        // The slot only ever holds a whole token, so a poisoned lock is still usable.
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        debug!("Requesting Reddit access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret.expose_secret()),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.expose_secret()),
            ])
            .send()
            .map_err(transport_error)?;
        let token: TokenResponse = ensure_success(response)?.json().map_err(decode_error)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_MARGIN);
        let value = SecretString::from(token.access_token);
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }
}

pub fn top_url(query: &ContentQuery) -> String {
    format!(
        "{API_BASE}/r/{}/top?t={}&limit={}&raw_json=1",
        query.source, query.window, query.limit
    )
}

impl ContentSource for RedditClient {
    fn fetch_topics(&self, query: &ContentQuery) -> Result<Vec<Topic>, ServiceError> {
        let token = self.access_token()?;
        info!(subreddit = %query.source, limit = query.limit, "Fetching top posts");
        let response = self
            .http
            .get(top_url(query))
            .bearer_auth(token.expose_secret())
            .send()
            .map_err(transport_error)?;
        let listing: Listing = ensure_success(response)?.json().map_err(decode_error)?;
        let topics = listing.into_topics();
        info!(count = topics.len(), "Fetched post titles");
        Ok(topics)
    }
}
