//! Headline search through NewsAPI.

use crate::config::Settings;
use crate::quote::{fetch_json, http_client};
use crate::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// NewsAPI base URL.
pub const NEWSAPI_URL: &str = "https://newsapi.org";

/// Maximum number of articles returned by a search.
pub const MAX_ARTICLES: usize = 5;

/// Search flavor requested by the calling agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Technology top headlines
    Technology,
    /// Everything endpoint, query biased towards finance
    Finance,
    /// Everything endpoint with the raw query
    General,
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "technology" => Topic::Technology,
            "finance" => Topic::Finance,
            _ => Topic::General,
        }
    }
}

/// A normalized news article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub source: Option<String>,
    pub title: Option<String>,
    /// Description, else content, else empty
    pub summary: String,
    pub url: Option<String>,
}

/// NewsAPI client.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    api_key: String,
    country: String,
    base_url: String,
}

impl NewsClient {
    pub fn new(
        api_key: impl Into<String>,
        country: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            country: country.into(),
            base_url: NEWSAPI_URL.to_string(),
        })
    }

    /// Build a client when a NewsAPI key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        match &settings.newsapi_key {
            Some(key) => Ok(Some(Self::new(
                key.clone(),
                settings.news_country.clone(),
                settings.request_timeout,
            )?)),
            None => Ok(None),
        }
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search for up to [`MAX_ARTICLES`] articles.
    pub fn search(&self, query: &str, topic: Topic) -> Result<Vec<Article>> {
        let (path, params) = search_params(query, topic, &self.country);
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let request = self
            .client
            .get(url)
            .query(&params)
            .query(&[("apiKey", self.api_key.as_str())]);

        let payload = fetch_json(request).map_err(|e| {
            tracing::error!(error = %e, "NewsAPI request failed");
            Error::News(e)
        })?;

        Ok(parse_articles(&payload))
    }
}

/// Endpoint path and query parameters for a search.
pub fn search_params(query: &str, topic: Topic, country: &str) -> (&'static str, Vec<(&'static str, String)>) {
    let query = query.trim();
    let page_size = MAX_ARTICLES.to_string();

    match topic {
        Topic::Technology => {
            let mut params = vec![
                ("category", "technology".to_string()),
                ("pageSize", page_size),
                ("country", country.to_string()),
            ];
            if !query.is_empty() {
                params.push(("q", query.to_string()));
            }
            ("/v2/top-headlines", params)
        }
        Topic::Finance | Topic::General => {
            let q = match (topic, query.is_empty()) {
                (Topic::Finance, false) => format!("{query} finance"),
                (_, true) => "finance".to_string(),
                _ => query.to_string(),
            };
            (
                "/v2/everything",
                vec![
                    ("q", q),
                    ("pageSize", page_size),
                    ("sortBy", "publishedAt".to_string()),
                ],
            )
        }
    }
}

/// Extract at most [`MAX_ARTICLES`] articles from a NewsAPI payload.
pub fn parse_articles(payload: &Value) -> Vec<Article> {
    let Some(articles) = payload.get("articles").and_then(Value::as_array) else {
        return Vec::new();
    };

    articles
        .iter()
        .take(MAX_ARTICLES)
        .map(|a| {
            let text = |key: &str| {
                a.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            Article {
                source: a
                    .get("source")
                    .and_then(|s| s.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                title: text("title"),
                summary: text("description")
                    .or_else(|| text("content"))
                    .unwrap_or_default(),
                url: text("url"),
            }
        })
        .collect()
}
