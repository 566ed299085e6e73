//! 新闻检索中断扫描（NewsAPI 兼容）
//!
//! GET {base_url}/v2/everything?q=..&sortBy=publishedAt&pageSize=N，标题作为头条；无结果返回空列表。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::collaborators::{CollaboratorError, DisruptionScanner};
use crate::planning::DisruptionSignal;

pub const NEWS_API_BASE_URL: &str = "https://newsapi.org";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
}

pub struct NewsApiScanner {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl NewsApiScanner {
    pub fn new(
        base_url: &str,
        api_key: &str,
        page_size: u32,
        timeout_secs: u64,
    ) -> Result<Self, CollaboratorError> {
        if api_key.trim().is_empty() {
            return Err(CollaboratorError::NotConfigured(
                "news API key is not configured".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::NotConfigured(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: page_size.clamp(1, 100),
        })
    }
}

fn interpret(body: NewsResponse, keywords: &str) -> Result<Vec<DisruptionSignal>, CollaboratorError> {
    if body.status != "ok" {
        let code = body.code.unwrap_or_default();
        let msg = format!("{} {}", code, body.message.unwrap_or_default());
        return Err(match code.as_str() {
            "rateLimited" | "unexpectedError" => CollaboratorError::Unavailable(msg),
            _ => CollaboratorError::Rejected(msg),
        });
    }
    let headlines: Vec<String> = body
        .articles
        .into_iter()
        .filter_map(|a| a.title)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && t != "[Removed]")
        .collect();
    if headlines.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![DisruptionSignal::new(keywords, headlines)])
}

#[async_trait]
impl DisruptionScanner for NewsApiScanner {
    async fn scan(&self, keywords: &str) -> Result<Vec<DisruptionSignal>, CollaboratorError> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = self.page_size.to_string();
        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", keywords),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(CollaboratorError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollaboratorError::from_status(status, "news search"));
        }
        let body: NewsResponse = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        interpret(body, keywords)
    }
}
