//! External capability boundary: job-board API client, record normalizer,
//! and chat-model client.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobsift_core::{Posting, PostingKey};
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub const CRATE_NAME: &str = "jobsift-adapters";

/// Raw posting record as returned by the board API. Every field is optional;
/// normalization degrades missing or malformed values to empty/absent, never
/// to an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosting {
    #[serde(default)]
    pub id: Option<JsonValue>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub absolute_url: Option<String>,
    #[serde(default)]
    pub first_published: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub departments: Vec<RawDepartment>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDepartment {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BoardResponse {
    #[serde(default)]
    jobs: Vec<RawPosting>,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for board {board}")]
    HttpStatus { status: u16, board: String },
}

/// Fetch capability: one board id in, that board's raw postings out.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn fetch_board(&self, board_id: &str) -> Result<Vec<RawPosting>, BoardError>;
}

#[derive(Debug, Clone)]
pub struct BoardClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for BoardClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://boards-api.greenhouse.io/v1".to_string(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

/// Greenhouse public job-board API client.
#[derive(Debug)]
pub struct GreenhouseClient {
    client: reqwest::Client,
    base_url: String,
}

impl GreenhouseClient {
    pub fn new(config: BoardClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building board http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BoardApi for GreenhouseClient {
    async fn fetch_board(&self, board_id: &str) -> Result<Vec<RawPosting>, BoardError> {
        let url = format!("{}/boards/{}/jobs?content=true", self.base_url, board_id);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BoardError::HttpStatus {
                status: status.as_u16(),
                board: board_id.to_string(),
            });
        }
        let body: BoardResponse = resp.json().await?;
        Ok(body.jobs)
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat http status {status}")]
    HttpStatus { status: u16 },
    #[error("chat response contained no choices")]
    EmptyResponse,
}

/// Classification/scoring capability: prompt in, raw answer text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4.1-mini".to_string(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug)]
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl OpenAiChat {
    pub fn new(config: ChatClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .context("building chat http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
            });
        }
        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Unescape entities, drop tags, collapse all whitespace (non-breaking
/// spaces included) and trim.
pub fn clean_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ISO-8601 with a trailing `Z` or explicit offset; anything else is absent.
pub fn parse_published(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn native_id(raw: &RawPosting) -> Option<String> {
    match raw.id.as_ref()? {
        JsonValue::Null => None,
        JsonValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}

/// Map one raw record into the canonical row shape. Missing fields become
/// empty strings, an unparseable timestamp becomes absent, and the identity
/// key is always derivable: the native id when present, otherwise a
/// composite of board id, url, publish timestamp and title.
pub fn normalize_posting(board_id: &str, raw: &RawPosting) -> Posting {
    let published_raw = raw
        .first_published
        .as_deref()
        .or(raw.updated_at.as_deref())
        .unwrap_or("");
    let url = raw.absolute_url.clone().unwrap_or_default();
    let raw_title = raw.title.as_deref().unwrap_or("");
    let job_id = match native_id(raw) {
        Some(id) => id,
        None => format!("{board_id}:{url}:{published_raw}:{raw_title}"),
    };
    let location = raw
        .location
        .as_ref()
        .and_then(|l| l.name.as_deref())
        .unwrap_or("")
        .trim()
        .to_string();
    let department = raw
        .departments
        .first()
        .and_then(|d| d.name.as_deref())
        .unwrap_or("")
        .trim()
        .to_string();

    Posting {
        key: PostingKey::new(job_id.trim(), board_id),
        title: raw_title.trim().to_string(),
        location,
        department,
        published_at: parse_published(published_raw),
        url,
        description: clean_html(raw.content.as_deref().unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clean_html_strips_tags_and_collapses_whitespace() {
        assert_eq!(clean_html("<p>Great&nbsp;role</p>"), "Great role");
        assert_eq!(
            clean_html("<div><b>SQL</b> &amp; Python,\n  remote</div>"),
            "SQL & Python, remote"
        );
        assert_eq!(clean_html("<ul><li>one</li><li>two</li></ul>"), "one two");
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("   \u{a0}  "), "");
    }

    #[test]
    fn parse_published_accepts_utc_designator_and_offsets() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
        assert_eq!(parse_published("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_published("2024-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_published("not a date"), None);
        assert_eq!(parse_published(""), None);
        assert_eq!(parse_published("2024-13-40T00:00:00Z"), None);
    }

    #[test]
    fn composite_key_when_native_id_is_absent() {
        let raw = RawPosting {
            id: None,
            title: Some("Engineer".to_string()),
            absolute_url: Some("https://x/y".to_string()),
            first_published: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        let posting = normalize_posting("acme", &raw);
        assert_eq!(
            posting.key.job_id,
            "acme:https://x/y:2024-01-01T00:00:00Z:Engineer"
        );
        assert_eq!(posting.key.board_id, "acme");
    }

    #[test]
    fn native_numeric_id_wins_over_composite() {
        let raw = RawPosting {
            id: Some(serde_json::json!(4567123)),
            title: Some("Data Engineer".to_string()),
            ..Default::default()
        };
        let posting = normalize_posting("acme", &raw);
        assert_eq!(posting.key.job_id, "4567123");
    }

    #[test]
    fn explicit_null_id_falls_back_to_composite() {
        let raw: RawPosting = serde_json::from_str(
            r#"{"id": null, "title": "Analyst", "absolute_url": "https://a/b"}"#,
        )
        .unwrap();
        let posting = normalize_posting("acme", &raw);
        assert_eq!(posting.key.job_id, "acme:https://a/b::Analyst");
    }

    #[test]
    fn missing_fields_degrade_to_empty_values() {
        let posting = normalize_posting("acme", &RawPosting::default());
        assert_eq!(posting.title, "");
        assert_eq!(posting.location, "");
        assert_eq!(posting.department, "");
        assert_eq!(posting.url, "");
        assert_eq!(posting.description, "");
        assert_eq!(posting.published_at, None);
        assert_eq!(posting.key.job_id, "acme:::");
        assert_eq!(posting.key.board_id, "acme");
    }

    #[test]
    fn updated_at_backfills_missing_first_published() {
        let raw = RawPosting {
            id: Some(serde_json::json!(1)),
            updated_at: Some("2024-06-01T12:00:00Z".to_string()),
            ..Default::default()
        };
        let posting = normalize_posting("acme", &raw);
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().unwrap();
        assert_eq!(posting.published_at, Some(expected));
    }

    #[test]
    fn board_payload_decodes_with_unknown_and_missing_fields() {
        let body = r#"{
            "jobs": [{
                "id": 123,
                "title": "Data Analyst",
                "absolute_url": "https://boards.example/jobs/123",
                "first_published": "2024-03-01T09:30:00Z",
                "location": {"name": "New York, NY"},
                "departments": [{"name": "Analytics"}, {"name": "Ops"}],
                "content": "<p>Own our&nbsp;dashboards</p>",
                "internal_job_id": 999,
                "metadata": []
            }],
            "meta": {"total": 1}
        }"#;
        let parsed: BoardResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.jobs.len(), 1);
        let posting = normalize_posting("example", &parsed.jobs[0]);
        assert_eq!(posting.key.job_id, "123");
        assert_eq!(posting.location, "New York, NY");
        assert_eq!(posting.department, "Analytics");
        assert_eq!(posting.description, "Own our dashboards");
    }
}
