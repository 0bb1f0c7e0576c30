use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use crate::config::{EnvConfig, SourceConfig};
use crate::data::types::DrawRecord;

/// Anything that can hand back the most recent page of draws, newest first.
#[async_trait]
pub trait DrawSource: Send + Sync {
    async fn fetch_draws(&self) -> Result<Vec<DrawRecord>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Parse(String),
}

pub struct DrawApiClient {
    client: Client,
    url: String,
    page_size: u32,
    page_no: u32,
    type_id: u32,
    language: u32,
    random: String,
    signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DrawPageRequest<'a> {
    page_size: u32,
    page_no: u32,
    type_id: u32,
    language: u32,
    random: &'a str,
    signature: &'a str,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct DrawPageResponse {
    #[serde(default)]
    data: Option<DrawPageData>,
}

#[derive(Debug, Deserialize)]
struct DrawPageData {
    #[serde(default)]
    list: Option<Vec<RawDraw>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDraw {
    #[serde(default)]
    issue_number: Option<String>,
    #[serde(default)]
    number: Option<serde_json::Value>,
}

impl DrawApiClient {
    pub fn new(config: &SourceConfig, env: &EnvConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: env.draw_api_url.clone().unwrap_or_else(|| config.api_url.clone()),
            page_size: config.page_size,
            page_no: config.page_no,
            type_id: config.type_id,
            language: config.language,
            random: env.draw_api_random.clone(),
            signature: env.draw_api_signature.clone(),
        })
    }
}

#[async_trait]
impl DrawSource for DrawApiClient {
    async fn fetch_draws(&self) -> Result<Vec<DrawRecord>, FetchError> {
        let body = DrawPageRequest {
            page_size: self.page_size,
            page_no: self.page_no,
            type_id: self.type_id,
            language: self.language,
            random: &self.random,
            signature: &self.signature,
            timestamp: Utc::now().timestamp(),
        };

        let response = self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let draws = parse_draw_page(&text)?;
        debug!("Fetched {} draws", draws.len());

        Ok(draws)
    }
}

/// Parse a response body into canonical draw records.
///
/// A body without `data.list` is a parse failure; an empty list is fine.
pub fn parse_draw_page(body: &str) -> Result<Vec<DrawRecord>, FetchError> {
    let page: DrawPageResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    let list = page.data
        .and_then(|d| d.list)
        .ok_or_else(|| FetchError::Parse("missing data.list".to_string()))?;

    Ok(list.into_iter().filter_map(normalize).collect())
}

/// Map one raw record to a `DrawRecord`, dropping anything unusable.
fn normalize(raw: RawDraw) -> Option<DrawRecord> {
    let issue = match raw.issue_number {
        Some(issue) if !issue.trim().is_empty() => issue,
        _ => {
            warn!("Dropping draw without issue number");
            return None;
        }
    };

    let number = match raw.number.as_ref().and_then(parse_outcome) {
        Some(n) => n,
        None => {
            warn!("Dropping draw {} with invalid outcome {:?}", issue, raw.number);
            return None;
        }
    };

    Some(DrawRecord { issue, number })
}

fn parse_outcome(value: &serde_json::Value) -> Option<u8> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    (0..=9).contains(&n).then_some(n as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_and_numeric_outcomes() {
        let body = r#"{"data":{"list":[
            {"issueNumber":"20261019100010700","number":"7"},
            {"issueNumber":"20261019100010699","number":3}
        ]},"code":0}"#;

        let draws = parse_draw_page(body).unwrap();
        assert_eq!(draws, vec![
            DrawRecord { issue: "20261019100010700".to_string(), number: 7 },
            DrawRecord { issue: "20261019100010699".to_string(), number: 3 },
        ]);
    }

    #[test]
    fn test_out_of_range_outcomes_are_dropped() {
        let body = r#"{"data":{"list":[
            {"issueNumber":"a","number":"12"},
            {"issueNumber":"b","number":-1},
            {"issueNumber":"c","number":"x"},
            {"issueNumber":"d"},
            {"number":"4"},
            {"issueNumber":"e","number":"9"}
        ]}}"#;

        let draws = parse_draw_page(body).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].issue, "e");
    }

    #[test]
    fn test_empty_list_is_not_an_error() {
        let draws = parse_draw_page(r#"{"data":{"list":[]}}"#).unwrap();
        assert!(draws.is_empty());
    }

    #[test]
    fn test_missing_list_is_parse_error() {
        assert!(matches!(parse_draw_page(r#"{"data":null}"#), Err(FetchError::Parse(_))));
        assert!(matches!(parse_draw_page(r#"{"msg":"bad sign"}"#), Err(FetchError::Parse(_))));
        assert!(matches!(parse_draw_page("<html>"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_request_body_field_names() {
        let body = DrawPageRequest {
            page_size: 10,
            page_no: 1,
            type_id: 1,
            language: 0,
            random: "r",
            signature: "s",
            timestamp: 42,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["typeId"], 1);
        assert_eq!(json["signature"], "s");
        assert_eq!(json["timestamp"], 42);
    }
}
