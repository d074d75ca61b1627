use std::env;

use serde::Deserialize;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const RESULT_COUNT: u8 = 3;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
}

impl SearchConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_key: env::var("GOOGLE_SEARCH_API_KEY").ok()?,
            engine_id: env::var("GOOGLE_SEARCH_ENGINE_ID").ok()?,
        })
    }
}

/// Optional web-search augmentation. Every failure path returns None; the
/// chat turn proceeds without the extra context and the user never sees a
/// search error.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(http: reqwest::Client, config: SearchConfig) -> Self {
        Self { http, config }
    }

    pub async fn context_for(&self, user_message: &str) -> Option<String> {
        let query = format!("health insurance {user_message}");

        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query.as_str()),
                ("num", &RESULT_COUNT.to_string()),
            ])
            .send()
            .await
            .map_err(|error| tracing::debug!(%error, "search request failed"))
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "search returned non-2xx");
            return None;
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|error| tracing::debug!(%error, "search response decode failed"))
            .ok()?;

        let items = parsed.items?;
        if items.is_empty() {
            return None;
        }

        Some(
            items
                .iter()
                .map(|item| format!("- {}: {}", item.title, item.snippet))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_tolerates_missing_items() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_none());

        let parsed: SearchResponse =
            serde_json::from_str(r#"{"items":[{"title":"t","snippet":"s"}]}"#).unwrap();
        assert_eq!(parsed.items.unwrap().len(), 1);
    }
}
