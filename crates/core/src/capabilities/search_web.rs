//! search_web - instant-answer web search
//!
//! Uses a DuckDuckGo-style instant answer API: one abstract plus related
//! topics. At most one abstract and three related snippets are returned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tools::Capability;

const MAX_RELATED_TOPICS: usize = 3;
const NO_RESULTS: &str = "No relevant results found.";

/// One snippet of search output, serialized into the tool result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSnippet {
    pub source: &'static str,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

// Topic groups carry `Name`/`Topics` instead of `Text`; those are skipped.
#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
}

pub struct SearchWebCapability {
    client: reqwest::Client,
    api_url: String,
}

impl SearchWebCapability {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, String> {
        let response = self
            .client
            .get(format!("{}/", self.api_url))
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("provider returned {status}"));
        }

        // The provider labels JSON as javascript, so decode the text ourselves
        let body = response.text().await.map_err(|e| e.to_string())?;
        let answer: InstantAnswer = serde_json::from_str(&body).map_err(|e| e.to_string())?;

        Ok(collect_snippets(answer))
    }
}

fn collect_snippets(answer: InstantAnswer) -> Vec<SearchSnippet> {
    let mut snippets = Vec::new();
    if !answer.abstract_text.is_empty() {
        snippets.push(SearchSnippet {
            source: "Abstract",
            text: answer.abstract_text,
        });
    }
    snippets.extend(
        answer
            .related_topics
            .into_iter()
            .take(MAX_RELATED_TOPICS)
            .filter_map(|topic| topic.text.filter(|text| !text.is_empty()))
            .map(|text| SearchSnippet {
                source: "Related",
                text,
            }),
    );
    snippets
}

#[async_trait]
impl Capability for SearchWebCapability {
    fn description(&self) -> &str {
        "Search the web for current information"
    }

    async fn invoke(&self, argument: &str) -> String {
        match self.search(argument).await {
            Ok(snippets) if snippets.is_empty() => NO_RESULTS.to_string(),
            Ok(snippets) => serde_json::to_string_pretty(&snippets)
                .unwrap_or_else(|e| format!("Search failed: {e}")),
            Err(reason) => {
                warn!(query = %argument, error = %reason, "web search failed");
                format!("Search failed: {reason}")
            }
        }
    }
}
