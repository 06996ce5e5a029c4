//! Built-in capabilities
//!
//! Each capability is in its own file. All of them answer with text, never
//! with an error.

mod city_time;
mod current_date;
mod search_web;

pub use city_time::{format_city_time, resolve_timezone, CityTimeCapability, CITY_TIMEZONES};
pub use current_date::CurrentDateCapability;
pub use search_web::{SearchSnippet, SearchWebCapability};

use crate::tools::{ToolName, ToolRegistry};

/// Default search provider (DuckDuckGo instant answers)
pub const DEFAULT_SEARCH_API_URL: &str = "https://api.duckduckgo.com";

/// Default world-time provider
pub const DEFAULT_TIME_API_URL: &str = "https://worldtimeapi.org";

/// Where the external capability providers live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub search_api_url: String,
    pub time_api_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            search_api_url: DEFAULT_SEARCH_API_URL.to_string(),
            time_api_url: DEFAULT_TIME_API_URL.to_string(),
        }
    }
}

/// Registry with every built-in tool bound to its capability
pub fn builtin_registry(client: reqwest::Client, endpoints: &ProviderEndpoints) -> ToolRegistry {
    ToolRegistry::builder()
        .tool(
            ToolName::SearchWeb,
            SearchWebCapability::new(client.clone(), &endpoints.search_api_url),
        )
        .tool(ToolName::GetCurrentDate, CurrentDateCapability)
        .tool(
            ToolName::GetTimeInCity,
            CityTimeCapability::new(client, &endpoints.time_api_url),
        )
        .build()
}
