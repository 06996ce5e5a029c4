//! get_current_date - today's date in UTC

use async_trait::async_trait;
use chrono::Utc;

use crate::tools::Capability;

/// Returns the current UTC date as `YYYY-MM-DD`. Ignores its argument.
pub struct CurrentDateCapability;

#[async_trait]
impl Capability for CurrentDateCapability {
    fn description(&self) -> &str {
        "Get today's date in YYYY-MM-DD format"
    }

    async fn invoke(&self, _argument: &str) -> String {
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    }
}
