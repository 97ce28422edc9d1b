//! Google Books volumes API adapter implementation.

use std::io::Read;
use std::time::Duration;

use serde_json::Value;

use crate::backends::CategoryLookup;
use crate::config::LookupConfig;
use crate::protocol::{LookupOutcome, UNKNOWN_CATEGORY_LABEL};

const USER_AGENT: &str = concat!("genre-enricher/", env!("CARGO_PKG_VERSION"));

/// Google Books adapter backed by `ureq`.
pub struct GoogleBooksAdapter {
    http_client: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksAdapter {
    /// Creates a new adapter from lookup settings.
    pub fn new(config: &LookupConfig) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(config.connect_timeout_secs))
            .timeout_read(Duration::from_secs(config.read_timeout_secs))
            .timeout_write(Duration::from_secs(config.read_timeout_secs))
            .build();
        let api_key = Some(config.api_key.trim().to_string()).filter(|key| !key.is_empty());
        Self {
            http_client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request_url(base_url: &str, identifier: &str, api_key: Option<&str>) -> String {
        let mut url = format!(
            "{base_url}?q={}",
            urlencoding::encode(&format!("isbn:{identifier}"))
        );
        if let Some(key) = api_key {
            url.push_str("&key=");
            url.push_str(urlencoding::encode(key).as_ref());
        }
        url
    }

    fn request_json(&self, identifier: &str) -> Result<Value, String> {
        let url = Self::request_url(&self.base_url, identifier, self.api_key.as_deref());
        let response = self
            .http_client
            .get(&url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json")
            .call()
            .map_err(|error| format!("Request failed: {error}"))?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|error| format!("Failed to read response: {error}"))?;
        serde_json::from_str(&body).map_err(|error| {
            let snippet: String = body.trim().chars().take(120).collect();
            format!("Invalid JSON response: {error}; prefix={snippet}")
        })
    }

    /// Maps a decoded volumes payload to a terminal outcome.
    fn outcome_from_payload(payload: &Value) -> LookupOutcome {
        if !payload.is_object() {
            return LookupOutcome::TransientError(
                "Invalid JSON response: expected an object".to_string(),
            );
        }
        let Some(first_item) = payload
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
        else {
            return LookupOutcome::NotFound;
        };

        let category = first_item
            .get("volumeInfo")
            .and_then(|info| info.get("categories"))
            .and_then(Value::as_array)
            .and_then(|categories| categories.first())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(UNKNOWN_CATEGORY_LABEL);
        LookupOutcome::Found(category.to_string())
    }
}

impl CategoryLookup for GoogleBooksAdapter {
    fn lookup(&self, identifier: &str) -> LookupOutcome {
        match self.request_json(identifier) {
            Ok(payload) => Self::outcome_from_payload(&payload),
            Err(error) => LookupOutcome::TransientError(error),
        }
    }
}
