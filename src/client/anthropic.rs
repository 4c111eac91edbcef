use super::{ChatBackend, CompletionRequest, Summary, Usage, endpoint, read_success_body, transport_error};
use crate::{config::Provider, credentials::ApiKey, error::ApiError, model::Vendor};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const VENDOR: Vendor = Vendor::Anthropic;

/// Messages API client.
pub struct AnthropicBackend {
    http: Client,
    url: String,
    api_version: String,
    api_key: ApiKey,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl AnthropicBackend {
    pub fn new(http: Client, provider: &Provider, api_key: ApiKey) -> Self {
        let api_version = if provider.api_version.is_empty() {
            "2023-06-01".to_string()
        } else {
            provider.api_version.clone()
        };
        Self {
            http,
            url: endpoint(&provider.base_url, "v1/messages"),
            api_version,
            api_key,
        }
    }
}

impl ChatBackend for AnthropicBackend {
    fn vendor(&self) -> Vendor {
        VENDOR
    }

    fn complete(&self, req: &CompletionRequest<'_>) -> Result<Summary, ApiError> {
        info!(
            "anthropic request model={} max_tokens={} prompt_chars={}",
            req.model,
            req.max_tokens,
            req.prompt.len()
        );
        let body = json!({
            "model": req.model,
            "max_tokens": req.max_tokens,
            "messages": [{"role": "user", "content": req.prompt}],
        });

        let resp = self
            .http
            .post(&self.url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .map_err(|e| transport_error(VENDOR, e))?;

        let raw = read_success_body(VENDOR, resp)?;
        parse_response(&raw, req.model)
    }
}

fn parse_response(raw: &str, requested_model: &str) -> Result<Summary, ApiError> {
    let parsed: MessagesResponse = serde_json::from_str(raw).map_err(|e| ApiError::Malformed {
        vendor: VENDOR,
        message: e.to_string(),
    })?;

    if let Some(err) = parsed.error {
        return Err(ApiError::Api {
            vendor: VENDOR,
            message: err.message,
        });
    }

    let text: String = parsed
        .content
        .iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text.as_deref())
        .collect();
    if text.is_empty() {
        return Err(ApiError::Malformed {
            vendor: VENDOR,
            message: "response has no text content".into(),
        });
    }

    Ok(Summary {
        text,
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        stop_reason: parsed.stop_reason,
        usage: parsed.usage.map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
    })
}
