use super::{ChatBackend, CompletionRequest, Summary, Usage, endpoint, read_success_body, transport_error};
use crate::{config::Provider, credentials::ApiKey, error::ApiError, model::Vendor};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const VENDOR: Vendor = Vendor::OpenAi;

/// Chat Completions API client.
pub struct OpenAiBackend {
    http: Client,
    url: String,
    api_key: ApiKey,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl OpenAiBackend {
    pub fn new(http: Client, provider: &Provider, api_key: ApiKey) -> Self {
        Self {
            http,
            url: endpoint(&provider.base_url, "v1/chat/completions"),
            api_key,
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn vendor(&self) -> Vendor {
        VENDOR
    }

    fn complete(&self, req: &CompletionRequest<'_>) -> Result<Summary, ApiError> {
        info!(
            "openai request model={} max_tokens={} prompt_chars={}",
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
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .map_err(|e| transport_error(VENDOR, e))?;

        let raw = read_success_body(VENDOR, resp)?;
        parse_response(&raw, req.model)
    }
}

fn parse_response(raw: &str, requested_model: &str) -> Result<Summary, ApiError> {
    let parsed: ChatResponse = serde_json::from_str(raw).map_err(|e| ApiError::Malformed {
        vendor: VENDOR,
        message: e.to_string(),
    })?;

    if let Some(err) = parsed.error {
        return Err(ApiError::Api {
            vendor: VENDOR,
            message: err.message,
        });
    }

    let choice = parsed.choices.into_iter().next().ok_or_else(|| ApiError::Malformed {
        vendor: VENDOR,
        message: "response has no choices".into(),
    })?;
    let text = choice.message.content.ok_or_else(|| ApiError::Malformed {
        vendor: VENDOR,
        message: "first choice has no content".into(),
    })?;

    Ok(Summary {
        text,
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        stop_reason: choice.finish_reason,
        usage: parsed.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}
