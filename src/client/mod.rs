//! Vendor chat backends. Each call is a single blocking HTTP request.

pub mod anthropic;
pub mod openai;
pub mod types;

use crate::{
    config::{Config, Provider},
    credentials::ApiKey,
    error::{ApiError, ConfigurationError},
    model::Vendor,
};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::time::Duration;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;
pub use types::{CompletionRequest, Summary, Usage};

const MAX_ERROR_BODY_CHARS: usize = 500;

pub trait ChatBackend: Send + Sync {
    fn vendor(&self) -> Vendor;
    fn complete(&self, req: &CompletionRequest<'_>) -> Result<Summary, ApiError>;
}

/// Build the backend for `vendor` using the matching `[providers.*]` section.
pub fn backend_for(
    vendor: Vendor,
    cfg: &Config,
    api_key: ApiKey,
) -> Result<Box<dyn ChatBackend>, ConfigurationError> {
    let http = http_client(cfg)?;
    let provider: &Provider = cfg.provider(vendor);
    Ok(match vendor {
        Vendor::Anthropic => Box::new(AnthropicBackend::new(http, provider, api_key)),
        Vendor::OpenAi => Box::new(OpenAiBackend::new(http, provider, api_key)),
    })
}

fn http_client(cfg: &Config) -> Result<Client, ConfigurationError> {
    let mut builder = Client::builder().user_agent(cfg.http.user_agent.clone());
    if cfg.http.timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(cfg.http.timeout_seconds));
    }
    builder
        .build()
        .map_err(|e| ConfigurationError::HttpClient(e.to_string()))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn transport_error(vendor: Vendor, err: reqwest::Error) -> ApiError {
    ApiError::Transport {
        vendor,
        message: err.to_string(),
    }
}

/// Read the body of a response, mapping non-2xx statuses to the error taxonomy.
pub(crate) fn read_success_body(vendor: Vendor, resp: Response) -> Result<String, ApiError> {
    let status = resp.status();
    let body = resp.text().map_err(|e| transport_error(vendor, e))?;
    if status.is_success() {
        return Ok(body);
    }

    let message = error_message(&body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authentication {
            vendor,
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { vendor, message },
        _ => ApiError::Status {
            vendor,
            status: status.as_u16(),
            message,
        },
    })
}

/// Both vendors wrap failures as `{"error": {"message": ...}}`.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_CHARS).collect())
}
