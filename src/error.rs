use thiserror::Error;

use crate::model::Vendor;

/// Any failure surfaced by [`crate::Reader`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("no API key for {vendor}: pass one explicitly or set {env_var}")]
    MissingApiKey { vendor: Vendor, env_var: String },

    #[error("API key for {0} is empty")]
    InvalidApiKey(Vendor),

    #[error("invalid postprocess pattern: {0}")]
    InvalidPattern(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("URL inputs are disabled: {0}")]
    UrlInput(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("input exceeds max_input_file_bytes ({size} > {limit}): {path}")]
    TooLarge { path: String, size: u64, limit: u64 },

    #[error("failed to read PDF text layer: {0}")]
    Pdf(String),

    #[error("no text could be extracted from {0}")]
    NoText(String),

    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    #[error("{tool} exceeded timeout of {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {vendor} failed: {message}")]
    Transport { vendor: Vendor, message: String },

    #[error("{vendor} rejected the credentials ({status}): {message}")]
    Authentication {
        vendor: Vendor,
        status: u16,
        message: String,
    },

    #[error("{vendor} rate limit or quota exceeded: {message}")]
    RateLimited { vendor: Vendor, message: String },

    #[error("{vendor} returned HTTP {status}: {message}")]
    Status {
        vendor: Vendor,
        status: u16,
        message: String,
    },

    #[error("{vendor} returned an error: {message}")]
    Api { vendor: Vendor, message: String },

    #[error("malformed response from {vendor}: {message}")]
    Malformed { vendor: Vendor, message: String },
}

impl ApiError {
    pub fn vendor(&self) -> Vendor {
        match self {
            ApiError::Transport { vendor, .. }
            | ApiError::Authentication { vendor, .. }
            | ApiError::RateLimited { vendor, .. }
            | ApiError::Status { vendor, .. }
            | ApiError::Api { vendor, .. }
            | ApiError::Malformed { vendor, .. } => *vendor,
        }
    }
}
