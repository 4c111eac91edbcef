use std::fmt;

use crate::{config::Provider, error::ConfigurationError, model::Vendor};

/// An API key. Never printed, not even in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(vendor: Vendor, raw: &str) -> Result<Self, ConfigurationError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ConfigurationError::InvalidApiKey(vendor));
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Pick the explicit key if given, otherwise read the vendor's env var via `lookup`.
pub fn resolve_api_key<F>(
    vendor: Vendor,
    provider: &Provider,
    explicit: Option<&str>,
    lookup: F,
) -> Result<ApiKey, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = explicit {
        return ApiKey::new(vendor, key);
    }
    match lookup(&provider.api_key_env) {
        Some(key) => ApiKey::new(vendor, &key),
        None => Err(ConfigurationError::MissingApiKey {
            vendor,
            env_var: provider.api_key_env.clone(),
        }),
    }
}

pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
