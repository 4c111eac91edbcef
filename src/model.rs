use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Anthropic,
    OpenAi,
}

impl Vendor {
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::Anthropic => "anthropic",
            Vendor::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A model identifier and the vendor that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub vendor: Vendor,
}

const OPENAI_PREFIXES: &[&str] = &["gpt-", "chatgpt-", "o1", "o3", "o4"];

impl Model {
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let id = raw.trim();
        let lower = id.to_ascii_lowercase();
        let vendor = if lower.starts_with("claude-") {
            Vendor::Anthropic
        } else if OPENAI_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            Vendor::OpenAi
        } else {
            return Err(ConfigurationError::UnsupportedModel(raw.to_string()));
        };
        Ok(Self {
            id: id.to_string(),
            vendor,
        })
    }
}

impl Default for Model {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL.to_string(),
            vendor: Vendor::Anthropic,
        }
    }
}

impl FromStr for Model {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::parse(s)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
