use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::model::{DEFAULT_MODEL, Vendor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub providers: Providers,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    pub fn provider(&self, vendor: Vendor) -> &Provider {
        match vendor {
            Vendor::Anthropic => &self.providers.anthropic,
            Vendor::OpenAi => &self.providers.openai,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Default::default(),
            providers: Default::default(),
            http: Default::default(),
            limits: Default::default(),
            ocr: Default::default(),
            postprocess: Default::default(),
            logging: Default::default(),
            security: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub default: String,
    pub max_tokens: u32,
    pub instruction: String,
}
impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default: DEFAULT_MODEL.into(),
            max_tokens: 2048,
            instruction: crate::prompt::DEFAULT_INSTRUCTION.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Providers {
    #[serde(deserialize_with = "anthropic_provider")]
    pub anthropic: Provider,
    #[serde(deserialize_with = "openai_provider")]
    pub openai: Provider,
}
impl Default for Providers {
    fn default() -> Self {
        Self {
            anthropic: Provider::anthropic(),
            openai: Provider::openai(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub base_url: String,
    pub api_key_env: String,
    /// Sent as `anthropic-version`; ignored by the OpenAI backend.
    #[serde(default)]
    pub api_version: String,
}

impl Provider {
    pub fn anthropic() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_key_env: "ANTHROPIC_API_KEY".into(),
            api_version: "2023-06-01".into(),
        }
    }

    pub fn openai() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            api_version: "".into(),
        }
    }
}

/// Keys present in a `[providers.*]` table; absent keys keep the vendor default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderOverrides {
    base_url: Option<String>,
    api_key_env: Option<String>,
    api_version: Option<String>,
}

impl ProviderOverrides {
    fn apply(self, mut base: Provider) -> Provider {
        if let Some(v) = self.base_url {
            base.base_url = v;
        }
        if let Some(v) = self.api_key_env {
            base.api_key_env = v;
        }
        if let Some(v) = self.api_version {
            base.api_version = v;
        }
        base
    }
}

fn anthropic_provider<'de, D: Deserializer<'de>>(d: D) -> Result<Provider, D::Error> {
    Ok(ProviderOverrides::deserialize(d)?.apply(Provider::anthropic()))
}

fn openai_provider<'de, D: Deserializer<'de>>(d: D) -> Result<Provider, D::Error> {
    Ok(ProviderOverrides::deserialize(d)?.apply(Provider::openai()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Http {
    pub timeout_seconds: u64,
    pub user_agent: String,
}
impl Default for Http {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            user_agent: concat!("speedread/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_input_file_bytes: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_file_bytes: 512 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ocr {
    pub enabled: bool,
    pub pdftoppm_exe: String,
    pub tesseract_exe: String,
    pub language: String,
    pub dpi: u32,
    pub timeout_seconds: u64,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            enabled: true,
            pdftoppm_exe: "pdftoppm".into(),
            tesseract_exe: "tesseract".into(),
            language: "eng".into(),
            dpi: 300,
            timeout_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Postprocess {
    pub normalize_unicode: bool,
    pub normalize_newlines: bool,
    pub strip_control_chars: bool,
    pub trim_trailing_whitespace: bool,
    pub collapse_blank_lines: bool,
    pub remove_by_regex: bool,
    #[serde(default)]
    pub regex: PostprocessRegex,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            normalize_newlines: true,
            strip_control_chars: true,
            trim_trailing_whitespace: true,
            collapse_blank_lines: true,
            remove_by_regex: true,
            regex: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessRegex {
    pub patterns: Vec<String>,
}
impl Default for PostprocessRegex {
    fn default() -> Self {
        Self {
            patterns: vec!["^(page\\s+\\d+|\\d+\\s*/\\s*\\d+|-\\s*\\d+\\s*-)$".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
