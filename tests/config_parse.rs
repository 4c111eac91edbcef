use speedread::{config::Config, model::Vendor};

#[test]
fn parse_example_config() {
    let raw = include_str!("../speedread.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(cfg.model.max_tokens >= 1);
    assert_eq!(cfg.provider(Vendor::Anthropic).api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(cfg.provider(Vendor::OpenAi).api_key_env, "OPENAI_API_KEY");
    assert!(cfg.ocr.enabled);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let raw = r#"
[model]
default = "gpt-4o"
max_tokens = 512
instruction = "List the key findings."

[providers.openai]
base_url = "http://localhost:9999"
api_key_env = "MY_OPENAI_KEY"
"#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.model.default, "gpt-4o");
    assert_eq!(cfg.provider(Vendor::OpenAi).api_key_env, "MY_OPENAI_KEY");
    assert_eq!(cfg.provider(Vendor::Anthropic).base_url, "https://api.anthropic.com");
    assert_eq!(cfg.http.timeout_seconds, 120);
    assert!(cfg.security.reject_url_inputs);
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let raw = r#"
[ocr]
enabled = false

[providers.anthropic]
base_url = "http://127.0.0.1:8080"

[logging]
json = true
"#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(!cfg.ocr.enabled);
    assert_eq!(cfg.ocr.pdftoppm_exe, "pdftoppm");
    assert_eq!(cfg.ocr.dpi, 300);

    let anthropic = cfg.provider(Vendor::Anthropic);
    assert_eq!(anthropic.base_url, "http://127.0.0.1:8080");
    assert_eq!(anthropic.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(anthropic.api_version, "2023-06-01");
    assert_eq!(cfg.provider(Vendor::OpenAi).base_url, "https://api.openai.com");

    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn partial_openai_section_keeps_openai_defaults() {
    let raw = "[providers.openai]\napi_key_env = \"TEAM_OPENAI_KEY\"\n";
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    let openai = cfg.provider(Vendor::OpenAi);
    assert_eq!(openai.api_key_env, "TEAM_OPENAI_KEY");
    assert_eq!(openai.base_url, "https://api.openai.com");
    assert_eq!(cfg.provider(Vendor::Anthropic).api_key_env, "ANTHROPIC_API_KEY");
}

#[test]
fn partial_config_file_loads() {
    let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::io::Write::write_all(&mut f, b"[ocr]\nenabled = false\n").unwrap();
    let cfg = Config::load(f.path()).expect("load partial config");
    assert!(!cfg.ocr.enabled);
    assert_eq!(cfg.model.max_tokens, 2048);
}
