use serde_json::json;
use speedread::{
    config::Config,
    extract::{Extractor, OcrEngine},
    ApiError, Error, ExtractionError, Reader, Vendor,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLAUDE: &str = "claude-3-opus-20240229";

// The blocking client must not run inside the runtime, so the mock server is
// driven from a runtime we own and requests are made from the test thread.
struct Harness {
    server: MockServer,
    rt: Runtime,
}

impl Harness {
    fn start() -> Self {
        let rt = Runtime::new().expect("tokio runtime");
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn request_count(&self) -> usize {
        self.rt
            .block_on(self.server.received_requests())
            .map(|r| r.len())
            .unwrap_or(0)
    }

    fn config(&self) -> Config {
        let mut cfg = Config::default();
        cfg.providers.anthropic.base_url = self.server.uri();
        cfg.providers.openai.base_url = self.server.uri();
        cfg.http.timeout_seconds = 10;
        cfg
    }

    fn reader(&self, model: &str) -> Reader {
        Reader::with_env(&self.config(), model, Some("sk-test"), |_| None).expect("reader")
    }
}

fn text_file(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(f, "{contents}").unwrap();
    f
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn anthropic_ok(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": CLAUDE,
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 42, "output_tokens": 7}
    }))
}

#[test]
fn anthropic_summary_is_returned_verbatim() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({"model": CLAUDE, "max_tokens": 2048})))
            .and(body_string_contains("<content>The board approved the budget.</content>"))
            .respond_with(anthropic_ok("Budget approved.")),
    );

    let input = text_file("The board approved the budget.");
    let summary = h.reader(CLAUDE).summarize_file(input.path(), None).unwrap();

    assert_eq!(summary.text, "Budget approved.");
    assert_eq!(summary.stop_reason.as_deref(), Some("end_turn"));
    let usage = summary.usage.unwrap();
    assert_eq!((usage.input_tokens, usage.output_tokens), (42, 7));
    assert_eq!(h.request_count(), 1);
}

#[test]
fn pdf_fixture_flows_through_to_the_vendor() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_string_contains("Speedread fixture document"))
            .respond_with(anthropic_ok("A fixture.")),
    );

    let summary = h
        .reader(CLAUDE)
        .summarize_file(&fixture("text.pdf"), Some("One sentence please."))
        .unwrap();
    assert_eq!(summary.text, "A fixture.");
}

struct FixedOcr;

impl OcrEngine for FixedOcr {
    fn recognize_pdf(&self, _input: &Path) -> Result<Vec<String>, ExtractionError> {
        Ok(vec!["Minutes of the annual meeting".into()])
    }
}

#[test]
fn scanned_pdf_is_summarized_from_ocr_text() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_string_contains("Minutes of the annual meeting"))
            .respond_with(anthropic_ok("Annual meeting minutes.")),
    );

    let reader = h
        .reader(CLAUDE)
        .with_extractor(Extractor::new(&h.config()).with_ocr(Box::new(FixedOcr)));
    let summary = reader
        .summarize_file(&fixture("image_only.pdf"), None)
        .unwrap();
    assert_eq!(summary.text, "Annual meeting minutes.");
    assert_eq!(h.request_count(), 1);
}

#[test]
fn authentication_failure_is_an_api_error_without_retry() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            }))),
    );

    let input = text_file("some text");
    let err = h.reader(CLAUDE).summarize_file(input.path(), None).unwrap_err();

    match err {
        Error::Api(ApiError::Authentication {
            vendor,
            status,
            message,
        }) => {
            assert_eq!(vendor, Vendor::Anthropic);
            assert_eq!(status, 401);
            assert_eq!(message, "invalid x-api-key");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.request_count(), 1);
}

#[test]
fn rate_limit_is_reported_once() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "slow down"}
            }))),
    );

    let err = h.reader(CLAUDE).summarize_text("some text", None).unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::RateLimited { .. })), "{err}");
    assert_eq!(h.request_count(), 1);
}

#[test]
fn server_error_keeps_status() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded")),
    );

    let err = h.reader(CLAUDE).summarize_text("some text", None).unwrap_err();
    match err {
        Error::Api(ApiError::Status { status, message, .. }) => {
            assert_eq!(status, 529);
            assert_eq!(message, "overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_body_is_reported() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json")),
    );

    let err = h.reader(CLAUDE).summarize_text("some text", None).unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Malformed { .. })), "{err}");
}

#[test]
fn response_without_text_blocks_is_malformed() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [],
                "stop_reason": "max_tokens"
            }))),
    );

    let err = h.reader(CLAUDE).summarize_text("some text", None).unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Malformed { .. })), "{err}");
}

#[test]
fn text_block_without_text_is_malformed() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text"}],
                "stop_reason": "end_turn"
            }))),
    );

    let err = h.reader(CLAUDE).summarize_text("some text", None).unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Malformed { .. })), "{err}");
    assert_eq!(h.request_count(), 1);
}

#[test]
fn openai_summary_is_returned_verbatim() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o"})))
            .and(body_string_contains("Bullet points only."))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "- one\n- two"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 30, "completion_tokens": 5, "total_tokens": 35}
            }))),
    );

    let summary = h
        .reader("gpt-4o")
        .summarize_text("Long document body.", Some("Bullet points only."))
        .unwrap();
    assert_eq!(summary.text, "- one\n- two");
    assert_eq!(summary.model, "gpt-4o-2024-08-06");
    assert_eq!(summary.stop_reason.as_deref(), Some("stop"));
    assert_eq!(summary.usage.unwrap().output_tokens, 5);
    assert_eq!(h.request_count(), 1);
}

#[test]
fn openai_forbidden_is_authentication_error() {
    let h = Harness::start();
    h.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"message": "project not allowed", "type": "invalid_request_error"}
            }))),
    );

    let err = h.reader("gpt-4o").summarize_text("text", None).unwrap_err();
    let Error::Api(api) = err else {
        panic!("expected an API error, got {err}");
    };
    assert_eq!(api.vendor(), Vendor::OpenAi);
    assert!(matches!(api, ApiError::Authentication { status: 403, .. }), "{api}");
    assert_eq!(h.request_count(), 1);
}

#[test]
fn empty_text_never_reaches_the_vendor() {
    let h = Harness::start();
    h.mount(Mock::given(method("POST")).respond_with(anthropic_ok("unused")));

    let err = h.reader(CLAUDE).summarize_text(" \n\n ", None).unwrap_err();
    assert!(matches!(err, Error::Extraction(ExtractionError::NoText(_))), "{err}");
    assert_eq!(h.request_count(), 0);
}

#[test]
fn extraction_failure_never_reaches_the_vendor() {
    let h = Harness::start();
    h.mount(Mock::given(method("POST")).respond_with(anthropic_ok("unused")));

    let err = h
        .reader(CLAUDE)
        .summarize_file(Path::new("/no/such/file.pdf"), None)
        .unwrap_err();
    assert!(matches!(err, Error::Extraction(ExtractionError::NotFound(_))), "{err}");
    assert_eq!(h.request_count(), 0);
}

#[test]
fn unreachable_vendor_is_a_transport_error() {
    let mut cfg = Config::default();
    cfg.providers.anthropic.base_url = "http://127.0.0.1:9".into();
    cfg.http.timeout_seconds = 5;
    let reader = Reader::with_env(&cfg, CLAUDE, Some("sk-test"), |_| None).unwrap();

    let err = reader.summarize_text("some text", None).unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Transport { .. })), "{err}");
}
