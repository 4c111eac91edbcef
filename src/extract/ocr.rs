use super::{OcrEngine, types::ToolStatus};
use crate::{config::Ocr, error::ExtractionError};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, warn};

/// OCR by rendering pages with `pdftoppm` and recognizing them with `tesseract`.
pub struct CommandOcr {
    pdftoppm_exe: PathBuf,
    tesseract_exe: PathBuf,
    language: String,
    dpi: u32,
    timeout: Option<Duration>,
}

impl CommandOcr {
    pub fn new(cfg: &Ocr) -> Self {
        Self {
            pdftoppm_exe: expand_tilde(&cfg.pdftoppm_exe),
            tesseract_exe: expand_tilde(&cfg.tesseract_exe),
            language: cfg.language.clone(),
            dpi: cfg.dpi.max(72),
            timeout: (cfg.timeout_seconds > 0).then(|| Duration::from_secs(cfg.timeout_seconds)),
        }
    }

    /// Check both tools by asking for their version.
    pub fn doctor(&self) -> Vec<ToolStatus> {
        vec![
            check_tool("pdftoppm", &self.pdftoppm_exe, "-v"),
            check_tool("tesseract", &self.tesseract_exe, "--version"),
        ]
    }

    fn render_pages(&self, input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let mut cmd = Command::new(&self.pdftoppm_exe);
        cmd.args(["-png", "-r", &self.dpi.to_string()])
            .arg(input)
            .arg(out_dir.join("page"));
        run_tool("pdftoppm", cmd, self.timeout)?;

        let mut images: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        // pdftoppm zero-pads page numbers to a common width, so lexical order is page order.
        images.sort();
        Ok(images)
    }

    fn recognize(&self, image: &Path) -> Result<String, ExtractionError> {
        let mut cmd = Command::new(&self.tesseract_exe);
        cmd.arg(image).arg("stdout").args(["-l", &self.language]);
        let out = run_tool("tesseract", cmd, self.timeout)?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl OcrEngine for CommandOcr {
    fn recognize_pdf(&self, input: &Path) -> Result<Vec<String>, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let images = self.render_pages(input, temp_dir.path())?;
        if images.is_empty() {
            return Err(ExtractionError::ToolFailed {
                tool: "pdftoppm".into(),
                stderr: format!("no pages rendered from {}", input.display()),
            });
        }

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            pages.push(self.recognize(image)?);
        }
        Ok(pages)
    }
}

fn check_tool(tool: &str, exe: &Path, version_flag: &str) -> ToolStatus {
    let mut cmd = Command::new(exe);
    cmd.arg(version_flag);
    match run_tool(tool, cmd, Some(Duration::from_secs(10))) {
        Ok(out) => {
            // Both tools print their version banner on stderr in some builds.
            let banner = if out.stdout.is_empty() {
                out.stderr
            } else {
                out.stdout
            };
            let version = String::from_utf8_lossy(&banner)
                .lines()
                .next()
                .map(|l| l.trim().to_string());
            ToolStatus {
                tool: tool.to_string(),
                exe: exe.display().to_string(),
                available: true,
                version,
                error: None,
            }
        }
        Err(err) => ToolStatus {
            tool: tool.to_string(),
            exe: exe.display().to_string(),
            available: false,
            version: None,
            error: Some(err.to_string()),
        },
    }
}

fn run_tool(tool: &str, mut cmd: Command, timeout: Option<Duration>) -> Result<Output, ExtractionError> {
    debug!("run {} timeout={:?}", tool, timeout);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractionError::ToolNotFound(tool.to_string()));
        }
        Err(e) => return Err(ExtractionError::Io(e)),
    };

    let output = match timeout {
        Some(t) => wait_with_timeout(tool, &mut child, t)?,
        None => child.wait_with_output()?,
    };

    if !output.status.success() {
        return Err(ExtractionError::ToolFailed {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

fn wait_with_timeout(tool: &str, child: &mut Child, timeout: Duration) -> Result<Output, ExtractionError> {
    // Drain pipes while waiting so a chatty child can't block on a full buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Output {
                status,
                stdout: join_reader(stdout_thread)?,
                stderr: join_reader(stderr_thread)?,
            });
        }

        if start.elapsed() > timeout {
            warn!("{} timed out after {:?}", tool, timeout);
            let _ = child.kill();
            child.wait()?;
            let _ = join_reader(stdout_thread);
            let _ = join_reader(stderr_thread);
            return Err(ExtractionError::Timeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            });
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

fn join_reader(
    handle: std::thread::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, ExtractionError> {
    handle
        .join()
        .map_err(|_| ExtractionError::Io(std::io::Error::other("pipe reader thread panicked")))?
        .map_err(ExtractionError::Io)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
