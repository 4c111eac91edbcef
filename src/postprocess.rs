use crate::config::Postprocess;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Cleans extracted text before it goes into a prompt.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    cfg: Postprocess,
    patterns: Vec<Regex>,
}

impl TextCleaner {
    pub fn new(cfg: &Postprocess) -> Result<Self, regex::Error> {
        let patterns = if cfg.remove_by_regex {
            cfg.regex
                .patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };
        Ok(Self {
            cfg: cfg.clone(),
            patterns,
        })
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.to_string();

        if self.cfg.normalize_newlines {
            text = text.replace("\r\n", "\n").replace('\r', "\n");
        }

        if self.cfg.normalize_unicode {
            text = text.nfkc().collect::<String>();
        }

        if self.cfg.strip_control_chars {
            text = strip_control_chars(&text);
        }

        if self.cfg.trim_trailing_whitespace {
            text = text
                .lines()
                .map(|l| l.trim_end())
                .collect::<Vec<_>>()
                .join("\n");
        }

        if !self.patterns.is_empty() {
            text = self.remove_matching_lines(&text);
        }

        if self.cfg.collapse_blank_lines {
            text = collapse_blank_lines(&text);
        }

        text.trim().to_string()
    }

    fn remove_matching_lines(&self, s: &str) -> String {
        s.lines()
            .filter(|line| !self.patterns.iter().any(|r| r.is_match(line.trim())))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn strip_control_chars(s: &str) -> String {
    // Form feeds separate pages in text-layer output.
    s.chars()
        .map(|ch| if ch == '\u{000C}' { '\n' } else { ch })
        .filter(|&ch| ch == '\n' || ch == '\t' || !ch.is_control())
        .collect()
}

fn collapse_blank_lines(s: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0usize;
    for line in s.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n")
}
