/// Instruction appended after the document when the caller supplies none.
pub const DEFAULT_INSTRUCTION: &str = "Please summarize the text.";

/// Custom instructions are hard-truncated to this many characters.
pub const MAX_INSTRUCTION_LEN: usize = 2000;

/// Strip control characters and truncate. Blank input yields `None`.
pub fn sanitize_instruction(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_INSTRUCTION_LEN)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Wrap the document in `<content>` tags and follow it with the instruction.
pub fn build_prompt(text: &str, instruction: Option<&str>) -> String {
    let instruction = instruction
        .and_then(sanitize_instruction)
        .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string());
    format!("Here is the contents of a document <content>{text}</content>\n{instruction}")
}
