// Sanitize report text before it is embedded in the extraction prompt.
// Strips invisible Unicode, drops prompt-injection lines, normalizes whitespace.

/// Maximum report length sent to the AI service (characters).
pub const MAX_REPORT_CHARS: usize = 50_000;

/// Sanitize report text for the prompt. When injection lines are removed,
/// logs the count only; report content is never logged.
pub fn sanitize_report_text(raw: &str) -> String {
    let cleaned = remove_invisible_chars(raw);
    let (kept, removed) = remove_injection_lines(&cleaned);

    if removed > 0 {
        tracing::warn!(
            removed_lines = removed,
            "Injection patterns detected and removed from report text"
        );
    }

    let normalized = normalize_whitespace(&kept);
    truncate_chars(&normalized, MAX_REPORT_CHARS)
}

/// Remove zero-width, bidi-override and control characters.
/// Standard whitespace (space, newline, tab, CR) is kept.
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t' | '\r') {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

fn is_role_marker(trimmed: &str) -> bool {
    const MARKERS: &[&str] = &[
        "system:",
        "[system]",
        "[assistant]",
        "[inst]",
        "[/inst]",
        "<<sys>>",
        "note to ai:",
        "system update:",
    ];
    MARKERS.iter().any(|m| trimmed.starts_with(m))
}

fn is_override_attempt(trimmed: &str) -> bool {
    const PHRASES: &[&str] = &[
        "ignore previous instructions",
        "ignore all instructions",
        "ignore the above instructions",
        "disregard your instructions",
        "disregard all instructions",
        "forget your instructions",
        "new instructions:",
        "return only the json array",
    ];
    PHRASES.iter().any(|p| trimmed.contains(p))
}

fn is_instruction_tag(trimmed: &str) -> bool {
    trimmed.starts_with("<instruction")
        || trimmed.starts_with("</instruction")
        || trimmed.starts_with("<system")
        || trimmed.starts_with("</system")
}

/// Returns (kept_text, removed_line_count).
fn remove_injection_lines(text: &str) -> (String, usize) {
    let mut kept = String::with_capacity(text.len());
    let mut removed = 0usize;

    for line in text.lines() {
        let trimmed = line.trim().to_lowercase();
        if is_role_marker(&trimmed) || is_override_attempt(&trimmed) || is_instruction_tag(&trimmed)
        {
            removed += 1;
            continue;
        }
        kept.push_str(line);
        kept.push('\n');
    }

    (kept, removed)
}

/// Collapse runs of spaces/tabs, trim each line, and keep at most one blank
/// line in a row.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&collapsed);
        out.push('\n');
    }

    out.trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
