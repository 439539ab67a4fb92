/// Replace every occurrence of `secret` in `text` with a fixed marker.
///
/// Used before logging anything that may embed the bot credential (request
/// URLs, transport errors).
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "<redacted>")
}

/// Truncate `s` to at most `max` chars, appending `...` when cut.
pub fn truncate_text(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!("{}...", s.chars().take(max).collect::<String>())
}
