//! Small text helpers shared by the tools and the bot front end.

/// Prefix of every failure shown to a user.
pub const FAILURE_MARKER: &str = "❌";

/// Prefix of every successful tool result.
pub const SUCCESS_MARKER: &str = "✅";

/// Truncate to at most `max_chars` characters, ending with "..." when cut.
///
/// Works on characters rather than bytes so multi-byte text never splits.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Format seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format an integer with thousands separators (`1234567` -> `1,234,567`).
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
