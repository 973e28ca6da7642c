//! Pure text helpers shared by every view.

use chrono::{DateTime, FixedOffset, Timelike};

pub const SNIPPET_CHARS: usize = 50;
pub const ELLIPSIS: &str = "...";

/// Turns "Last, First" into "First Last".
///
/// Input without a ", " separator is not a name this server produces; it is
/// returned trimmed rather than guessed at.
pub fn format_name(name_with_comma: &str) -> String {
    let mut parts = name_with_comma.split(", ");
    match (parts.next(), parts.next()) {
        (Some(last), Some(first)) => format!("{first} {last}"),
        _ => name_with_comma.trim().to_string(),
    }
}

/// en-US short date with a 24 hour clock, e.g. `Jan 5, 2024, 14:03`.
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%b %-d, %Y, %H:%M").to_string()
}

pub fn snippet(content: &str) -> String {
    match content.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &content[..cut]),
        None => content.to_string(),
    }
}

/// Escapes text for insertion into markup. Message content always goes
/// through here; it is never inserted as raw markup.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Greeting {
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Good Morning",
            Self::Afternoon => "Good Afternoon",
            Self::Evening => "Good Evening",
            Self::Night => "Good Night",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Morning => "\u{2600}\u{fe0f}",
            Self::Afternoon => "\u{1f324}\u{fe0f}",
            Self::Evening => "\u{1f319}",
            Self::Night => "\u{1f30c}",
        }
    }
}

pub fn greeting_for_hour(hour: u32) -> Greeting {
    match hour {
        5..=11 => Greeting::Morning,
        12..=16 => Greeting::Afternoon,
        17..=20 => Greeting::Evening,
        _ => Greeting::Night,
    }
}

pub fn greeting_at<Tz: chrono::TimeZone>(now: &DateTime<Tz>) -> Greeting {
    greeting_for_hour(now.hour())
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
