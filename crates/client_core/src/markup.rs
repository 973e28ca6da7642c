//! HTML fragments for the inbox and compose views.
//!
//! Every string that came from the server is escaped; there is no path that
//! inserts message content as markup.

use std::fmt::Write;

use crate::{
    autocomplete::AutocompleteView,
    format::escape_text,
    inbox::{Preview, ThreadView, NO_MESSAGES_PLACEHOLDER},
};

pub fn preview_list(previews: &[Preview]) -> String {
    let mut html = String::new();
    for preview in previews {
        let class = if preview.selected {
            "message-preview selected"
        } else {
            "message-preview"
        };
        let _ = write!(
            html,
            concat!(
                r#"<div class="{}" data-thread-id="{}" data-timestamp="{}">"#,
                r#"<div class="sender-info">"#,
                r#"<span class="sender-name">{}</span>"#,
                r#"<span class="message-time">{}</span>"#,
                "</div>",
                r#"<div class="message-snippet">{}</div>"#,
                "</div>"
            ),
            class,
            preview.thread_id,
            preview.sort_key,
            escape_text(&preview.participant),
            escape_text(&preview.time),
            escape_text(&preview.snippet),
        );
    }
    html
}

pub fn thread_view(view: &ThreadView) -> String {
    match view {
        ThreadView::Closed => String::new(),
        ThreadView::Empty => {
            format!(r#"<div class="no-message-selected">{NO_MESSAGES_PLACEHOLDER}</div>"#)
        }
        ThreadView::Messages { entries, scroll_to } => {
            let mut html = String::new();
            for (index, entry) in entries.iter().enumerate() {
                let anchor = if index == *scroll_to {
                    r#" id="scroll-anchor""#
                } else {
                    ""
                };
                let _ = write!(
                    html,
                    concat!(
                        r#"<div class="message-item {}"{}>"#,
                        r#"<div class="header">"#,
                        r#"<span class="sender-name">{}</span>"#,
                        r#"<span class="message-time">{}</span>"#,
                        "</div>",
                        r#"<div class="content">{}</div>"#,
                        "</div>"
                    ),
                    entry.direction.as_str(),
                    anchor,
                    escape_text(&entry.sender),
                    escape_text(&entry.time),
                    escape_text(&entry.content),
                );
            }
            html
        }
    }
}

/// Empty when the dropdown is closed.
pub fn suggestion_list(view: &AutocompleteView) -> String {
    if !view.open {
        return String::new();
    }
    view.suggestions.iter().fold(String::new(), |mut html, suggestion| {
        let _ = write!(
            html,
            r#"<div class="suggestion-item" data-username="{}">{}</div>"#,
            escape_text(&suggestion.username),
            escape_text(&suggestion.label),
        );
        html
    })
}

#[cfg(test)]
#[path = "tests/markup_tests.rs"]
mod tests;
