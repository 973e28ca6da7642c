//! Prints engine events to the terminal.

use client_core::{
    markup, AutocompleteView, BannerKind, ClientEvent, ComposeView, FormSnapshot, Preview,
    ThreadView,
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Text,
    Html,
}

pub fn spawn(mut events: broadcast::Receiver<ClientEvent>, style: Style) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(output) = render_event(&event, style) {
                        println!("{output}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "render: terminal fell behind; events dropped")
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub fn render_event(event: &ClientEvent, style: Style) -> Option<String> {
    match (event, style) {
        (ClientEvent::PreviewsUpdated(previews), Style::Html) => Some(markup::preview_list(previews)),
        (ClientEvent::PreviewsUpdated(previews), Style::Text) => Some(preview_lines(previews)),
        (ClientEvent::ThreadRendered(view), Style::Html) => Some(markup::thread_view(view)),
        (ClientEvent::ThreadRendered(view), Style::Text) => thread_lines(view),
        (ClientEvent::SuggestionsUpdated(view), Style::Html) => {
            Some(markup::suggestion_list(view)).filter(|html| !html.is_empty())
        }
        (ClientEvent::SuggestionsUpdated(view), Style::Text) => suggestion_lines(view),
        (
            ClientEvent::SelectionChanged {
                thread_id: Some(id),
                reply_visible,
            },
            _,
        ) => Some(if *reply_visible {
            format!("opened thread {id} (reply with `messenger send --reply-to {id}`)")
        } else {
            format!("opened thread {id}")
        }),
        (ClientEvent::SelectionChanged { thread_id: None, .. }, _) => None,
        (ClientEvent::FormUpdated(snapshot), _) => form_errors(snapshot),
        (ClientEvent::ComposeUpdated(view), _) => compose_errors(view),
        (ClientEvent::Banner(Some(banner)), _) => Some(match banner.kind {
            BannerKind::Warning => format!("[warning] {}", banner.message),
            BannerKind::Success => format!("[ok] {}", banner.message),
        }),
        (ClientEvent::Banner(None), _) => None,
        (ClientEvent::Navigate(target), _) => Some(format!("-> {}", target.path())),
        (ClientEvent::SessionExpired, _) => {
            Some("session expired; log in again".to_string())
        }
        (ClientEvent::Error(message), _) => Some(format!("error: {message}")),
    }
}

fn preview_lines(previews: &[Preview]) -> String {
    let mut lines = vec![format!("inbox ({} conversations)", previews.len())];
    lines.extend(previews.iter().map(|preview| {
        let marker = if preview.selected { '*' } else { ' ' };
        format!(
            "{marker} [{}] {:<24} {}  {}",
            preview.thread_id, preview.participant, preview.time, preview.snippet
        )
    }));
    lines.join("\n")
}

fn thread_lines(view: &ThreadView) -> Option<String> {
    match view {
        ThreadView::Closed => None,
        ThreadView::Empty => Some(client_core::inbox::NO_MESSAGES_PLACEHOLDER.to_string()),
        ThreadView::Messages { entries, .. } => Some(
            entries
                .iter()
                .map(|entry| {
                    format!(
                        "{} {:>8} | {}: {}",
                        entry.time,
                        entry.direction.as_str(),
                        entry.sender,
                        entry.content
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

fn suggestion_lines(view: &AutocompleteView) -> Option<String> {
    if !view.open {
        return None;
    }
    Some(
        view.suggestions
            .iter()
            .map(|suggestion| format!("  {}", suggestion.label))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn form_errors(snapshot: &FormSnapshot) -> Option<String> {
    let errors: Vec<String> = snapshot
        .fields
        .iter()
        .filter_map(|field| {
            field
                .error
                .as_ref()
                .map(|error| format!("{}: {error}", field.id))
        })
        .collect();
    (!errors.is_empty()).then(|| errors.join("\n"))
}

fn compose_errors(view: &ComposeView) -> Option<String> {
    let errors: Vec<&str> = [&view.recipient_error, &view.content_error]
        .into_iter()
        .filter_map(|error| error.as_deref())
        .collect();
    (!errors.is_empty()).then(|| errors.join("\n"))
}
