//! HTML projection of widget state.
//!
//! Every function here is pure: same state in, same markup out. Message
//! text, draft and title are always emitted as escaped plain text and never
//! interpreted as markup.

use std::fmt::Write as _;

use uuid::Uuid;

use crate::widget::{ChatWidget, Message};

/// Text shown after the last message while a reply is outstanding.
pub const TYPING_INDICATOR: &str = "Bot is typing...";

/// Panel slide duration, in seconds.
const SLIDE_SECS: f32 = 0.3;

/// Static presentation settings shared by every widget instance.
#[derive(Debug, Clone)]
pub struct WidgetSettings {
    /// Header title.
    pub title: String,
    /// Input placeholder.
    pub placeholder: String,
    /// How often the message list refreshes while loading.
    pub poll_interval_ms: u64,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            title: "Chatbot".to_string(),
            placeholder: "Type a message...".to_string(),
            poll_interval_ms: 500,
        }
    }
}

/// Escape text for use in HTML content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the whole widget: trigger button, panel, header, messages, input.
///
/// The panel is always present so the slide can animate in both directions;
/// when closed it sits fully off-screen at `100%`.
pub fn widget(id: Uuid, state: &ChatWidget, settings: &WidgetSettings) -> String {
    let mut html = format!(r#"<div id="chat-widget" data-widget-id="{id}">"#);

    if !state.is_open() {
        let _ = write!(
            html,
            r##"
    <button class="chat-toggle" aria-label="Open chat" hx-post="/widget/{id}/toggle" hx-include="#chat-window-{id}" hx-target="#chat-widget" hx-swap="outerHTML">{icon}</button>"##,
            icon = MESSAGE_ICON,
        );
    }

    let (class, offset) = if state.is_open() {
        ("chat-window open", "0%")
    } else {
        ("chat-window", "100%")
    };

    let _ = write!(
        html,
        r##"
    <div id="chat-window-{id}" class="{class}" style="transform: translateX({offset}); transition: transform {SLIDE_SECS}s;">
        <div class="chat-header">
            <h2>{title}</h2>
            <button class="close-btn" aria-label="Close chat" hx-post="/widget/{id}/close" hx-include="closest .chat-window" hx-target="#chat-widget" hx-swap="outerHTML">{icon}</button>
        </div>
        {messages}
        <div class="chat-input" hx-post="/widget/{id}/draft" hx-trigger="input delay:300ms" hx-include="find input" hx-swap="none">
            <input type="text" name="message" placeholder="{placeholder}" value="{draft}" autocomplete="off"
                hx-post="/widget/{id}/keypress" hx-trigger="keydown[key=='Enter']" hx-vals='{{"key": "Enter"}}'
                hx-target="#chat-widget" hx-swap="outerHTML">
            <button hx-post="/widget/{id}/send" hx-include="closest .chat-input" hx-target="#chat-widget" hx-swap="outerHTML">Send</button>
        </div>
    </div>
</div>"##,
        title = escape(&settings.title),
        icon = CLOSE_ICON,
        messages = message_list(id, state, settings),
        placeholder = escape(&settings.placeholder),
        draft = escape(state.draft()),
    );

    html
}

/// Render the scrollable message list.
///
/// While loading, the list polls itself and ends with the typing indicator.
/// The first render after the last reply drops the trigger, which stops the
/// polling.
pub fn message_list(id: Uuid, state: &ChatWidget, settings: &WidgetSettings) -> String {
    let poll = if state.is_loading() {
        format!(
            r#" hx-get="/widget/{id}/messages" hx-trigger="every {}ms" hx-swap="outerHTML""#,
            settings.poll_interval_ms
        )
    } else {
        String::new()
    };

    let mut html = format!(r#"<div id="chat-messages-{id}" class="chat-messages"{poll}>"#);
    for message in state.messages() {
        html.push_str(&message_item(message));
    }
    if state.is_loading() {
        let _ = write!(html, r#"<div class="loading">{TYPING_INDICATOR}</div>"#);
    }
    html.push_str("</div>");
    html
}

fn message_item(message: &Message) -> String {
    format!(
        r#"<div class="message {}">{}</div>"#,
        message.sender().as_str(),
        escape(message.text())
    )
}

/// Full host page with the widget mounted in it.
///
/// Leaving the page unmounts the widget.
pub fn page(id: Uuid, state: &ChatWidget, settings: &WidgetSettings) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>

    <!-- HTMX (local) -->
    <script src="/static/vendor/htmx-2.0.8.min.js"></script>

    <!-- Widget styles -->
    <link rel="stylesheet" href="/static/chat.css">
</head>
<body>
{widget}
<script>
    addEventListener("pagehide", (event) => {{
        if (!event.persisted) navigator.sendBeacon("/widget/{id}/unmount");
    }});
</script>
</body>
</html>"#,
        title = escape(&settings.title),
        widget = widget(id, state, settings),
    )
}

const MESSAGE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M21 15a2 2 0 0 1-2 2H7l-4 4V5a2 2 0 0 1 2-2h14a2 2 0 0 1 2 2z"/></svg>"#;

const CLOSE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><line x1="18" y1="6" x2="6" y2="18"/><line x1="6" y1="6" x2="18" y2="18"/></svg>"#;
