//! Server-rendered HTML responses.
//!
//! # Responsibilities
//! - Escape untrusted text before it reaches markup
//! - Wrap page bodies in a common layout
//! - Render flash messages and the hidden CSRF field
//!
//! # Design Decisions
//! - Plain string building; every interpolated value goes through `escape`
//! - No inline script or style, so the default CSP needs no exceptions

use axum::response::Html;

use crate::security::csrf::CSRF_FIELD;
use crate::session::{Flash, FlashLevel};

/// Escape text for use in element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Full HTML document around an already-escaped body.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    ))
}

pub fn csrf_input(token: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{}\">",
        escape(token)
    )
}

pub fn flash_list(flashes: &[Flash]) -> String {
    if flashes.is_empty() {
        return String::new();
    }
    let items: String = flashes
        .iter()
        .map(|flash| {
            let class = match flash.level {
                FlashLevel::Info => "info",
                FlashLevel::Error => "error",
            };
            format!("<li class=\"{class}\">{}</li>", escape(&flash.message))
        })
        .collect();
    format!("<ul class=\"flashes\">{items}</ul>")
}

/// A POST form with the CSRF field and one submit button.
pub fn post_button(action: &str, token: &str, label: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\">{}<button type=\"submit\">{}</button></form>",
        escape(action),
        csrf_input(token),
        escape(label)
    )
}
