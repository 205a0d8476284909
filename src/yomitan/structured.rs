//! Glossary elements and structured-content trees to HTML
//!
//! The HTML produced here is raw: callers pass it through the sanitizer before
//! it is stored. Image references met along the way are collected so the
//! referenced archive members can be persisted as media.

use serde_json::{Map, Value};

use crate::sanitize::escape_html;

const MAX_DEPTH: usize = 128;

/// Tags rendered with a `gloss-sc-<tag>` class.
const CLASSED_TAGS: &[&str] = &["div", "ol", "ul", "li", "details", "summary", "span"];

/// An image referenced from a glossary.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub path: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Renders one glossary element. `None` for element shapes that carry no text.
pub fn render_glossary_item(item: &Value, media: &mut Vec<MediaRef>) -> Option<String> {
    match item {
        Value::String(text) => Some(escape_html(text)),
        Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
            Some("text") => obj.get("text").and_then(Value::as_str).map(escape_html),
            Some("structured-content") => {
                let mut out = String::new();
                render_node(obj.get("content")?, 0, &mut out, media);
                Some(out)
            }
            Some("image") => {
                let mut out = String::new();
                render_image(obj, &mut out, media);
                Some(out)
            }
            _ => None,
        },
        // [uninflected, [rule, ...]]
        Value::Array(parts) => {
            let word = parts.first()?.as_str()?;
            let rules: Vec<&str> = parts
                .get(1)
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let mut out = format!("<span class=\"gloss-deinflection\">{}", escape_html(word));
            if !rules.is_empty() {
                out.push_str(&format!(" ({})", escape_html(&rules.join(", "))));
            }
            out.push_str("</span>");
            Some(out)
        }
        _ => None,
    }
}

fn render_node(node: &Value, depth: usize, out: &mut String, media: &mut Vec<MediaRef>) {
    if depth > MAX_DEPTH {
        tracing::warn!("Structured content nested deeper than {} levels, truncated", MAX_DEPTH);
        return;
    }
    match node {
        Value::String(text) => out.push_str(&escape_html(text)),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(children) => {
            for child in children {
                render_node(child, depth + 1, out, media);
            }
        }
        Value::Object(obj) => render_element(obj, depth, out, media),
        Value::Null | Value::Bool(_) => {}
    }
}

fn render_element(
    obj: &Map<String, Value>,
    depth: usize,
    out: &mut String,
    media: &mut Vec<MediaRef>,
) {
    let Some(tag) = obj.get("tag").and_then(Value::as_str) else {
        if let Some(content) = obj.get("content") {
            render_node(content, depth + 1, out, media);
        }
        return;
    };
    let tag = tag.to_ascii_lowercase();
    if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return;
    }

    match tag.as_str() {
        "br" => out.push_str("<br>"),
        "img" => render_image(obj, out, media),
        "a" => {
            let href = obj.get("href").and_then(Value::as_str).unwrap_or_default();
            out.push_str(&format!("<a href=\"{}\"", escape_html(href)));
            if href.starts_with("http") {
                out.push_str(" rel=\"noreferrer noopener\" target=\"_blank\"");
            }
            out.push('>');
            render_content(obj, depth, out, media);
            out.push_str("</a>");
        }
        t if CLASSED_TAGS.contains(&t) => {
            out.push_str(&format!("<{t} class=\"gloss-sc-{t}\">"));
            render_content(obj, depth, out, media);
            out.push_str(&format!("</{t}>"));
        }
        t => {
            out.push('<');
            out.push_str(t);
            for (key, value) in obj {
                if key == "tag" || key == "content" {
                    continue;
                }
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    out.push_str(&format!(" {}=\"{}\"", key, escape_html(&value)));
                }
            }
            out.push('>');
            render_content(obj, depth, out, media);
            out.push_str(&format!("</{t}>"));
        }
    }
}

fn render_content(
    obj: &Map<String, Value>,
    depth: usize,
    out: &mut String,
    media: &mut Vec<MediaRef>,
) {
    if let Some(content) = obj.get("content") {
        render_node(content, depth + 1, out, media);
    }
}

fn render_image(obj: &Map<String, Value>, out: &mut String, media: &mut Vec<MediaRef>) {
    let Some(path) = obj.get("path").and_then(Value::as_str) else {
        return;
    };
    let alt = obj
        .get("alt")
        .or_else(|| obj.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    out.push_str(&format!(
        "<img src=\"{}\" alt=\"{}\" style=\"max-width:200px;max-height:200px\">",
        escape_html(path),
        escape_html(alt)
    ));

    let dimension = |key: &str| {
        obj.get(key)
            .and_then(Value::as_f64)
            .filter(|v| *v > 0.0)
            .map(|v| v.round() as u32)
    };
    if !media.iter().any(|m| m.path == path) {
        media.push(MediaRef {
            path: path.to_string(),
            width: dimension("width"),
            height: dimension("height"),
        });
    }
}
