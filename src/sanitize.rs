//! Whitelist HTML sanitizer applied to every glossary fragment at import time
//!
//! Output contains only `span b i em strong br p div ul li ol` tags and only
//! the `class` attribute. A preprocessing pass first maps legacy inline
//! styles and dictionary-specific element names (`<k>`, `<c>`, `<font>`...)
//! onto `<span class="...">`. Sanitizing sanitized output is a no-op.

use regex::{Captures, Regex};
use std::sync::LazyLock;

const ALLOWED_TAGS: &[&str] = &[
    "span", "b", "i", "em", "strong", "br", "p", "div", "ul", "li", "ol",
];

/// Elements whose content is dropped together with the tags.
const OPAQUE_TAGS: &[&str] = &["script", "style", "template", "iframe", "object"];

/// Dictionary markup (XDXF and friends) rewritten to classed spans.
const LEGACY_ELEMENTS: &[(&str, &str)] = &[
    ("k", "dict-k"),
    ("c", "dict-c"),
    ("kref", "dict-kref"),
    ("abr", "dict-abr"),
    ("ex", "dict-ex"),
    ("dtrn", "dict-dtrn"),
    ("co", "dict-co"),
    ("tr", "dict-tr"),
    ("font", "dict-font"),
    ("u", "dict-underline"),
    ("sup", "dict-sup"),
    ("sub", "dict-sub"),
];

/// Inline style declarations that survive as classes.
const LEGACY_STYLES: &[(&str, &str)] = &[
    ("font-weight:bold", "dict-bold"),
    ("font-style:italic", "dict-italic"),
    ("text-decoration:underline", "dict-underline"),
    ("color:", "dict-color"),
];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#,
    )
    .expect("tag pattern")
});

/// One attribute: a name, then an optional quoted or bare value.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]{0,31}|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});")
        .expect("entity pattern")
});

pub fn sanitize(html: &str) -> String {
    let prepared = rewrite_legacy_markup(html);
    let mut out = String::with_capacity(prepared.len());
    let mut opaque: Option<String> = None;
    let mut last = 0;

    for caps in TAG_RE.captures_iter(&prepared) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if opaque.is_none() {
            push_text(&mut out, &prepared[last..whole.start()]);
        }
        last = whole.end();

        let Some(name) = caps.get(2) else {
            // comment
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = !caps[1].is_empty();

        if let Some(open) = &opaque {
            if closing && *open == name {
                opaque = None;
            }
            continue;
        }
        if OPAQUE_TAGS.contains(&name.as_str()) {
            if !closing && caps[4].is_empty() {
                opaque = Some(name);
            }
            continue;
        }
        if !ALLOWED_TAGS.contains(&name.as_str()) {
            continue;
        }

        if closing {
            if name != "br" {
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
            continue;
        }

        out.push('<');
        out.push_str(&name);
        if let Some(class) = class_attribute(&caps[3]) {
            out.push_str(" class=\"");
            out.push_str(&class);
            out.push('"');
        }
        out.push('>');
    }
    if opaque.is_none() {
        push_text(&mut out, &prepared[last..]);
    }
    out
}

/// Escapes text for use inside element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
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

/// Plain-text glossary to markup: escaped, with line breaks kept.
pub fn text_to_html(text: &str) -> String {
    escape_html(text.trim_end_matches(['\n', '\r']))
        .replace("\r\n", "\n")
        .replace('\n', "<br>")
}

fn rewrite_legacy_markup(html: &str) -> String {
    TAG_RE
        .replace_all(html, |caps: &Captures| {
            let whole = &caps[0];
            let Some(name) = caps.get(2) else {
                return whole.to_string();
            };
            let name = name.as_str().to_ascii_lowercase();
            let legacy = LEGACY_ELEMENTS
                .iter()
                .find(|(element, _)| *element == name)
                .map(|(_, class)| *class);

            if !caps[1].is_empty() {
                return if legacy.is_some() {
                    "</span>".to_string()
                } else {
                    whole.to_string()
                };
            }

            let attrs = &caps[3];
            let style_classes = style_attribute(attrs)
                .map(|style| style_classes(&style))
                .unwrap_or_default();
            if legacy.is_none() && style_classes.is_empty() {
                return whole.to_string();
            }

            let mut classes: Vec<String> = class_attribute(attrs)
                .map(|c| c.split(' ').map(str::to_string).collect())
                .unwrap_or_default();
            for class in legacy.into_iter().chain(style_classes) {
                if !classes.iter().any(|c| c == class) {
                    classes.push(class.to_string());
                }
            }
            let tag = if legacy.is_some() { "span" } else { name.as_str() };
            let self_closing = if caps[4].is_empty() { "" } else { "/" };
            format!("<{} class=\"{}\"{}>", tag, classes.join(" "), self_closing)
        })
        .into_owned()
}

fn style_classes(style: &str) -> Vec<&'static str> {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    LEGACY_STYLES
        .iter()
        .filter(|(decl, _)| {
            compact
                .split(';')
                .any(|part| part.starts_with(decl))
        })
        .map(|(_, class)| *class)
        .collect()
}

/// Value of the attribute called `name`. Text inside another attribute's
/// quoted value is never read as a name.
fn attribute_value(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .map(|caps| {
            caps.get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or_else(String::new, |m| m.as_str().to_string())
        })
}

fn style_attribute(attrs: &str) -> Option<String> {
    attribute_value(attrs, "style")
}

/// The class list reduced to a safe alphabet with collapsed whitespace.
fn class_attribute(attrs: &str) -> Option<String> {
    let raw = attribute_value(attrs, "class")?;
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();
    let class = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (!class.is_empty()).then_some(class)
}

fn push_text(out: &mut String, text: &str) {
    for (i, c) in text.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if !ENTITY_RE.is_match(&text[i..]) => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_in(html: &str) -> Vec<String> {
        TAG_RE
            .captures_iter(html)
            .filter_map(|c| c.get(2).map(|m| m.as_str().to_ascii_lowercase()))
            .collect()
    }

    #[test]
    fn test_keeps_whitelisted_tags_and_class() {
        let out = sanitize(r#"<div class="gloss" id="x" onclick="evil()">to <b>run</b></div>"#);
        assert_eq!(out, r#"<div class="gloss">to <b>run</b></div>"#);
    }

    #[test]
    fn test_strips_unknown_tags_keeps_text() {
        let out = sanitize(r#"<a href="http://x">link</a> <img src="a.png"> <table><td>cell</td></table>"#);
        assert_eq!(out, "link  cell");
    }

    #[test]
    fn test_drops_script_content() {
        let out = sanitize("before<script>alert('x')</script>after<style>b{}</style>");
        assert_eq!(out, "beforeafter");
    }

    #[test]
    fn test_legacy_elements_become_spans() {
        let out = sanitize(r#"<k>word</k> <c c="red">n.</c> <font color="blue">x</font>"#);
        assert_eq!(
            out,
            r#"<span class="dict-k">word</span> <span class="dict-c">n.</span> <span class="dict-font">x</span>"#
        );
    }

    #[test]
    fn test_inline_style_becomes_class() {
        let out = sanitize(r#"<span style="font-weight: bold; color: #333">x</span>"#);
        assert_eq!(out, r#"<span class="dict-bold dict-color">x</span>"#);
    }

    #[test]
    fn test_escapes_stray_markup_and_ampersands() {
        let out = sanitize("a < b && c > d &amp; &#39; &nbsp;");
        assert_eq!(out, "a &lt; b &amp;&amp; c &gt; d &amp; &#39; &nbsp;");
    }

    #[test]
    fn test_br_normalized() {
        assert_eq!(sanitize("a<br/>b<BR>c</br>"), "a<br>b<br>c");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            r#"<div class="a&quot;b" style="font-style:italic">x &amp y</div>"#,
            "<k>a</k><script>x</script><p onclick=1>t</p> 1 < 2",
            r#"<c c="green">green</c><ex>example<br/></ex>"#,
            "plain & simple <unknown attr='1'>text</unknown>",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_class_only_from_class_attribute() {
        assert_eq!(sanitize(r#"<b style="x; class=evil y">t</b>"#), "<b>t</b>");
        assert_eq!(
            sanitize(r#"<span title='a class="no"' CLASS=yes>t</span>"#),
            r#"<span class="yes">t</span>"#
        );
        assert_eq!(
            sanitize(r#"<i data-x="class=a" class = "b">t</i>"#),
            r#"<i class="b">t</i>"#
        );
    }

    #[test]
    fn test_whitelist_holds() {
        let out = sanitize(
            r#"<iframe src=x></iframe><svg onload=1><a href=x>a</a></svg><i class="c" title="t">i</i>"#,
        );
        for tag in tags_in(&out) {
            assert!(ALLOWED_TAGS.contains(&tag.as_str()), "{tag} leaked");
        }
        assert!(!out.contains("title="));
        assert!(!out.contains("href"));
    }

    #[test]
    fn test_text_to_html() {
        assert_eq!(text_to_html("a<b\nline 2\n"), "a&lt;b<br>line 2");
    }
}
