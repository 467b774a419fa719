//! Output content-safety filter
//!
//! Configuration values may be rendered by naive game-client UIs, so every
//! string leaving the public endpoint has executable markup stripped:
//! script-like elements, tags carrying inline event handlers and
//! `javascript:`/`vbscript:` schemes. Other text, including harmless markup
//! such as `<b>`, is left untouched.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

const BLOCK_ELEMENTS: [&str; 5] = ["script", "style", "iframe", "object", "embed"];

/// Element blocks whose whole content is dropped, e.g. `<script>...</script>`
static BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCK_ELEMENTS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

/// Unpaired opening or closing tags of dangerous elements
static DANGEROUS_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?\s*(script|style|iframe|object|embed|frame|frameset|applet|base|link|meta|svg)\b[^>]*>",
    )
    .unwrap()
});

/// Any tag carrying an inline event handler such as `onerror=`
static EVENT_HANDLER_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<[a-z][^>]*\son[a-z]+\s*=[^>]*>").unwrap());

static SCRIPT_SCHEME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(java|vb)script\s*:").unwrap());

/// Strip executable markup from a string
///
/// Stripping can splice fragments into new markup, so passes repeat until
/// the text is stable. Every pass that changes the text shortens it, which
/// bounds the loop by the input length. Returns the input borrowed when
/// nothing needed stripping.
pub fn sanitize_text(input: &str) -> Cow<'_, str> {
    if !looks_suspicious(input) {
        return Cow::Borrowed(input);
    }

    let mut current = input.to_string();

    loop {
        let next = strip_once(&current);

        if next == current {
            return Cow::Owned(current);
        }

        current = next;
    }
}

/// Sanitize every string inside a JSON value, object keys included
///
/// When two keys sanitize to the same text the first one in map order wins.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => match sanitize_text(&s) {
            Cow::Borrowed(_) => Value::String(s),
            Cow::Owned(clean) => Value::String(clean),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => {
            let mut cleaned = Map::with_capacity(map.len());

            for (key, value) in map {
                let clean_key = sanitize_text(&key).into_owned();

                if cleaned.contains_key(&clean_key) {
                    warn!(key = %clean_key, "Dropping object entry whose sanitized key collides");
                    continue;
                }

                cleaned.insert(clean_key, sanitize_value(value));
            }

            Value::Object(cleaned)
        }
        other => other,
    }
}

fn looks_suspicious(input: &str) -> bool {
    input.contains('<') || SCRIPT_SCHEME_PATTERN.is_match(input)
}

fn strip_once(input: &str) -> String {
    let mut out = input.to_string();

    for pattern in BLOCK_PATTERNS.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }

    out = DANGEROUS_TAG_PATTERN.replace_all(&out, "").into_owned();
    out = EVENT_HANDLER_TAG_PATTERN.replace_all(&out, "").into_owned();
    SCRIPT_SCHEME_PATTERN.replace_all(&out, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_untouched() {
        assert!(matches!(sanitize_text("hello"), Cow::Borrowed("hello")));
        assert_eq!(sanitize_text("a < b and c > d"), "a < b and c > d");
        assert_eq!(sanitize_text("<b>bold</b>"), "<b>bold</b>");
    }

    #[test]
    fn test_script_block_removed() {
        assert_eq!(
            sanitize_text("Welcome<script>alert('x')</script>!"),
            "Welcome!"
        );
        assert_eq!(
            sanitize_text("a<SCRIPT type=\"text/javascript\">\nsteal()\n</ScRiPt >b"),
            "ab"
        );
    }

    #[test]
    fn test_unpaired_tags_removed() {
        assert_eq!(sanitize_text("x<iframe src=\"evil\">y"), "xy");
        assert_eq!(sanitize_text("<meta http-equiv=\"refresh\">hi"), "hi");
    }

    #[test]
    fn test_event_handlers_removed() {
        assert_eq!(sanitize_text("<img src=x onerror=alert(1)>pic"), "pic");
        assert_eq!(sanitize_text("<a href=\"/\" onclick='go()'>link</a>"), "link</a>");
    }

    #[test]
    fn test_script_scheme_removed() {
        assert_eq!(sanitize_text("javascript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_text("JaVaScRiPt :void(0)"), "void(0)");
    }

    #[test]
    fn test_spliced_markup_removed() {
        assert_eq!(sanitize_text("<scr<script></script>ipt>alert(1)"), "alert(1)");
    }

    #[test]
    fn test_deeply_spliced_markup_removed() {
        let mut input = "<script></script>".to_string();
        for _ in 0..40 {
            input = format!("<scr{}ipt>", input);
        }
        input.push_str("alert(1)</script>");

        let out = sanitize_text(&input);
        assert!(!out.to_lowercase().contains("<script"));
        assert_eq!(out, "alert(1)");
    }

    #[test]
    fn test_colliding_object_keys_keep_first() {
        let value = json!({
            "<b>": "bold",
            "<b><script>x</script>": "spliced",
            "plain": 1
        });

        assert_eq!(sanitize_value(value), json!({"<b>": "bold", "plain": 1}));
    }

    #[test]
    fn test_sanitize_nested_values() {
        let value = json!({
            "title": "<script>x</script>Arena",
            "tips": ["ok", "<iframe>"],
            "count": 3
        });

        assert_eq!(
            sanitize_value(value),
            json!({"title": "Arena", "tips": ["ok", ""], "count": 3})
        );
    }
}
