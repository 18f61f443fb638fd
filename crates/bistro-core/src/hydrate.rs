//! Placeholder hydration: swaps `{name}` tokens for tenant channel values.
//!
//! Missing or empty keys render as a literal `-` so pre-authored copy never
//! leaks raw `{placeholder}` tokens to end users. Applied uniformly at
//! dispatch time; only text fragments are rewritten.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

use crate::response::{MessageFragment, ResolutionResult};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z][a-z0-9_]*)\}").expect("placeholder regex"));

/// Substitutes every `{name}` token with `channels[name]`; absent or empty
/// keys become `-`. Pure function.
pub fn hydrate_text(text: &str, channels: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            channels
                .get(&caps[1])
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or("-")
                .to_string()
        })
        .into_owned()
}

/// Hydrates a whole result: text fragments are rewritten, image fragments
/// pass through unchanged, buttons are untouched.
pub fn hydrate_result(
    result: ResolutionResult,
    channels: &BTreeMap<String, String>,
) -> ResolutionResult {
    let messages = result
        .messages
        .into_iter()
        .map(|m| match m {
            MessageFragment::Text { text } => MessageFragment::text(hydrate_text(&text, channels)),
            image @ MessageFragment::Image { .. } => image,
        })
        .collect();
    ResolutionResult::new(messages, result.buttons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels() -> BTreeMap<String, String> {
        [
            ("phone".to_string(), "+61 2 9000 0000".to_string()),
            ("email".to_string(), "  ".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn known_placeholder_is_substituted() {
        assert_eq!(
            hydrate_text("Call us at {phone}!", &channels()),
            "Call us at +61 2 9000 0000!"
        );
    }

    #[test]
    fn missing_and_empty_keys_become_dash() {
        assert_eq!(hydrate_text("Mail {email} or {fax}", &channels()), "Mail - or -");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        assert_eq!(hydrate_text("plain text", &channels()), "plain text");
    }

    #[test]
    fn image_fragments_pass_through() {
        let result = ResolutionResult::new(
            vec![
                MessageFragment::image("/a/{phone}.jpg", "alt"),
                MessageFragment::text("{phone}"),
            ],
            vec![],
        );
        let hydrated = hydrate_result(result, &channels());
        assert_eq!(
            hydrated.messages[0],
            MessageFragment::image("/a/{phone}.jpg", "alt")
        );
        assert_eq!(hydrated.messages[1], MessageFragment::text("+61 2 9000 0000"));
    }
}
