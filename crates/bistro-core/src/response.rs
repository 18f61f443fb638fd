//! Typed chat response model: message fragments, suggested buttons, and
//! pre-authored canned blocks.

use serde::{Deserialize, Serialize};

/// One message bubble. Wire shape is `{"type":"text","text":...}` or
/// `{"type":"image","url":...,"alt":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageFragment {
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: String,
    },
}

impl MessageFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::Image {
            url: url.into(),
            alt: alt.into(),
        }
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Suggested quick-reply button; `intent` feeds back into the pipeline on click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub intent: String,
}

impl Button {
    pub fn new(label: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            intent: intent.into(),
        }
    }
}

/// The pipeline's only output artifact: ordered fragments plus buttons.
/// Canonical renderings end on a text fragment when possible so buttons
/// visually attach to prose rather than to an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub messages: Vec<MessageFragment>,
    pub buttons: Vec<Button>,
}

impl ResolutionResult {
    pub fn new(messages: Vec<MessageFragment>, buttons: Vec<Button>) -> Self {
        Self { messages, buttons }
    }

    pub fn single_text(text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Self {
            messages: vec![MessageFragment::text(text)],
            buttons,
        }
    }

    /// First text bubble, used for the legacy `reply` response field.
    pub fn first_text(&self) -> &str {
        self.messages
            .iter()
            .find_map(|m| m.as_text())
            .unwrap_or("")
    }
}

/// Pre-authored response block keyed by intent name. Supports both the
/// legacy `{"reply": "..."}` shape and the newer `{"messages": [...]}` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CannedResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub messages: Vec<MessageFragment>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl CannedResponse {
    /// Normalizes both authoring shapes into fragments; an explicit
    /// `messages` list wins over the legacy `reply` string.
    pub fn to_result(&self) -> ResolutionResult {
        let messages = if !self.messages.is_empty() {
            self.messages.clone()
        } else if !self.reply.trim().is_empty() {
            vec![MessageFragment::text(self.reply.clone())]
        } else {
            Vec::new()
        };
        ResolutionResult::new(messages, self.buttons.clone())
    }
}
