//! Decoded content descriptors.

use serde::{Deserialize, Serialize};

/// Coarse content bucket. Derived only from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Video,
    /// Markup with the centering style block injected; safe to render as-is.
    Html,
    Json,
    Text,
    Url,
    Unsupported,
}

impl ContentKind {
    /// Map a MIME type to its bucket. Unknown types are [`ContentKind::Unsupported`];
    /// the empty MIME type is plain text.
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            "" | "text/plain" => ContentKind::Text,
            "text/html" => ContentKind::Html,
            "application/json" | "message/vnd.tic+json" => ContentKind::Json,
            "image/png" | "image/svg+xml" | "image/jpg" | "image/jpeg" | "image/webp"
            | "image/gif" => ContentKind::Image,
            "video/mp4" | "video/webm" => ContentKind::Video,
            _ => ContentKind::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Html => "html",
            ContentKind::Json => "json",
            ContentKind::Text => "text",
            ContentKind::Url => "url",
            ContentKind::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A renderable piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedContent {
    pub kind: ContentKind,
    /// MIME type as written in the data URI; empty for URLs and unparseable input.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Data URI (image/video), decoded body (html/json/text), the URL itself,
    /// or a diagnostic message when `kind` is unsupported.
    pub payload: String,
}

impl DecodedContent {
    pub fn new(kind: ContentKind, mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind,
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn unsupported(mime_type: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::new(ContentKind::Unsupported, mime_type, diagnostic)
    }

    pub fn is_supported(&self) -> bool {
        self.kind != ContentKind::Unsupported
    }
}
