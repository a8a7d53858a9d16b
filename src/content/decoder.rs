//! Data URI decoding.
//!
//! `decode` never fails: every problem becomes an unsupported descriptor whose
//! payload names what went wrong. The `;base64` marker alone selects base64
//! versus percent-decoding.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use thiserror::Error;

use crate::content::types::{ContentKind, DecodedContent};
use crate::observability::metrics;

/// Tolerates missing padding and non-zero trailing bits, as browsers do.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Injected into HTML documents so they center and scale inside a frame.
const CENTERING_STYLE: &str = r#"
            <style>
              html, body {
                margin: 0;
                padding: 0;
                display: flex;
                justify-content: center;
                align-items: center;
                min-height: 100vh;
                width: 100%;
                background: none;
              }
              body > * {
                margin: 0 auto;
                max-width: 100%;
              }
            </style>
          "#;

const NO_DATA_URI: &str = "No Data URI";
const INVALID_DATA_URI: &str = "Invalid Data URI";
const HTML_ERROR: &str = "Error processing HTML content";
const JSON_ERROR: &str = "Error parsing JSON";
const TEXT_ERROR: &str = "Error decoding text";

#[derive(Debug, Error)]
enum PayloadError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("malformed percent escape")]
    MalformedEscape,
    #[error("percent-decoded bytes are not UTF-8")]
    Utf8,
}

/// Structural pieces of `data:<mime>[;params],<data>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DataUri<'a> {
    mime_type: &'a str,
    is_base64: bool,
    data: &'a str,
}

impl<'a> DataUri<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let rest = raw.strip_prefix("data:")?;
        let (head, data) = rest.split_once(',')?;
        // The body is a single line; embedded line breaks mean a broken URI.
        if data.contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
            return None;
        }

        let (mime_type, params) = match head.split_once(';') {
            Some((mime, params)) => (mime, Some(params)),
            None => (head, None),
        };

        Some(Self {
            mime_type,
            is_base64: params.is_some_and(|p| p.contains("base64")),
            data,
        })
    }

    fn body(&self) -> Result<String, PayloadError> {
        if self.is_base64 {
            decode_base64(self.data)
        } else {
            decode_percent(self.data)
        }
    }

    fn to_uri(&self) -> String {
        format!(
            "data:{}{},{}",
            self.mime_type,
            if self.is_base64 { ";base64" } else { "" },
            self.data
        )
    }
}

/// Decode a raw inscription payload into renderable content.
pub fn decode(raw: &str) -> DecodedContent {
    let content = decode_raw(raw);
    metrics::record_decode(content.kind.as_str());
    content
}

fn decode_raw(raw: &str) -> DecodedContent {
    if raw.is_empty() {
        return DecodedContent::unsupported("", NO_DATA_URI);
    }
    if raw.starts_with("https://") {
        return DecodedContent::new(ContentKind::Url, "", raw);
    }

    let Some(uri) = DataUri::parse(raw) else {
        return DecodedContent::unsupported("", INVALID_DATA_URI);
    };
    let mime_type = uri.mime_type;

    match ContentKind::from_mime(mime_type) {
        kind @ (ContentKind::Image | ContentKind::Video) => {
            DecodedContent::new(kind, mime_type, uri.to_uri())
        }
        ContentKind::Html => match uri.body() {
            Ok(html) => DecodedContent::new(ContentKind::Html, mime_type, inject_centering(&html)),
            Err(e) => {
                tracing::debug!(error = %e, mime_type, "HTML payload failed to decode");
                DecodedContent::unsupported(mime_type, HTML_ERROR)
            }
        },
        ContentKind::Json => {
            let pretty = uri.body().ok().and_then(|body| {
                let mut value: serde_json::Value = serde_json::from_str(&body).ok()?;
                integral_floats_as_integers(&mut value);
                serde_json::to_string_pretty(&value).ok()
            });
            match pretty {
                Some(json) => DecodedContent::new(ContentKind::Json, mime_type, json),
                None => DecodedContent::unsupported(mime_type, JSON_ERROR),
            }
        }
        ContentKind::Text => match uri.body() {
            Ok(text) => DecodedContent::new(ContentKind::Text, mime_type, text),
            Err(e) => {
                tracing::debug!(error = %e, mime_type, "Text payload failed to decode");
                DecodedContent::unsupported(mime_type, TEXT_ERROR)
            }
        },
        ContentKind::Url | ContentKind::Unsupported => DecodedContent::unsupported(
            mime_type,
            format!("Unsupported MIME type: {}", mime_type),
        ),
    }
}

/// Rewrites floats with an exact integral value (`1.0`, `1e2`) as integers,
/// so they print the way a browser's JSON serializer would.
fn integral_floats_as_integers(value: &mut serde_json::Value) {
    let integral = match value {
        serde_json::Value::Number(number) if number.is_f64() => number.as_f64(),
        serde_json::Value::Array(items) => {
            items.iter_mut().for_each(integral_floats_as_integers);
            None
        }
        serde_json::Value::Object(map) => {
            map.values_mut().for_each(integral_floats_as_integers);
            None
        }
        _ => None,
    };
    let Some(float) = integral.filter(|float| float.fract() == 0.0) else {
        return;
    };
    if float >= i64::MIN as f64 && float < i64::MAX as f64 {
        *value = serde_json::Value::from(float as i64);
    } else if float >= 0.0 && float < u64::MAX as f64 {
        *value = serde_json::Value::from(float as u64);
    }
}

fn inject_centering(html: &str) -> String {
    if html.contains("</head>") {
        html.replacen("</head>", &format!("{}</head>", CENTERING_STYLE), 1)
    } else {
        format!("<head>{}</head>{}", CENTERING_STYLE, html)
    }
}

fn decode_base64(data: &str) -> Result<String, PayloadError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = LENIENT_BASE64.decode(compact)?;
    // Non-UTF-8 bodies keep one char per byte rather than failing.
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    })
}

fn decode_percent(data: &str) -> Result<String, PayloadError> {
    let well_formed = data.match_indices('%').all(|(i, _)| {
        data.get(i + 1..i + 3)
            .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if !well_formed {
        return Err(PayloadError::MalformedEscape);
    }

    urlencoding::decode(data)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| PayloadError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            decode("data:text/plain,hello"),
            DecodedContent::new(ContentKind::Text, "text/plain", "hello")
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode(""), DecodedContent::unsupported("", "No Data URI"));
    }

    #[test]
    fn test_https_url_passes_through() {
        let content = decode("https://example.com/a.png");
        assert_eq!(content.kind, ContentKind::Url);
        assert_eq!(content.mime_type, "");
        assert_eq!(content.payload, "https://example.com/a.png");
    }

    #[test]
    fn test_non_data_uri_is_invalid() {
        for raw in ["http://example.com", "hello", "data:text/plain", "DATA:text/plain,x"] {
            assert_eq!(decode(raw), DecodedContent::unsupported("", "Invalid Data URI"), "{raw}");
        }
    }

    #[test]
    fn test_empty_mime_is_text() {
        let content = decode("data:,hi%20there");
        assert_eq!(content.kind, ContentKind::Text);
        assert_eq!(content.payload, "hi there");
    }

    #[test]
    fn test_base64_text_with_params() {
        let content = decode("data:text/plain;charset=utf-8;base64,aGVsbG8gd29ybGQ");
        assert_eq!(content.kind, ContentKind::Text);
        assert_eq!(content.mime_type, "text/plain");
        assert_eq!(content.payload, "hello world");
    }

    #[test]
    fn test_base64_marker_is_authoritative() {
        // Looks like base64 but has no marker: percent-decoded verbatim.
        let content = decode("data:text/plain,aGVsbG8=");
        assert_eq!(content.payload, "aGVsbG8=");
    }

    #[test]
    fn test_bad_text_encodings() {
        assert_eq!(
            decode("data:text/plain;base64,@@@"),
            DecodedContent::unsupported("text/plain", "Error decoding text")
        );
        assert_eq!(
            decode("data:text/plain,100%"),
            DecodedContent::unsupported("text/plain", "Error decoding text")
        );
        assert_eq!(
            decode("data:text/plain,%ff"),
            DecodedContent::unsupported("text/plain", "Error decoding text")
        );
    }

    #[test]
    fn test_unknown_mime_types_are_unsupported() {
        for mime in ["application/pdf", "text/css", "image/avif", "audio/mpeg", "x"] {
            let content = decode(&format!("data:{mime};base64,AAAA"));
            assert_eq!(content.kind, ContentKind::Unsupported);
            assert_eq!(content.mime_type, mime);
            assert_eq!(content.payload, format!("Unsupported MIME type: {mime}"));
        }
    }

    #[test]
    fn test_image_reemitted_without_extra_params() {
        let content = decode("data:image/png;foo=bar;base64,iVBORw0KGgo=");
        assert_eq!(content.kind, ContentKind::Image);
        assert_eq!(content.payload, "data:image/png;base64,iVBORw0KGgo=");

        let svg = decode("data:image/svg+xml,%3Csvg%3E%3C/svg%3E");
        assert_eq!(svg.payload, "data:image/svg+xml,%3Csvg%3E%3C/svg%3E");
    }

    #[test]
    fn test_image_and_video_decoding_is_idempotent() {
        for raw in [
            "data:image/gif;base64,R0lGODlhAQABAAAAACw=",
            "data:video/mp4;base64,AAAAIGZ0eXA=",
            "data:image/svg+xml;utf8,<svg/>",
        ] {
            let first = decode(raw);
            let second = decode(&first.payload);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_json_is_pretty_printed_in_source_order() {
        let content = decode(r#"data:application/json,{"p":"erc-20","op":"mint","amt":[1,2]}"#);
        assert_eq!(content.kind, ContentKind::Json);
        assert_eq!(
            content.payload,
            "{\n  \"p\": \"erc-20\",\n  \"op\": \"mint\",\n  \"amt\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_json_integral_floats_print_as_integers() {
        let content = decode(r#"data:application/json,{"a":1.0,"b":1e2,"c":1.5,"d":[-0.0,2.50]}"#);
        assert_eq!(content.kind, ContentKind::Json);
        assert_eq!(
            content.payload,
            "{\n  \"a\": 1,\n  \"b\": 100,\n  \"c\": 1.5,\n  \"d\": [\n    0,\n    2.5\n  ]\n}"
        );
    }

    #[test]
    fn test_invalid_json_is_unsupported() {
        assert_eq!(
            decode("data:application/json,{not json"),
            DecodedContent::unsupported("application/json", "Error parsing JSON")
        );
    }

    #[test]
    fn test_html_style_injected_before_head_close() {
        let content = decode("data:text/html,%3Chtml%3E%3Chead%3E%3C/head%3E%3Cbody%3Ehi%3C/body%3E%3C/html%3E");
        assert_eq!(content.kind, ContentKind::Html);
        let style_at = content.payload.find("<style>").unwrap();
        let head_close = content.payload.find("</head>").unwrap();
        assert!(style_at < head_close);
        assert!(content.payload.ends_with("<body>hi</body></html>"));
    }

    #[test]
    fn test_html_without_head_gets_one() {
        // "<p>x</p>" in base64
        let content = decode("data:text/html;base64,PHA+eDwvcD4=");
        assert!(content.payload.starts_with("<head>"));
        assert!(content.payload.ends_with("</head><p>x</p>"));
    }

    #[test]
    fn test_multiline_body_is_invalid() {
        assert_eq!(decode("data:text/plain,a\nb").payload, "Invalid Data URI");
    }
}
