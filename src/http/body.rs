//! Request body encoding and response body parsing
//!
//! Pure helpers kept apart from the client so they can be unit tested
//! without a server.

use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use super::types::{Body, ResponseBody};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Whether a Content-Type value denotes JSON
///
/// Accepts `application/json`, parameters such as `charset`, and structured
/// suffixes like `application/problem+json`. Malformed values are not JSON.
pub fn is_json_media_type(content_type: &str) -> bool {
    let Ok(media_type) = content_type.parse::<mime::Mime>() else {
        return false;
    };

    media_type.type_() == mime::APPLICATION
        && (media_type.subtype() == mime::JSON || media_type.suffix() == Some(mime::JSON))
}

/// Encoded request body and whether it should be labelled as JSON
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub is_json: bool,
}

/// Encode an outgoing body; text that parses as JSON is treated as JSON
pub fn encode_body(body: Body) -> EncodedBody {
    match body {
        Body::Json(value) => EncodedBody {
            bytes: Bytes::from(value.to_string()),
            is_json: true,
        },
        Body::Text(text) => {
            let is_json = serde_json::from_str::<Value>(&text).is_ok();
            EncodedBody {
                bytes: Bytes::from(text),
                is_json,
            }
        }
    }
}

/// Parse a response body: JSON when it parses, raw text otherwise
///
/// Parse failures are never surfaced.
pub fn parse_body(raw: &[u8]) -> ResponseBody {
    let text = String::from_utf8_lossy(raw).into_owned();
    if text.trim().is_empty() {
        return ResponseBody::Text(text);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => ResponseBody::Json(value),
        Err(e) => {
            debug!(error = %e, size = raw.len(), "Response body is not JSON, keeping text");
            ResponseBody::Text(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("text/json"));
        assert!(!is_json_media_type("application/jsonp"));
        assert!(!is_json_media_type("invalid"));
        assert!(!is_json_media_type(""));
    }

    #[test]
    fn test_parse_body_json() {
        assert_eq!(parse_body(b"{\"k\":1}"), ResponseBody::Json(json!({"k": 1})));
        assert_eq!(parse_body(b"[1, 2]"), ResponseBody::Json(json!([1, 2])));
    }

    #[test]
    fn test_parse_body_falls_back_to_text() {
        assert_eq!(
            parse_body(b"not json"),
            ResponseBody::Text("not json".to_string())
        );
        assert_eq!(parse_body(b"{\"k\":"), ResponseBody::Text("{\"k\":".to_string()));
        assert_eq!(parse_body(b""), ResponseBody::Text(String::new()));
    }

    #[test]
    fn test_encode_text_that_is_json() {
        let encoded = encode_body(Body::Text("{\"a\": [1]}".to_string()));
        assert!(encoded.is_json);
        assert_eq!(&encoded.bytes[..], b"{\"a\": [1]}");
    }

    #[test]
    fn test_encode_plain_text() {
        let encoded = encode_body(Body::Text("hello there".to_string()));
        assert!(!encoded.is_json);
        assert_eq!(&encoded.bytes[..], b"hello there");
    }

    #[test]
    fn test_encode_json_value() {
        let encoded = encode_body(Body::Json(json!({"k": 1})));
        assert!(encoded.is_json);
        assert_eq!(&encoded.bytes[..], b"{\"k\":1}");
    }
}
