//! Response normalization and error translation.
//!
//! # Design
//! The service signals failures with a status code and a free-text
//! `message`. `translate` pattern-matches the few messages that have a
//! documented meaning and leaves everything else as `ApiError::Http`, so
//! callers never depend on wording beyond those matches. `normalize` never
//! fails: a body that is not JSON comes back as the raw bytes.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::http::HttpResponse;

/// A response body, decoded as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(Vec<u8>),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// The JSON value, or a deserialization error for a raw body.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Raw(raw) => Err(ApiError::Deserialization(format!(
                "expected JSON, got: {}",
                String::from_utf8_lossy(&raw)
            ))),
        }
    }

    /// Deserialize the field `key` of a JSON object body.
    pub fn field<T: DeserializeOwned>(self, key: &str) -> Result<T> {
        let mut value = self.into_json()?;
        let field = value
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| ApiError::Deserialization(format!("missing field `{key}`")))?;
        serde_json::from_value(field).map_err(ApiError::deserialization)
    }
}

/// Decode a body as JSON, handing back the original bytes on failure.
pub fn normalize(body: Vec<u8>) -> Payload {
    match serde_json::from_slice(&body) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Raw(body),
    }
}

/// Pass a 2xx response through; map every other status to an `ApiError`.
pub fn translate(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let message = server_message(&response.body);
    let message = message.as_deref();
    let status = response.status;
    let fallback = || message.unwrap_or_default().to_string();

    let err = match (status, message) {
        (413, _) => ApiError::TooLarge("requested files are too large".to_string()),
        (401, Some("Unauthorized")) => ApiError::BadCredentials("token is invalid".to_string()),
        (400, Some(m)) if m.starts_with("The mimetype") => ApiError::InvalidMediaType(fallback()),
        (400, Some("Tags existed already or had no content")) => ApiError::DuplicateTag(fallback()),
        (400, Some("This image is private")) => ApiError::PrivateResource(fallback()),
        (400, Some("No image found for your query")) => ApiError::ResourceNotFound(fallback()),
        (403, Some(m)) if m.starts_with("missing scope") => {
            ApiError::InsufficientPermission(fallback())
        }
        (500, _) => ApiError::ServerFailure("server error".to_string()),
        _ => ApiError::Http {
            status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        },
    };
    debug!(status, error = %err, "request failed");
    Err(err)
}

/// The `message` field of a JSON object body, if present.
fn server_message(body: &[u8]) -> Option<String> {
    match normalize(body.to_vec()) {
        Payload::Json(Value::Object(mut map)) => match map.remove("message") {
            Some(Value::String(message)) => Some(message),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn normalize_decodes_json() {
        let payload = normalize(br#"{"status":200,"types":["hug","pat"]}"#.to_vec());
        assert_eq!(payload, Payload::Json(json!({"status": 200, "types": ["hug", "pat"]})));
    }

    #[test]
    fn normalize_passes_non_json_through() {
        let raw = b"\x89PNG\r\n\x1a\n not json".to_vec();
        assert_eq!(normalize(raw.clone()), Payload::Raw(raw));
        assert_eq!(normalize(Vec::new()), Payload::Raw(Vec::new()));
    }

    #[test]
    fn success_is_passed_through() {
        let resp = translate(response(200, "{}")).unwrap();
        assert_eq!(resp.status, 200);
    }

    #[test]
    fn too_large_ignores_body() {
        let err = translate(response(413, "<html>nginx</html>")).unwrap_err();
        assert!(matches!(err, ApiError::TooLarge(_)));
    }

    #[test]
    fn unauthorized_message_is_bad_credentials() {
        let err = translate(response(401, r#"{"message":"Unauthorized"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::BadCredentials(_)));
    }

    #[test]
    fn other_unauthorized_is_untranslated() {
        let err = translate(response(401, r#"{"message":"Token expired"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 401, .. }));
    }

    #[test]
    fn private_image_message_is_private_resource() {
        let err = translate(response(400, r#"{"message":"This image is private"}"#)).unwrap_err();
        match err {
            ApiError::PrivateResource(message) => assert_eq!(message, "This image is private"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mimetype_prefix_is_invalid_media_type() {
        let body = r#"{"message":"The mimetype application/pdf is not supported"}"#;
        let err = translate(response(400, body)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidMediaType(_)));
    }

    #[test]
    fn unknown_bad_request_keeps_body() {
        let body = r#"{"message":"Something else"}"#;
        match translate(response(400, body)).unwrap_err() {
            ApiError::Http { status, body: b } => {
                assert_eq!(status, 400);
                assert_eq!(b, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_scope_prefix_is_insufficient_permission() {
        let body = r#"{"message":"missing scope toph:upload"}"#;
        let err = translate(response(403, body)).unwrap_err();
        assert!(matches!(err, ApiError::InsufficientPermission(_)));

        let err = translate(response(403, r#"{"message":"banned"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 403, .. }));
    }

    #[test]
    fn server_error_is_server_failure() {
        let err = translate(response(500, "oops")).unwrap_err();
        assert!(matches!(err, ApiError::ServerFailure(_)));
    }

    #[test]
    fn field_extracts_nested_value() {
        let payload = Payload::Json(json!({"status": 200, "tags": ["a", "b"]}));
        let tags: Vec<String> = payload.field("tags").unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let err = Payload::Json(json!({})).field::<Vec<String>>("tags").unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
