//! Response shaping shared by every endpoint: envelope unwrapping, error
//! message extraction and status classification.

use domains::ApiError;
use serde_json::Value;
use tracing::{error, warn};

/// Returns the `data` member of a `{ "data": ... }` envelope, or the body
/// itself when it is not enveloped.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Best human-readable message of an error body: `message`, then `error`,
/// then `fallback`.
pub fn extract_message(body: &str, fallback: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    };
    field("message")
        .or_else(|| field("error"))
        .unwrap_or_else(|| fallback.to_string())
}

/// Maps a non-success status and its body onto [`ApiError`].
pub fn classify_status(status: u16, body: &str, reason: Option<&str>) -> ApiError {
    let fallback = reason
        .map(|r| format!("{status} {r}"))
        .unwrap_or_else(|| format!("HTTP {status}"));
    let message = extract_message(body, &fallback);
    match status {
        401 => {
            warn!(%message, "unauthorized");
            ApiError::Unauthorized(message)
        }
        500..=599 => {
            error!(status, %message, "server error");
            ApiError::Server { status, message }
        }
        _ => ApiError::Rejected { status, message },
    }
}

/// A request that never produced a usable response.
pub fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::InvalidResponse(err.to_string());
    }
    error!(error = %err, timeout = err.is_timeout(), "no response from server");
    ApiError::Connectivity(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enveloped_and_bare_bodies_yield_same_payload() {
        let payload = json!({ "id": 1, "title": "Vinland Saga" });
        assert_eq!(unwrap_envelope(json!({ "data": payload.clone() })), payload);
        assert_eq!(unwrap_envelope(payload.clone()), payload);
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn message_preference_order() {
        let both = r#"{"message":"Title taken","error":"Conflict"}"#;
        assert_eq!(extract_message(both, "409"), "Title taken");
        assert_eq!(extract_message(r#"{"error":"Forbidden"}"#, "403"), "Forbidden");
        assert_eq!(extract_message("<html>oops</html>", "502 Bad Gateway"), "502 Bad Gateway");
        assert_eq!(extract_message(r#"{"message":"  "}"#, "fallback"), "fallback");
    }

    #[test]
    fn statuses_are_classified() {
        assert!(matches!(
            classify_status(401, "", Some("Unauthorized")),
            ApiError::Unauthorized(m) if m == "401 Unauthorized"
        ));
        assert_eq!(
            classify_status(503, r#"{"message":"maintenance"}"#, None),
            ApiError::Server { status: 503, message: "maintenance".into() }
        );
        let not_found = classify_status(404, r#"{"error":"Post not found"}"#, Some("Not Found"));
        assert!(not_found.is_not_found());
        assert_eq!(not_found.user_message(), "Post not found");
    }
}
