//! Response envelope normalization
//!
//! The backend answers either with `{ success, data?, error?, message? }` or
//! with the payload as the bare body. Both collapse to "payload" or a
//! structured [`ApiError`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::RawResponse;
use crate::error::ApiError;

/// Extract the payload from a successful (2xx) response body
pub fn unwrap_payload(status: u16, body: &str) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Response is not JSON: {}", e)))?;

    match value {
        Value::Object(mut map) => match map.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(match map.remove("data") {
                Some(data) => data,
                None => {
                    map.remove("success");
                    Value::Object(map)
                }
            }),
            Some(false) => Err(ApiError::Server {
                status,
                message: message_from(&Value::Object(map))
                    .unwrap_or_else(|| "Request failed".to_string()),
            }),
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

/// Decode a successful response into `T`
pub fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T, ApiError> {
    let payload = unwrap_payload(response.status, &response.body)?;
    serde_json::from_value(payload)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// Human-readable message for an error response
///
/// Prefers the JSON `error` or `message` field, then the raw body text, then
/// the status reason phrase.
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(message) = message_from(&value)
    {
        return message;
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

fn message_from(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|field| value.get(field).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_yields_data() {
        let payload =
            unwrap_payload(200, r#"{"success":true,"data":{"taskId":"t1"},"message":"ok"}"#)
                .unwrap();
        assert_eq!(payload, json!({"taskId": "t1"}));
    }

    #[test]
    fn test_success_envelope_without_data_yields_rest() {
        let payload =
            unwrap_payload(200, r#"{"success":true,"taskId":"t1","message":"queued"}"#).unwrap();
        assert_eq!(payload, json!({"taskId": "t1", "message": "queued"}));
    }

    #[test]
    fn test_bare_body_passes_through() {
        let payload = unwrap_payload(200, r#"{"taskId":"t1","status":"processing"}"#).unwrap();
        assert_eq!(payload["status"], "processing");
    }

    #[test]
    fn test_failed_envelope_is_server_error() {
        let err = unwrap_payload(200, r#"{"success":false,"error":"Quota exceeded"}"#).unwrap_err();
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failed_envelope_falls_back_to_message_then_default() {
        let err = unwrap_payload(200, r#"{"success":false,"message":"Try later"}"#).unwrap_err();
        assert!(err.to_string().contains("Try later"));

        let err = unwrap_payload(200, r#"{"success":false}"#).unwrap_err();
        assert!(err.to_string().contains("Request failed"));
    }

    #[test]
    fn test_non_json_success_is_invalid_response() {
        let err = unwrap_payload(200, "<html>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(unwrap_payload(204, "").unwrap(), Value::Null);
    }

    #[test]
    fn test_error_message_sources() {
        assert_eq!(
            error_message(400, r#"{"error":"file is required"}"#),
            "file is required"
        );
        assert_eq!(
            error_message(400, r#"{"message":"bad grade hint"}"#),
            "bad grade hint"
        );
        assert_eq!(error_message(502, "upstream down\n"), "upstream down");
        assert_eq!(error_message(404, ""), "Not Found");
    }

    #[test]
    fn test_decode_typed() {
        #[derive(serde::Deserialize)]
        struct Submit {
            #[serde(rename = "taskId")]
            task_id: String,
        }

        let response = RawResponse {
            status: 200,
            body: r#"{"success":true,"data":{"taskId":"t7"}}"#.to_string(),
            retry_after: None,
        };
        let submit: Submit = decode(&response).unwrap();
        assert_eq!(submit.task_id, "t7");
    }
}
