//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Map a failed chat completion response to a classified [`ProviderError`]
pub fn map_http_error(
    status: StatusCode,
    body: Option<String>,
    retry_after: Option<Duration>,
    request_id: Uuid,
) -> ProviderError {
    let error_message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or_else(|| body.clone().filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    let message = format!("{} [request_id: {}]", error_message, request_id);

    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => ProviderError::InvalidRequest(message),

        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(message),

        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout(message),

        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit {
            message,
            retry_after,
        },

        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            ProviderError::ServiceUnavailable(message)
        }

        status if status.is_server_error() => ProviderError::Api(message),

        _ => ProviderError::Status {
            status: status.as_u16(),
            body: body.unwrap_or_default(),
        },
    }
}

/// Pull the human-readable message out of a JSON error body
fn extract_error_message(json: &Value) -> Option<String> {
    // { "error": { "message": "...", "type": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    json.get("error").and_then(Value::as_str).map(str::to_string)
}

/// Parse a Retry-After header value given in seconds
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    header_value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(400, "InvalidRequestError" ; "bad request")]
    #[test_case(404, "InvalidRequestError" ; "not found")]
    #[test_case(401, "AuthenticationError" ; "unauthorized")]
    #[test_case(408, "Timeout" ; "request timeout")]
    #[test_case(429, "RateLimitError" ; "rate limited")]
    #[test_case(500, "APIError" ; "internal error")]
    #[test_case(503, "ServiceUnavailableError" ; "unavailable")]
    #[test_case(418, "APIStatusError" ; "unclassified")]
    fn test_status_classification(status: u16, kind: &str) {
        let err = map_http_error(
            StatusCode::from_u16(status).unwrap(),
            None,
            None,
            Uuid::new_v4(),
        );
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn test_error_message_extracted_from_body() {
        let body = r#"{"error": {"message": "context too long", "type": "invalid_request_error"}}"#;
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            Some(body.to_string()),
            None,
            Uuid::nil(),
        );
        match err {
            ProviderError::InvalidRequest(message) => {
                assert!(message.starts_with("context too long"));
                assert!(message.contains(&Uuid::nil().to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_keeps_retry_after() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            None,
            parse_retry_after("2"),
            Uuid::new_v4(),
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
