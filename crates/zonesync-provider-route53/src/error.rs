//! Mapping of Route 53 HTTP failures onto zonesync errors

use reqwest::StatusCode;
use zonesync_core::Error;

use crate::PROVIDER_NAME;
use crate::types::ErrorResponse;

/// Error codes Route 53 reports with a 400 that clear up on their own
const TRANSIENT_CODES: &[&str] = &["Throttling", "PriorRequestNotComplete"];

pub(crate) fn transport(err: reqwest::Error) -> Error {
    Error::unavailable(PROVIDER_NAME, format!("HTTP request failed: {}", err))
}

pub(crate) fn malformed(what: &str, err: impl std::fmt::Display) -> Error {
    Error::unavailable(
        PROVIDER_NAME,
        format!("Failed to parse {} response: {}", what, err),
    )
}

/// Map a non-success response to an error
///
/// Authentication, throttling and server errors are `ProviderUnavailable`;
/// any other client error is `ProviderRejected` with Route 53's own
/// `Code: Message` text.
pub(crate) fn from_status(status: StatusCode, body: &str) -> Error {
    let detail = quick_xml::de::from_str::<ErrorResponse>(body)
        .ok()
        .map(|resp| resp.error)
        .filter(|e| !e.code.is_empty());

    let described = match &detail {
        Some(e) => format!("{}: {}", e.code, e.message),
        None => format!("HTTP {}", status.as_u16()),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::unavailable(
            PROVIDER_NAME,
            format!("Authentication failed ({})", described),
        ),
        StatusCode::TOO_MANY_REQUESTS => Error::unavailable(
            PROVIDER_NAME,
            format!("Rate limit exceeded ({})", described),
        ),
        s if s.is_server_error() => {
            Error::unavailable(PROVIDER_NAME, format!("Server error ({})", described))
        }
        _ if detail
            .as_ref()
            .is_some_and(|e| TRANSIENT_CODES.contains(&e.code.as_str())) =>
        {
            Error::unavailable(PROVIDER_NAME, described)
        }
        _ => Error::rejected(PROVIDER_NAME, described),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(code: &str, message: &str) -> String {
        format!(
            "<ErrorResponse><Error><Type>Sender</Type><Code>{}</Code><Message>{}</Message></Error></ErrorResponse>",
            code, message
        )
    }

    #[test]
    fn test_client_error_is_rejected_with_code() {
        let err = from_status(
            StatusCode::BAD_REQUEST,
            &error_body("InvalidChangeBatch", "already exists"),
        );
        match err {
            Error::ProviderRejected { provider, message } => {
                assert_eq!(provider, "route53");
                assert_eq!(message, "InvalidChangeBatch: already exists");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_is_rejected() {
        let err = from_status(
            StatusCode::NOT_FOUND,
            &error_body("NoSuchHostedZone", "No hosted zone found with ID: Z1"),
        );
        assert!(matches!(err, Error::ProviderRejected { .. }));
    }

    #[test]
    fn test_auth_failure_is_unavailable() {
        let err = from_status(
            StatusCode::FORBIDDEN,
            &error_body("SignatureDoesNotMatch", "bad signature"),
        );
        assert!(err.is_transient());
        assert!(err.to_string().contains("SignatureDoesNotMatch"));
    }

    #[test]
    fn test_throttling_is_unavailable() {
        let err = from_status(StatusCode::BAD_REQUEST, &error_body("Throttling", "Rate exceeded"));
        assert!(err.is_transient());

        let err = from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_error_without_body() {
        let err = from_status(StatusCode::SERVICE_UNAVAILABLE, "<html>oops</html>");
        assert!(err.is_transient());
        assert!(err.to_string().contains("HTTP 503"));
    }
}
