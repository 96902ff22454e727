use alioss_core::{Error, ErrorKind};
use http::Method;

/// Service error codes worth another attempt.
///
/// `NoSuchUpload` and `NoSuchBucket` usually describe permanent conditions.
/// TODO: drop them once callers stop relying on retries for eventually
/// consistent bucket creation.
const RETRYABLE_CODES: [&str; 3] = ["InternalError", "NoSuchUpload", "NoSuchBucket"];

/// Decide whether a failed attempt should be attempted again.
///
/// Failures of requests issued with a verb other than GET, PUT, DELETE or
/// HEAD are never retried.
pub fn should_retry(err: &Error) -> bool {
    if let Some(method) = err.method() {
        if !is_idempotent(method) {
            return false;
        }
    }

    match err.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::Dns
        | ErrorKind::Read
        | ErrorKind::Write
        | ErrorKind::Timeout => true,
        ErrorKind::Service => err
            .service_error()
            .is_some_and(|e| RETRYABLE_CODES.contains(&e.code.as_str())),
        _ => false,
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::PUT | Method::DELETE | Method::HEAD
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::ServiceError;
    use http::StatusCode;
    use test_case::test_case;

    fn service(code: &str) -> Error {
        Error::service(ServiceError {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            code: code.to_string(),
            message: code.to_string(),
            ..Default::default()
        })
    }

    #[test_case(ErrorKind::UnexpectedEof, true)]
    #[test_case(ErrorKind::Dns, true)]
    #[test_case(ErrorKind::Read, true)]
    #[test_case(ErrorKind::Write, true)]
    #[test_case(ErrorKind::Timeout, true)]
    #[test_case(ErrorKind::Connect, false)]
    #[test_case(ErrorKind::ConfigInvalid, false)]
    #[test_case(ErrorKind::RequestInvalid, false)]
    #[test_case(ErrorKind::Decode, false)]
    #[test_case(ErrorKind::Unexpected, false)]
    fn test_network_kinds(kind: ErrorKind, expected: bool) {
        assert_eq!(should_retry(&Error::new(kind, "failed")), expected);
    }

    #[test_case("InternalError", true)]
    #[test_case("NoSuchUpload", true)]
    #[test_case("NoSuchBucket", true)]
    #[test_case("AccessDenied", false)]
    #[test_case("NoSuchKey", false)]
    #[test_case("", false)]
    fn test_service_codes(code: &str, expected: bool) {
        assert_eq!(should_retry(&service(code)), expected);
    }

    #[test_case(Method::GET, true)]
    #[test_case(Method::PUT, true)]
    #[test_case(Method::DELETE, true)]
    #[test_case(Method::HEAD, true)]
    #[test_case(Method::POST, false)]
    #[test_case(Method::PATCH, false)]
    fn test_method_gate(method: Method, expected: bool) {
        let err = Error::new(ErrorKind::UnexpectedEof, "eof").with_method(method.clone());
        assert_eq!(should_retry(&err), expected);

        let err = service("InternalError").with_method(method);
        assert_eq!(should_retry(&err), expected);
    }
}
