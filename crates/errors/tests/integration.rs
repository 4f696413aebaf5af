//! Integration tests for error types

#[cfg(test)]
mod tests {
    use ratewatch_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_error_display() {
        let err = NetworkError::HttpError {
            status: 404,
            message: "404 Not Found".into(),
        };
        assert_eq!(err.to_string(), "HTTP error 404: 404 Not Found");
    }

    #[test]
    fn test_error_clone() {
        let err = ConfigError::DuplicateLink {
            name: "mirror".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert_eq!(err.user_code(), Some("error.io"));
        assert!(!err.is_retryable());

        let err: Error = std::io::Error::new(std::io::ErrorKind::Interrupted, "signal").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_facing_codes() {
        let err: Error = NetworkError::ConnectionRefused("refused".into()).into();
        assert_eq!(err.user_code(), Some("network.connection_refused"));
        assert!(err.user_hint().is_some());
        assert!(err.is_retryable());

        let err: Error = NetworkError::HttpError {
            status: 403,
            message: "forbidden".into(),
        }
        .into();
        assert!(!err.is_retryable());
    }
}
