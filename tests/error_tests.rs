//! Tests for the error system.

use presence_light::auth::AuthError;
use presence_light::error::*;
use presence_light::presence::FetchError;
use presence_light::transport::TransportError;

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: LightError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
    }

    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");

    let cases = vec![
        Case {
            error: LightError::Configuration("tenant missing".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_retryable: false,
        },
        Case {
            error: TransportError::Connect("refused".to_string()).into(),
            expected_category: ErrorCategory::Transport,
            expected_retryable: true,
        },
        Case {
            error: AuthError::Protocol("response missing interval".to_string()).into(),
            expected_category: ErrorCategory::Protocol,
            expected_retryable: true,
        },
        Case {
            error: AuthError::Provider {
                code: "invalid_grant".to_string(),
                description: "AADSTS70000".to_string(),
            }
            .into(),
            expected_category: ErrorCategory::Application,
            expected_retryable: false,
        },
        Case {
            error: AuthError::Io("disk full".to_string()).into(),
            expected_category: ErrorCategory::Storage,
            expected_retryable: false,
        },
        Case {
            error: FetchError::Transport(TransportError::Status(503)).into(),
            expected_category: ErrorCategory::Transport,
            expected_retryable: true,
        },
        Case {
            error: FetchError::InvalidToken("expired".to_string()).into(),
            expected_category: ErrorCategory::Application,
            expected_retryable: false,
        },
        Case {
            error: LightError::Io(io_error),
            expected_category: ErrorCategory::Storage,
            expected_retryable: false,
        },
        Case {
            error: LightError::LoginAlreadyRunning,
            expected_category: ErrorCategory::State,
            expected_retryable: false,
        },
        Case {
            error: LightError::NotConnected,
            expected_category: ErrorCategory::State,
            expected_retryable: false,
        },
    ];

    for case in cases {
        assert_eq!(
            case.error.category(),
            case.expected_category,
            "category mismatch for {}",
            case.error
        );
        assert_eq!(
            case.error.is_retryable(),
            case.expected_retryable,
            "retryable mismatch for {}",
            case.error
        );
    }
}

#[test]
fn messages_name_the_failure() {
    let err = LightError::from(AuthError::Provider {
        code: "expired_token".to_string(),
        description: "code expired".to_string(),
    });
    assert_eq!(
        err.to_string(),
        "Authentication error: Provider error expired_token: code expired"
    );
    assert_eq!(
        LightError::from(TransportError::Status(500)).to_string(),
        "Authentication error: Transport error: Unexpected HTTP status 500"
    );
}
