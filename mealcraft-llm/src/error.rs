//! Provider error conversions
//!
//! Re-exports mealcraft-error and maps `ProviderError` onto it.

pub use mealcraft_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        let kind = match &err {
            ProviderError::Network(_) => ErrorKind::NetworkFailed,
            ProviderError::Api { status, .. } if *status >= 500 => ErrorKind::ProviderUnavailable,
            ProviderError::Api { .. } => ErrorKind::InferenceFailed,
            ProviderError::Parse(_) => ErrorKind::ParseFailed,
            ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
            ProviderError::InvalidRequest(_) => ErrorKind::InvalidArgument,
            ProviderError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            ProviderError::EmptyResponse => ErrorKind::InferenceFailed,
            ProviderError::Other(_) => ErrorKind::Unexpected,
        };

        let mut converted = Error::new(kind, err.to_string()).with_operation("provider");
        if let ProviderError::RateLimited {
            retry_after: Some(secs),
        } = &err
        {
            converted = converted.with_context("retry_after", secs.to_string());
        }
        converted.set_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_kinds() {
        let err: Error = ProviderError::Network("connection refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(err.is_retryable());

        let err: Error = ProviderError::AuthenticationFailed.into();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(!err.is_retryable());

        let err: Error = ProviderError::Api {
            status: 503,
            message: "overloaded".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[test]
    fn test_rate_limit_keeps_retry_after() {
        let err: Error = ProviderError::RateLimited {
            retry_after: Some(7),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.context_value("retry_after"), Some("7"));
        assert!(err.source_ref().is_some());
    }
}
