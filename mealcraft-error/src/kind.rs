//! Error kinds for mealcraft operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on ErrorKind to decide how to handle specific cases,
/// e.g. recording a category failure versus aborting a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or format is not supported
    Unsupported,

    /// Invalid configuration
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Model output errors
    // =========================================================================
    /// Failed to parse model output or input data
    ParseFailed,

    /// Serialization failed
    SerializationFailed,

    /// A meal option uses an ingredient the dietary tag forbids
    DietaryViolation,

    // =========================================================================
    // Budget errors
    // =========================================================================
    /// Aggregate cost exceeds the available budget
    BudgetExceeded,

    /// Aggregate calories exceed the calorie cap
    CalorieLimitExceeded,

    /// All attempts of a bounded retry failed
    RetriesExhausted,

    // =========================================================================
    // Session errors
    // =========================================================================
    /// No meal plan stored for the session
    SessionNotFound,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Provider not available
    ProviderUnavailable,

    /// Rate limit exceeded
    RateLimited,

    /// Provider rejected the credentials
    AuthenticationFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// Network error
    NetworkFailed,

    /// IO operation failed
    IoFailed,

    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Model output
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
            ErrorKind::DietaryViolation => "DietaryViolation",

            // Budget
            ErrorKind::BudgetExceeded => "BudgetExceeded",
            ErrorKind::CalorieLimitExceeded => "CalorieLimitExceeded",
            ErrorKind::RetriesExhausted => "RetriesExhausted",

            // Session
            ErrorKind::SessionNotFound => "SessionNotFound",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",

            // IO
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::DietaryViolation
                | ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::DietaryViolation.to_string(), "DietaryViolation");
        assert_eq!(ErrorKind::BudgetExceeded.to_string(), "BudgetExceeded");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::DietaryViolation.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::BudgetExceeded.is_retryable());
        assert!(!ErrorKind::CalorieLimitExceeded.is_retryable());
        assert!(!ErrorKind::Unsupported.is_retryable());
    }
}
