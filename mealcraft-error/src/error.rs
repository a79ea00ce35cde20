//! The main Error type for mealcraft

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all mealcraft operations.
///
/// - `kind`: what type of error occurred
/// - `message`: human-readable description
/// - `status`: whether the error is retryable
/// - `operation`: what operation produced the error
/// - `context`: key-value pairs for debugging
/// - `source`: the underlying error (if any)
///
/// # Example
///
/// ```rust
/// use mealcraft_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::ParseFailed, "expected 3 options, got 2")
///     .with_operation("contract::parse")
///     .with_status(ErrorStatus::Temporary)
///     .with_context("category", "lunch");
///
/// assert_eq!(err.kind(), ErrorKind::ParseFailed);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Look up the first context value stored under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as temporary (retryable)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark as permanent (not retryable)
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    // =========================================================================
    // Status mutations
    // =========================================================================

    /// Mark as persistent after failed retries
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;

        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create an Unsupported error for an export format
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        let format = format.into();
        Self::new(ErrorKind::Unsupported, format!("Unsupported format: {}", format))
            .with_context("format", format)
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    pub fn serialization_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationFailed, message)
    }

    /// Create a DietaryViolation error naming the offending ingredient
    pub fn dietary_violation(dietary: impl Into<String>, ingredients: impl Into<String>) -> Self {
        let dietary = dietary.into();
        let ingredients = ingredients.into();
        Self::new(
            ErrorKind::DietaryViolation,
            format!("Contains {}-forbidden ingredients: {}", dietary, ingredients),
        )
        .with_context("dietary", dietary)
    }

    /// Create a BudgetExceeded error for a category cap
    pub fn budget_exceeded(limit: f64, actual: f64) -> Self {
        Self::new(ErrorKind::BudgetExceeded, format!("Budget exceeded ${:.2}", limit))
            .with_context("limit", format!("{:.2}", limit))
            .with_context("actual", format!("{:.2}", actual))
    }

    /// Create a CalorieLimitExceeded error for a category cap
    pub fn calorie_limit_exceeded(limit: f64, actual: u64) -> Self {
        Self::new(
            ErrorKind::CalorieLimitExceeded,
            format!("Calories exceeded {}kcal", limit),
        )
        .with_context("limit", limit.to_string())
        .with_context("actual", actual.to_string())
    }

    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self::new(ErrorKind::SessionNotFound, "No meal plan found")
            .with_context("session_id", session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::BudgetExceeded, "Budget exceeded $10.00");
        assert_eq!(err.kind(), ErrorKind::BudgetExceeded);
        assert_eq!(err.message(), "Budget exceeded $10.00");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::ParseFailed, "missing field `options`")
            .with_operation("contract::parse")
            .with_context("category", "dinner")
            .with_context("attempt", "2");

        assert_eq!(err.operation(), "contract::parse");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("category", "dinner".to_string()));
        assert_eq!(err.context_value("attempt"), Some("2"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::ParseFailed, "bad json")
            .with_operation("contract::parse")
            .with_operation("generator::attempt");

        assert_eq!(err.operation(), "generator::attempt");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "contract::parse".to_string()));
    }

    #[test]
    fn test_default_status_follows_kind() {
        let err = Error::dietary_violation("vegan", "cheese, bread");
        assert!(err.is_retryable());

        let err = Error::budget_exceeded(10.0, 12.5);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_persist() {
        let err = Error::parse_failed("no json").temporary();
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::RateLimited, "slow down")
            .with_operation("provider::complete")
            .with_context("model", "llama-3.3-70b-versatile");

        let display = format!("{}", err);
        assert!(display.contains("RateLimited"));
        assert!(display.contains("temporary"));
        assert!(display.contains("provider::complete"));
        assert!(display.contains("model: llama-3.3-70b-versatile"));
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::unsupported_format("csv");
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.message(), "Unsupported format: csv");

        let err = Error::budget_exceeded(10.0, 11.0);
        assert_eq!(err.message(), "Budget exceeded $10.00");

        let err = Error::calorie_limit_exceeded(500.0, 650);
        assert_eq!(err.message(), "Calories exceeded 500kcal");

        let err = Error::session_not_found("abc");
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[test]
    fn test_set_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::parse_failed("truncated response").set_source(json_err);

        assert!(err.source_ref().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_io_error() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::from(missing);
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "io");
        assert!(err.source_ref().is_some());

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(denied).kind(), ErrorKind::PermissionDenied);

        let other = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(Error::from(other).kind(), ErrorKind::IoFailed);
    }
}
