//! # mealcraft-error
//!
//! Unified error handling for mealcraft.
//!
//! ## Design
//!
//! - **ErrorKind**: what went wrong (e.g., DietaryViolation, BudgetExceeded)
//! - **ErrorStatus**: how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: key-value pairs that help locate the cause
//! - **Error Source**: underlying errors wrapped without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use mealcraft_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::DietaryViolation, "option contains 'cheese'")
//!         .with_operation("generator::validate")
//!         .with_context("category", "breakfast")
//!         .with_context("dietary", "vegan"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, mealcraft_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, later layers only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the mealcraft Error
pub type Result<T> = std::result::Result<T, Error>;
