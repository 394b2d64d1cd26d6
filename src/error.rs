//! Errors raised while reading option sources and resolving option sets.

use thiserror::Error;

/// Errors that can occur while parsing sources or resolving options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// A sequence source held something other than a string or a mapping.
    #[error("option arrays must contain strings, or have keys (the option names)")]
    MalformedSource,

    #[error("the option \"{0}\" was not expected")]
    UnexpectedOption(String),

    /// `value` holds the description produced by `OptionValue::describe`.
    #[error("the option \"{name}\" and/or its value {value} are not allowed")]
    InvalidOptionOrValue { name: String, value: String },
}
