//! Per-option validation hooks.

use crate::value::OptionValue;

/// Decides whether an option and its value are acceptable.
///
/// `was_expected` is true when the option name appears in the defaults (or
/// when there are no defaults at all).
///
/// Any `Fn(&str, &OptionValue, bool) -> bool` closure is a validator:
///
/// ```
/// use optresolve::{OptionValue, Options};
///
/// let mut options = Options::new();
/// options.validator(
///     |name: &str, _value: &OptionValue, _was_expected: bool| name == name.to_lowercase(),
///     false,
/// );
/// options.set_options(["lower UPPER"]).unwrap();
/// assert!(options.has("lower").unwrap());
/// assert!(!options.has("UPPER").unwrap());
/// ```
pub trait Validator {
    fn validate(&self, name: &str, value: &OptionValue, was_expected: bool) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&str, &OptionValue, bool) -> bool,
{
    fn validate(&self, name: &str, value: &OptionValue, was_expected: bool) -> bool {
        self(name, value, was_expected)
    }
}

/// A validator that only looks at the option name.
#[derive(Debug, Clone, Copy)]
pub struct ByName<F>(pub F);

impl<F> Validator for ByName<F>
where
    F: Fn(&str) -> bool,
{
    fn validate(&self, name: &str, _value: &OptionValue, _was_expected: bool) -> bool {
        (self.0)(name)
    }
}

/// A validator that only looks at the option value.
#[derive(Debug, Clone, Copy)]
pub struct ByValue<F>(pub F);

impl<F> Validator for ByValue<F>
where
    F: Fn(&OptionValue) -> bool,
{
    fn validate(&self, _name: &str, value: &OptionValue, _was_expected: bool) -> bool {
        (self.0)(value)
    }
}

/// Validate on the option name alone.
pub fn by_name<F: Fn(&str) -> bool>(f: F) -> ByName<F> {
    ByName(f)
}

/// Validate on the option value alone.
pub fn by_value<F: Fn(&OptionValue) -> bool>(f: F) -> ByValue<F> {
    ByValue(f)
}
