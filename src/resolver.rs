//! Merging defaults and custom options into the resolved set.

use crate::error::OptionsError;
use crate::parser::ParsedSet;
use crate::source::{parse_sources, Source};
use crate::validator::Validator;
use crate::value::OptionValue;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// The final option set, ordered by option name.
pub type ResolvedSet = BTreeMap<String, OptionValue>;

/// How unexpected and invalid options are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Accept options that have no default.
    pub allow_unexpected: bool,
    /// Fail instead of dropping an unexpected option.
    pub fail_on_unexpected: bool,
    /// Fail instead of dropping an option the validator rejects.
    pub fail_on_invalid: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_unexpected: true,
            fail_on_unexpected: false,
            fail_on_invalid: false,
        }
    }
}

/// Parse `sources` and merge them over `defaults`.
pub fn resolve<I, S>(
    sources: I,
    defaults: Option<&ParsedSet>,
    policy: Policy,
    validator: Option<&dyn Validator>,
) -> Result<ResolvedSet, OptionsError>
where
    I: IntoIterator<Item = S>,
    S: Into<Source>,
{
    let custom = parse_sources(sources)?;
    merge(Some(&custom), defaults, policy, validator)
}

/// Merge custom options over defaults.
///
/// Names are visited in sorted order. A name is expected when it has a
/// default, or when there are no defaults at all. Defaults are validated
/// even when a custom value replaces them. Names accepted before a dropped
/// one stay in the result.
pub fn merge(
    custom: Option<&ParsedSet>,
    defaults: Option<&ParsedSet>,
    policy: Policy,
    validator: Option<&dyn Validator>,
) -> Result<ResolvedSet, OptionsError> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    if let Some(defaults) = defaults {
        names.extend(defaults.keys().map(String::as_str));
    }
    if let Some(custom) = custom {
        names.extend(custom.keys().map(String::as_str));
    }

    let check = Check { validator, policy };
    let mut resolved = ResolvedSet::new();

    for name in names {
        let default = defaults.and_then(|d| d.get(name));
        let is_expected = defaults.map_or(true, |_| default.is_some());

        if !is_expected && !policy.allow_unexpected {
            if policy.fail_on_unexpected {
                return Err(OptionsError::UnexpectedOption(name.to_string()));
            }
            debug!(name, "dropping unexpected option");
            continue;
        }

        if let Some(value) = default {
            if check.is_valid(name, value, true)? {
                resolved.insert(name.to_string(), value.clone());
            }
        }

        if let Some(value) = custom.and_then(|c| c.get(name)) {
            if check.is_valid(name, value, is_expected)? {
                resolved.insert(name.to_string(), value.clone());
            }
        }
    }

    Ok(resolved)
}

struct Check<'a> {
    validator: Option<&'a dyn Validator>,
    policy: Policy,
}

impl Check<'_> {
    fn is_valid(
        &self,
        name: &str,
        value: &OptionValue,
        was_expected: bool,
    ) -> Result<bool, OptionsError> {
        let Some(validator) = self.validator else {
            return Ok(true);
        };

        if validator.validate(name, value, was_expected) {
            return Ok(true);
        }

        if self.policy.fail_on_invalid {
            return Err(OptionsError::InvalidOptionOrValue {
                name: name.to_string(),
                value: value.describe(),
            });
        }
        debug!(name, value = %value.describe(), "dropping invalid option");
        Ok(false)
    }
}
