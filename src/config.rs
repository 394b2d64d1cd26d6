//! JSON configuration parsing and types for optresolve.

use crate::error::OptionsError;
use crate::options::Options;
use crate::resolver::Policy;
use crate::source::Source;
use crate::validator::Validator;
use crate::value::OptionValue;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// The minimum supported schema version.
pub const MIN_SCHEMA_VERSION: u32 = 1;
/// The maximum supported schema version.
pub const MAX_SCHEMA_VERSION: u32 = 1;

/// Prefix used for shell variables when the config sets none.
pub const DEFAULT_PREFIX: &str = "OPT_";
/// Default name shown in front of error messages.
pub const DEFAULT_NAME: &str = "optresolve";

/// Errors that can occur during config parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("unsupported schema version {0} (supported: 1)")]
    UnsupportedSchemaVersion(u32),

    #[error("rule name must not be empty")]
    EmptyRuleName,

    #[error("duplicate rule name: {0}")]
    DuplicateName(String),

    #[error("'choices' on rule '{0}' is empty: must have at least one valid value")]
    EmptyChoices(String),

    #[error("'choices' on rule '{0}' has duplicate value: {1}")]
    DuplicateChoice(String, String),

    #[error("'choices' cannot be used with value_type '{1}' on rule '{0}'")]
    ChoicesOnFixedType(String, String),

    #[error("invalid defaults: {0}")]
    InvalidDefaults(#[from] OptionsError),
}

/// Value type a rule requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    /// Integers are accepted as floats too.
    Float,
    Bool,
    Null,
}

impl ValueType {
    fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Null => "null",
        }
    }

    fn accepts(&self, value: &OptionValue) -> bool {
        match self {
            ValueType::String => matches!(value, OptionValue::String(_)),
            ValueType::Int => matches!(value, OptionValue::Integer(_)),
            ValueType::Float => matches!(value, OptionValue::Float(_) | OptionValue::Integer(_)),
            ValueType::Bool => matches!(value, OptionValue::Boolean(_)),
            ValueType::Null => value.is_null(),
        }
    }
}

/// Constraints for one option name.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// The option name the rule applies to
    pub name: String,
    /// Required value type
    pub value_type: Option<ValueType>,
    /// Allowed values, compared against the value's text form
    pub choices: Option<Vec<String>>,
}

impl RuleConfig {
    fn accepts(&self, value: &OptionValue) -> bool {
        if let Some(value_type) = self.value_type {
            if !value_type.accepts(value) {
                return false;
            }
        }
        match &self.choices {
            Some(choices) => {
                let text = value.to_string();
                choices.iter().any(|choice| *choice == text)
            }
            None => true,
        }
    }
}

/// Rules indexed by option name; usable as a [`Validator`].
///
/// Options without a rule are accepted.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, RuleConfig>,
}

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = RuleConfig>) -> Self {
        Self {
            rules: rules.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Validator for RuleSet {
    fn validate(&self, name: &str, value: &OptionValue, _was_expected: bool) -> bool {
        self.rules.get(name).map_or(true, |rule| rule.accepts(value))
    }
}

fn default_schema_version() -> u32 {
    1
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Schema version for the config format (default: 1)
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Name shown in front of error messages (default: "optresolve")
    pub name: Option<String>,
    /// Shell variable prefix (default: "OPT_")
    pub prefix: Option<String>,
    /// Default options, in any source form (string, array or object)
    pub defaults: Option<serde_json::Value>,
    /// Drop options that have no default
    #[serde(default)]
    pub restrict_unexpected: bool,
    /// Fail on options that have no default (needs restrict_unexpected)
    #[serde(default)]
    pub fail_on_unexpected: bool,
    /// Fail on options that break a rule instead of dropping them
    #[serde(default)]
    pub fail_on_invalid: bool,
    /// Per-option constraints
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: None,
            prefix: None,
            defaults: None,
            restrict_unexpected: false,
            fail_on_unexpected: false,
            fail_on_invalid: false,
            rules: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a JSON string into a Config.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version < MIN_SCHEMA_VERSION || self.schema_version > MAX_SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchemaVersion(self.schema_version));
        }

        let mut names = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::EmptyRuleName);
            }
            if !names.insert(&rule.name) {
                return Err(ConfigError::DuplicateName(rule.name.clone()));
            }
            Self::validate_choices(rule)?;
        }

        Ok(())
    }

    /// Validate choices field on a rule.
    fn validate_choices(rule: &RuleConfig) -> Result<(), ConfigError> {
        let Some(ref choices) = rule.choices else {
            return Ok(());
        };

        // Bool and null values have a fixed set of forms already
        if let Some(value_type @ (ValueType::Bool | ValueType::Null)) = rule.value_type {
            return Err(ConfigError::ChoicesOnFixedType(
                rule.name.clone(),
                value_type.as_str().to_string(),
            ));
        }

        if choices.is_empty() {
            return Err(ConfigError::EmptyChoices(rule.name.clone()));
        }

        let mut seen = HashSet::new();
        for choice in choices {
            if !seen.insert(choice) {
                return Err(ConfigError::DuplicateChoice(
                    rule.name.clone(),
                    choice.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Get the effective prefix, using the default if none is set.
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    /// Get the name for error messages, using the default if none is set.
    pub fn effective_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_NAME,
        }
    }

    pub fn policy(&self) -> Policy {
        Policy {
            allow_unexpected: !self.restrict_unexpected,
            fail_on_unexpected: self.fail_on_unexpected,
            fail_on_invalid: self.fail_on_invalid,
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.iter().cloned())
    }

    /// Build an [`Options`] holder with this config's defaults, policy and
    /// rules applied. Custom options are left for the caller.
    pub fn build_options(&self) -> Result<Options, ConfigError> {
        let mut options = Options::new();

        if let Some(ref defaults) = self.defaults {
            options.set_defaults([Source::from(defaults.clone())])?;
        }
        options.restrict_unexpected(self.restrict_unexpected, self.fail_on_unexpected);

        let rules = self.rule_set();
        if !rules.is_empty() {
            options.validator(rules, self.fail_on_invalid);
        }

        Ok(options)
    }
}
