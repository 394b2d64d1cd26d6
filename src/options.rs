//! Holds defaults and custom options and caches the resolved set.

use crate::error::OptionsError;
use crate::parser::ParsedSet;
use crate::resolver::{merge, Policy, ResolvedSet};
use crate::source::{parse_sources, Source};
use crate::validator::Validator;
use crate::value::OptionValue;
use std::fmt;
use tracing::trace;

/// A set of defaults and custom options, resolved on demand.
///
/// Every setter discards the cached result; the next read resolves again.
#[derive(Default)]
pub struct Options {
    defaults: Option<ParsedSet>,
    custom: Option<ParsedSet>,
    validator: Option<Box<dyn Validator + Send + Sync>>,
    policy: Policy,
    resolved: Option<ResolvedSet>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("defaults", &self.defaults)
            .field("custom", &self.custom)
            .field("has_validator", &self.validator.is_some())
            .field("policy", &self.policy)
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a holder whose custom options come from `sources`.
    pub fn from_sources<I, S>(sources: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        let mut options = Self::new();
        options.set_options(sources)?;
        Ok(options)
    }

    /// Replace the custom options. No sources clears them.
    pub fn set_options<I, S>(&mut self, sources: I) -> Result<&mut Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        self.custom = parse_optional(sources)?;
        self.invalidate();
        Ok(self)
    }

    /// Add to (or override) the custom options.
    pub fn amend_options<I, S>(&mut self, sources: I) -> Result<&mut Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        if let Some(parsed) = parse_optional(sources)? {
            self.custom.get_or_insert_with(ParsedSet::new).extend(parsed);
            self.invalidate();
        }
        Ok(self)
    }

    /// Replace the defaults. No sources clears them.
    pub fn set_defaults<I, S>(&mut self, sources: I) -> Result<&mut Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        self.defaults = parse_optional(sources)?;
        self.invalidate();
        Ok(self)
    }

    /// Add to (or override) the defaults.
    pub fn amend_defaults<I, S>(&mut self, sources: I) -> Result<&mut Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        if let Some(parsed) = parse_optional(sources)? {
            self.defaults.get_or_insert_with(ParsedSet::new).extend(parsed);
            self.invalidate();
        }
        Ok(self)
    }

    /// Restrict options to the names present in the defaults.
    ///
    /// With `fail` set, an unexpected option makes resolution fail instead of
    /// being dropped.
    pub fn restrict_unexpected(&mut self, restrict: bool, fail: bool) -> &mut Self {
        self.policy.allow_unexpected = !restrict;
        self.policy.fail_on_unexpected = fail;
        self.invalidate();
        self
    }

    /// Check every option against `validator`.
    ///
    /// With `fail` set, a rejected option makes resolution fail instead of
    /// being dropped.
    pub fn validator<V>(&mut self, validator: V, fail: bool) -> &mut Self
    where
        V: Validator + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self.policy.fail_on_invalid = fail;
        self.invalidate();
        self
    }

    pub fn remove_validator(&mut self) -> &mut Self {
        self.validator = None;
        self.policy.fail_on_invalid = false;
        self.invalidate();
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// All resolved options, ordered by name.
    pub fn all(&mut self) -> Result<&ResolvedSet, OptionsError> {
        self.reevaluate()
    }

    pub fn has(&mut self, name: &str) -> Result<bool, OptionsError> {
        Ok(self.reevaluate()?.contains_key(name))
    }

    pub fn get(&mut self, name: &str) -> Result<Option<&OptionValue>, OptionsError> {
        Ok(self.reevaluate()?.get(name))
    }

    fn invalidate(&mut self) {
        self.resolved = None;
    }

    fn reevaluate(&mut self) -> Result<&ResolvedSet, OptionsError> {
        if self.resolved.is_none() {
            trace!("resolving options");
            let validator = self
                .validator
                .as_deref()
                .map(|v| v as &dyn Validator);
            let resolved = merge(
                self.custom.as_ref(),
                self.defaults.as_ref(),
                self.policy,
                validator,
            )?;
            self.resolved = Some(resolved);
        }
        Ok(self.resolved.get_or_insert_with(ResolvedSet::new))
    }
}

/// Parse sources, treating "no sources at all" as absent.
fn parse_optional<I, S>(sources: I) -> Result<Option<ParsedSet>, OptionsError>
where
    I: IntoIterator<Item = S>,
    S: Into<Source>,
{
    let sources: Vec<Source> = sources.into_iter().map(Into::into).collect();
    if sources.is_empty() {
        return Ok(None);
    }
    parse_sources(sources).map(Some)
}
