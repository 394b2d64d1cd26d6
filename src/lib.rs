//! optresolve - option strings resolved against defaults.
//!
//! This library tokenizes compact option strings such as
//! `verbose -debug level=3 name="My Name"`, merges them over a set of
//! defaults, filters unexpected or invalid options, and renders the result
//! as JSON or shell export statements.

pub mod config;
pub mod error;
pub mod options;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod source;
pub mod validator;
pub mod value;

pub use config::{Config, ConfigError, RuleConfig, RuleSet, ValueType};
pub use error::OptionsError;
pub use options::Options;
pub use output::{
    generate_error_output, generate_error_string, generate_json, generate_output,
    generate_output_string, write_temp_file, OutputError,
};
pub use parser::{coerce, tokenize, ParsedSet};
pub use resolver::{merge, resolve, Policy, ResolvedSet};
pub use source::{parse_sources, Source, SourceItem};
pub use validator::{by_name, by_value, ByName, ByValue, Validator};
pub use value::{Opaque, OptionValue};
