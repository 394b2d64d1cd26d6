//! Rendering resolved options as JSON or as sourceable shell exports.

use crate::resolver::ResolvedSet;
use crate::value::OptionValue;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Option names that cannot be exported as shell variables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("options \"{first}\" and \"{second}\" both map to the variable {var}")]
    NameCollision {
        first: String,
        second: String,
        var: String,
    },

    #[error("option \"{name}\" maps to {var}, which is not a valid shell variable name")]
    InvalidVariableName { name: String, var: String },
}

/// Escape a string for safe use in a shell double-quoted context.
///
/// Only $, `, \ and " are special there; newlines and tabs stay literal.
fn escape_shell_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => escaped.push_str("\\$"),
            '`' => escaped.push_str("\\`"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn is_shell_identifier(var: &str) -> bool {
    let mut chars = var.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Convert an option name to a valid shell variable name.
///
/// Upper-cases ASCII letters and replaces anything that is not an ASCII
/// letter or digit with an underscore.
fn to_shell_var_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Text form of a value for a shell variable.
///
/// `None` for opaque handles that carry no JSON.
fn shell_value(value: &OptionValue) -> Option<String> {
    match value {
        OptionValue::Null => Some(String::new()),
        OptionValue::Opaque(handle) => handle.as_json().map(|json| json.to_string()),
        other => Some(other.to_string()),
    }
}

/// Generate a temporary file with shell export statements.
///
/// Returns the path to the temporary file. The file will persist
/// until the process exits or it's manually deleted.
pub fn generate_output(resolved: &ResolvedSet, prefix: &str) -> Result<PathBuf> {
    let content = generate_output_string(resolved, prefix)?;
    write_temp_file(&content)
}

/// Generate the output content as a string.
///
/// Fails when two exported options map to the same variable, or when a
/// variable name would not be a valid shell identifier.
pub fn generate_output_string(
    resolved: &ResolvedSet,
    prefix: &str,
) -> std::result::Result<String, OutputError> {
    let mut output = String::new();
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (name, value) in resolved {
        let Some(text) = shell_value(value) else {
            continue;
        };
        let var_name = format!("{}{}", prefix, to_shell_var_name(name));
        if !is_shell_identifier(&var_name) {
            return Err(OutputError::InvalidVariableName {
                name: name.clone(),
                var: var_name,
            });
        }
        if let Some(first) = seen.insert(var_name.clone(), name) {
            return Err(OutputError::NameCollision {
                first: first.to_string(),
                second: name.clone(),
                var: var_name,
            });
        }
        output.push_str(&format!(
            "export {}=\"{}\"\n",
            var_name,
            escape_shell_value(&text)
        ));
    }

    Ok(output)
}

/// Render any option set as pretty JSON, keeping its key order.
pub fn generate_json<T: Serialize + ?Sized>(set: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

/// Generate an error output file.
///
/// When sourced, the file will print `program: message` to stderr and exit 1.
pub fn generate_error_output(program: &str, message: &str) -> Result<PathBuf> {
    let content = generate_error_string(program, message);
    write_temp_file(&content)
}

/// Generate an error output as a string (for testing).
pub fn generate_error_string(program: &str, message: &str) -> String {
    format!(
        "echo \"{}: {}\" >&2\nexit 1\n",
        escape_shell_value(program),
        escape_shell_value(message)
    )
}

/// Write content to a temporary file and return its path.
pub fn write_temp_file(content: &str) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    let path = file.into_temp_path().keep()?;
    Ok(path)
}
