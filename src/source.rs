//! Option sources and flattening them into a single parsed set.

use crate::error::OptionsError;
use crate::parser::{tokenize, ParsedSet};
use crate::value::OptionValue;
use indexmap::IndexMap;

/// Whitespace stripped from the ends of mapping keys.
const KEY_TRIM: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\x0B'];

/// One caller-supplied description of options.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A string to tokenize, e.g. `"-a b=1"`.
    Text(String),
    /// Strings and mappings, applied in order.
    Sequence(Vec<SourceItem>),
    /// Option names mapped directly to values.
    Mapping(IndexMap<String, OptionValue>),
}

/// One entry of a [`Source::Sequence`].
#[derive(Debug, Clone, PartialEq)]
pub enum SourceItem {
    Text(String),
    Mapping(IndexMap<String, OptionValue>),
    /// Anything else. `Null` is ignored; other values make the source
    /// malformed.
    Value(OptionValue),
}

impl Source {
    /// Build a mapping source from name/value pairs.
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionValue>,
    {
        Source::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl SourceItem {
    /// A mapping holding a single name/value pair.
    pub fn pair(name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let mut map = IndexMap::new();
        map.insert(name.into(), value.into());
        SourceItem::Mapping(map)
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Text(value.to_string())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Text(value)
    }
}

impl From<&String> for Source {
    fn from(value: &String) -> Self {
        Source::Text(value.clone())
    }
}

impl From<Vec<SourceItem>> for Source {
    fn from(items: Vec<SourceItem>) -> Self {
        Source::Sequence(items)
    }
}

impl From<Vec<&str>> for Source {
    fn from(items: Vec<&str>) -> Self {
        Source::Sequence(items.into_iter().map(SourceItem::from).collect())
    }
}

impl From<Vec<String>> for Source {
    fn from(items: Vec<String>) -> Self {
        Source::Sequence(items.into_iter().map(SourceItem::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Source {
    fn from(items: [&str; N]) -> Self {
        Source::Sequence(items.into_iter().map(SourceItem::from).collect())
    }
}

impl From<IndexMap<String, OptionValue>> for Source {
    fn from(map: IndexMap<String, OptionValue>) -> Self {
        Source::Mapping(map)
    }
}

impl From<serde_json::Value> for Source {
    /// Strings are tokenized, objects are mappings and arrays are sequences.
    /// `null` is an empty source; any other scalar is kept as a sequence
    /// value, which fails when the source is parsed.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Source::Text(s),
            serde_json::Value::Object(map) => Source::Mapping(json_mapping(map)),
            serde_json::Value::Array(items) => {
                Source::Sequence(items.into_iter().map(SourceItem::from).collect())
            }
            serde_json::Value::Null => Source::Sequence(Vec::new()),
            other => Source::Sequence(vec![SourceItem::Value(other.into())]),
        }
    }
}

impl From<&str> for SourceItem {
    fn from(value: &str) -> Self {
        SourceItem::Text(value.to_string())
    }
}

impl From<String> for SourceItem {
    fn from(value: String) -> Self {
        SourceItem::Text(value)
    }
}

impl From<IndexMap<String, OptionValue>> for SourceItem {
    fn from(map: IndexMap<String, OptionValue>) -> Self {
        SourceItem::Mapping(map)
    }
}

impl From<OptionValue> for SourceItem {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::String(s) => SourceItem::Text(s),
            other => SourceItem::Value(other),
        }
    }
}

impl From<serde_json::Value> for SourceItem {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => SourceItem::Text(s),
            serde_json::Value::Object(map) => SourceItem::Mapping(json_mapping(map)),
            other => SourceItem::Value(other.into()),
        }
    }
}

fn json_mapping(map: serde_json::Map<String, serde_json::Value>) -> IndexMap<String, OptionValue> {
    map.into_iter().map(|(k, v)| (k, v.into())).collect()
}

/// A flattened piece of input, before tokenizing.
#[derive(Debug, PartialEq)]
enum Fragment {
    Text(String),
    Pair(String, OptionValue),
}

/// Flatten sources into fragments, one level deep.
///
/// Adjacent text fragments are joined with a space so that they read as one
/// option string. A mapping key seen again in a later mapping keeps its first
/// slot and takes the later value, so text between the two still overrides
/// it.
fn flatten(sources: Vec<Source>) -> Result<Vec<Fragment>, OptionsError> {
    let mut fragments = Vec::new();

    for source in sources {
        match source {
            Source::Text(text) => push_text(&mut fragments, text),
            Source::Mapping(map) => push_mapping(&mut fragments, map),
            Source::Sequence(items) => {
                for item in items {
                    match item {
                        SourceItem::Text(text) => push_text(&mut fragments, text),
                        SourceItem::Mapping(map) => push_mapping(&mut fragments, map),
                        SourceItem::Value(OptionValue::String(text)) => {
                            push_text(&mut fragments, text)
                        }
                        SourceItem::Value(OptionValue::Null) => {}
                        SourceItem::Value(_) => return Err(OptionsError::MalformedSource),
                    }
                }
            }
        }
    }

    Ok(fragments)
}

fn push_mapping(fragments: &mut Vec<Fragment>, map: IndexMap<String, OptionValue>) {
    for (key, value) in map {
        let slot = fragments
            .iter()
            .position(|f| matches!(f, Fragment::Pair(existing, _) if *existing == key));
        match slot {
            Some(index) => fragments[index] = Fragment::Pair(key, value),
            None => fragments.push(Fragment::Pair(key, value)),
        }
    }
}

fn push_text(fragments: &mut Vec<Fragment>, text: String) {
    match fragments.last_mut() {
        Some(Fragment::Text(previous)) => {
            previous.push(' ');
            previous.push_str(&text);
        }
        _ => fragments.push(Fragment::Text(text)),
    }
}

/// Parse one or more sources into a single set.
///
/// Later sources override earlier ones; a name keeps the position where it
/// was first seen.
pub fn parse_sources<I, S>(sources: I) -> Result<ParsedSet, OptionsError>
where
    I: IntoIterator<Item = S>,
    S: Into<Source>,
{
    let fragments = flatten(sources.into_iter().map(Into::into).collect())?;

    let mut parsed = ParsedSet::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => parsed.extend(tokenize(&text)),
            Fragment::Pair(key, value) => {
                let key = key.trim_matches(&KEY_TRIM[..]);
                if !key.is_empty() {
                    parsed.insert(key.to_string(), value);
                }
            }
        }
    }

    Ok(parsed)
}
