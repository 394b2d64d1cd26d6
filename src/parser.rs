//! Option-string tokenizing.
//!
//! Turns a free-form string such as `-a b=12 "c d"='x y'` into an ordered set
//! of option names and values.

use crate::value::OptionValue;
use indexmap::IndexMap;
use tracing::trace;

/// Option names mapped to values, in the order each name was first seen.
pub type ParsedSet = IndexMap<String, OptionValue>;

/// Characters that separate options within a string.
const DIVIDERS: [char; 5] = [' ', ',', '\r', '\n', '\t'];
/// Leading characters that turn a bare option off.
const NEGATIVE_MODIFIERS: [char; 2] = ['!', '-'];
/// Leading characters that turn a bare option on.
const POSITIVE_MODIFIERS: [char; 1] = ['+'];

/// A key or value as read from the input.
#[derive(Debug, PartialEq, Eq)]
enum Term {
    /// Text from inside matching quotes, already un-escaped.
    Quoted(String),
    /// Text read up to the next divider (or `=`, for keys).
    Bare(String),
}

impl Term {
    fn into_string(self) -> String {
        match self {
            Term::Quoted(s) | Term::Bare(s) => s,
        }
    }
}

/// Tokenize a single option string.
///
/// Never fails: text that does not form an option is skipped, so malformed
/// input yields a partial (possibly empty) set.
pub fn tokenize(input: &str) -> ParsedSet {
    let mut tokenizer = Tokenizer::new(input);
    tokenizer.run();
    tokenizer.results
}

/// Coerce unquoted value text into a typed value.
///
/// `true`, `false` and `null` match case-insensitively. Integers are an
/// optional `-` then digits, clamped to the `i64` range; decimals need digits
/// on both sides of the dot.
pub fn coerce(raw: &str) -> OptionValue {
    match raw.to_lowercase().as_str() {
        "true" => return OptionValue::Boolean(true),
        "false" => return OptionValue::Boolean(false),
        "null" => return OptionValue::Null,
        _ => {}
    }

    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    if is_digits(unsigned) {
        // Only overflow can fail here
        let n = raw.parse::<i64>().unwrap_or(if raw.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        });
        return OptionValue::Integer(n);
    }

    if let Some((whole, fraction)) = unsigned.split_once('.') {
        if is_digits(whole) && is_digits(fraction) {
            if let Ok(n) = raw.parse::<f64>() {
                return OptionValue::Float(n);
            }
        }
    }

    OptionValue::String(raw.to_string())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_divider(c: char) -> bool {
    DIVIDERS.contains(&c)
}

/// Internal tokenizer state.
struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    results: ParsedSet,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            results: ParsedSet::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            // Nothing can start a key here
            if is_divider(c) || c == '=' {
                self.pos += 1;
                continue;
            }
            self.read_option();
        }
    }

    fn read_option(&mut self) {
        let key = self.read_term(true);

        let (key, value) = if self.peek() == Some('=') {
            self.pos += 1;
            let value = match self.read_term(false) {
                Term::Quoted(s) => OptionValue::String(s),
                Term::Bare(s) => coerce(&s),
            };
            (key.into_string(), value)
        } else {
            apply_modifiers(key.into_string())
        };

        if key.is_empty() {
            return;
        }
        trace!(key = %key, value = ?value, "tokenized option");
        self.results.insert(key, value);
    }

    /// Read a quoted run if one closes, otherwise a bare run.
    fn read_term(&mut self, is_key: bool) -> Term {
        if let Some(quote @ ('"' | '\'')) = self.peek() {
            if let Some(text) = self.read_quoted(quote) {
                return Term::Quoted(text);
            }
        }
        Term::Bare(self.read_bare(is_key))
    }

    /// Read `quote ... quote`, un-escaping `\0` to NUL and any other `\X` to
    /// `X`.
    ///
    /// Leaves the position untouched and returns `None` when the run never
    /// closes.
    fn read_quoted(&mut self, quote: char) -> Option<String> {
        let mut text = String::new();
        let mut i = self.pos + 1;

        while let Some(&c) = self.chars.get(i) {
            if c == '\\' {
                let escaped = *self.chars.get(i + 1)?;
                text.push(if escaped == '0' { '\0' } else { escaped });
                i += 2;
            } else if c == quote {
                self.pos = i + 1;
                return Some(text);
            } else {
                text.push(c);
                i += 1;
            }
        }

        None
    }

    /// Read up to the next divider. Keys also stop at `=`.
    fn read_bare(&mut self, is_key: bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_divider(c) || (is_key && c == '=') {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

/// Resolve the value of a key given without `=value`.
fn apply_modifiers(key: String) -> (String, OptionValue) {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if NEGATIVE_MODIFIERS.contains(&c) => {
            (chars.as_str().to_string(), OptionValue::Boolean(false))
        }
        Some(c) if POSITIVE_MODIFIERS.contains(&c) => {
            (chars.as_str().to_string(), OptionValue::Boolean(true))
        }
        _ => (key, OptionValue::Boolean(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(input: &str) -> Vec<(String, OptionValue)> {
        tokenize(input).into_iter().collect()
    }

    fn pair(key: &str, value: impl Into<OptionValue>) -> Vec<(String, OptionValue)> {
        vec![(key.to_string(), value.into())]
    }

    #[test]
    fn test_bare_key_is_true() {
        assert_eq!(single("a"), pair("a", true));
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(single("+a"), pair("a", true));
        assert_eq!(single("-a"), pair("a", false));
        assert_eq!(single("!a"), pair("a", false));
    }

    #[test]
    fn test_only_one_modifier_is_stripped() {
        assert_eq!(single("--a"), pair("-a", false));
        assert_eq!(single("!+a"), pair("+a", false));
    }

    #[test]
    fn test_modifier_ignored_when_value_given() {
        assert_eq!(single("-a=5"), pair("-a", 5));
        assert_eq!(single("!a=x"), pair("!a", "x"));
    }

    #[test]
    fn test_modifier_applies_to_quoted_key() {
        assert_eq!(single("\"!a b\""), pair("a b", false));
    }

    #[test]
    fn test_modifier_alone_is_discarded() {
        assert!(tokenize("!").is_empty());
        assert!(tokenize("- + !").is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" ").is_empty());
        assert!(tokenize(" ,\t\r\n").is_empty());
    }

    #[test]
    fn test_unquoted_coercion() {
        assert_eq!(single("a="), pair("a", ""));
        assert_eq!(single("a=z"), pair("a", "z"));
        assert_eq!(single("a=true"), pair("a", true));
        assert_eq!(single("a=TRUE"), pair("a", true));
        assert_eq!(single("a=False"), pair("a", false));
        assert_eq!(single("a=null"), pair("a", OptionValue::Null));
        assert_eq!(single("a=NULL"), pair("a", OptionValue::Null));
        assert_eq!(single("a=100"), pair("a", 100));
        assert_eq!(single("a=-999"), pair("a", -999));
        assert_eq!(single("a=123.456"), pair("a", 123.456));
        assert_eq!(single("a=-999.333"), pair("a", -999.333));
    }

    #[test]
    fn test_near_numbers_stay_strings() {
        assert_eq!(single("a=a100"), pair("a", "a100"));
        assert_eq!(single("a=100z"), pair("a", "100z"));
        assert_eq!(single("a=a123.456"), pair("a", "a123.456"));
        assert_eq!(single("a=123.456z"), pair("a", "123.456z"));
        assert_eq!(single("a=+5"), pair("a", "+5"));
        assert_eq!(single("a=1."), pair("a", "1."));
        assert_eq!(single("a=.5"), pair("a", ".5"));
        assert_eq!(single("a=1e5"), pair("a", "1e5"));
        assert_eq!(single("a=1.2.3"), pair("a", "1.2.3"));
        assert_eq!(single("a=-"), pair("a", "-"));
    }

    #[test]
    fn test_integer_overflow_is_clamped() {
        assert_eq!(
            single("a=99999999999999999999"),
            pair("a", OptionValue::Integer(i64::MAX))
        );
        assert_eq!(
            single("a=-99999999999999999999"),
            pair("a", OptionValue::Integer(i64::MIN))
        );
        assert_eq!(
            single("a=9223372036854775807"),
            pair("a", OptionValue::Integer(i64::MAX))
        );
    }

    #[test]
    fn test_quoted_values_are_literal() {
        assert_eq!(single("a=\"\""), pair("a", ""));
        assert_eq!(single("a=\"z\""), pair("a", "z"));
        assert_eq!(single("a=\"true\""), pair("a", "true"));
        assert_eq!(single("a=\"null\""), pair("a", "null"));
        assert_eq!(single("a=\"123\""), pair("a", "123"));
        assert_eq!(single("a=''"), pair("a", ""));
        assert_eq!(single("a='false'"), pair("a", "false"));
        assert_eq!(single("a='123.5'"), pair("a", "123.5"));
    }

    #[test]
    fn test_quotes_of_the_other_kind_are_literal() {
        assert_eq!(single("a=\"'\""), pair("a", "'"));
        assert_eq!(single("a='\"'"), pair("a", "\""));
    }

    #[test]
    fn test_quoted_keys() {
        assert_eq!(single("\"a a\"=a"), pair("a a", "a"));
        assert_eq!(single("\"a\"=\"a\""), pair("a", "a"));
        assert_eq!(single("'a a'='a'"), pair("a a", "a"));
    }

    #[test]
    fn test_empty_quoted_key_is_discarded() {
        assert!(tokenize("\"\"=x").is_empty());
        assert!(tokenize("''").is_empty());
    }

    #[test]
    fn test_escaping_inside_quotes() {
        let parsed = tokenize(r#"d2="\"12" e2='\'999' "hi \"the"=xyz1 'hallo \'!'=xyz2"#);
        assert_eq!(parsed.get("d2"), Some(&OptionValue::from("\"12")));
        assert_eq!(parsed.get("e2"), Some(&OptionValue::from("'999")));
        assert_eq!(parsed.get("hi \"the"), Some(&OptionValue::from("xyz1")));
        assert_eq!(parsed.get("hallo '!"), Some(&OptionValue::from("xyz2")));
    }

    #[test]
    fn test_backslash_escapes_itself() {
        assert_eq!(single(r#"a="x\\y""#), pair("a", "x\\y"));
    }

    #[test]
    fn test_escaped_zero_is_nul() {
        assert_eq!(single(r#"a="x\0y""#), pair("a", "x\0y"));
        assert_eq!(single(r"'k\0'=1"), pair("k\0", OptionValue::Integer(1)));
        assert_eq!(single(r#"a="x\\0y""#), pair("a", "x\\0y"));
    }

    #[test]
    fn test_backslashes_outside_quotes_are_literal() {
        assert_eq!(single(r#"a\""#), pair("a\\\"", true));
        assert_eq!(single(r#"a=b\""#), pair("a", "b\\\""));
        assert_eq!(single(r"a\'"), pair("a\\'", true));
        assert_eq!(single(r"a=b\'"), pair("a", "b\\'"));
    }

    #[test]
    fn test_unclosed_quote_is_read_bare() {
        assert_eq!(single("a='blah"), pair("a", "'blah"));
        assert_eq!(single("\"abc"), pair("\"abc", true));
    }

    #[test]
    fn test_trailing_backslash_cannot_close_quote() {
        assert_eq!(single(r#""abc\""#), pair("\"abc\\\"", true));
    }

    #[test]
    fn test_dividers_inside_quotes() {
        assert_eq!(single("a=\"x, y\tz\""), pair("a", "x, y\tz"));
        assert_eq!(single("'k=v'"), pair("k=v", true));
    }

    #[test]
    fn test_value_may_contain_equals_and_quotes() {
        assert_eq!(single("a=b=c"), pair("a", "b=c"));
        assert_eq!(single("a=x\"y\""), pair("a", "x\"y\""));
    }

    #[test]
    fn test_leading_equals_is_skipped() {
        assert_eq!(single("=abc"), pair("abc", true));
        assert_eq!(single("==a=1"), pair("a", 1));
    }

    #[test]
    fn test_text_after_quoted_run_starts_new_option() {
        let parsed: Vec<_> = tokenize(" a=\"null\"b ").into_iter().collect();
        assert_eq!(
            parsed,
            vec![
                ("a".to_string(), OptionValue::from("null")),
                ("b".to_string(), OptionValue::Boolean(true)),
            ]
        );

        let parsed: Vec<_> = tokenize("\"abc\"def=x").into_iter().collect();
        assert_eq!(
            parsed,
            vec![
                ("abc".to_string(), OptionValue::Boolean(true)),
                ("def".to_string(), OptionValue::from("x")),
            ]
        );
    }

    #[test]
    fn test_commas_and_whitespace_separate() {
        let parsed: Vec<_> = tokenize("a=1,b\nc\td").into_iter().collect();
        assert_eq!(
            parsed,
            vec![
                ("a".to_string(), OptionValue::Integer(1)),
                ("b".to_string(), OptionValue::Boolean(true)),
                ("c".to_string(), OptionValue::Boolean(true)),
                ("d".to_string(), OptionValue::Boolean(true)),
            ]
        );
    }

    #[test]
    fn test_symbols_in_keys() {
        assert_eq!(single("&&&&&&&a=b"), pair("&&&&&&&a", "b"));
        assert_eq!(single("!@#$%^&*()=abc"), pair("!@#$%^&*()", "abc"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        assert_eq!(
            single("-a a a=null a=\"true\" a='blah'"),
            pair("a", "blah")
        );
    }

    #[test]
    fn test_repeated_key_keeps_first_position() {
        let keys: Vec<_> = tokenize("b a b=2").into_keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_mixed_forms() {
        let parsed = tokenize(
            r#"a b= c=12 c2=12.3 d="12" e='999' "hello there",'this is a test'="ok""#,
        );
        assert_eq!(parsed.get("a"), Some(&OptionValue::Boolean(true)));
        assert_eq!(parsed.get("b"), Some(&OptionValue::from("")));
        assert_eq!(parsed.get("c"), Some(&OptionValue::Integer(12)));
        assert_eq!(parsed.get("c2"), Some(&OptionValue::Float(12.3)));
        assert_eq!(parsed.get("d"), Some(&OptionValue::from("12")));
        assert_eq!(parsed.get("e"), Some(&OptionValue::from("999")));
        assert_eq!(parsed.get("hello there"), Some(&OptionValue::Boolean(true)));
        assert_eq!(parsed.get("this is a test"), Some(&OptionValue::from("ok")));
        assert_eq!(parsed.len(), 8);
    }

    #[test]
    fn test_multibyte_keys() {
        assert_eq!(single("!héllo"), pair("héllo", false));
        assert_eq!(single("ключ=значение"), pair("ключ", "значение"));
    }
}
