//! Reader for loosely formatted JSON records.
//!
//! Input corpora frequently use single-quoted string literals (`{'asin': 'B00001'}`). Such
//! literals are rewritten into standard JSON strings before the text is handed to
//! [`serde_json`], so everything else about the grammar stays strict.

use serde_json::{Map, Value};
use std::borrow::Cow;
use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::token::{any, take_till};
use winnow::{ModalResult, Parser};

use crate::bail;
use crate::error::{ErrorKind, IngestResult};

/// Parses a single record line into a JSON object.
///
/// Both double- and single-quoted string literals are accepted. A line whose top-level value
/// is not an object is rejected.
pub fn parse_object(line: &str) -> IngestResult<Map<String, Value>> {
    let normalized = normalize_quotes(line);

    match serde_json::from_str::<Value>(&normalized)? {
        Value::Object(object) => Ok(object),
        other => bail!(
            ErrorKind::InvalidData,
            "Record is not a JSON object",
            format!("top-level value is {}", value_kind(&other))
        ),
    }
}

/// Rewrites single-quoted string literals into double-quoted JSON strings.
///
/// Inside a single-quoted literal a `"` is literal and is escaped on output. In either quote
/// style `\'` stands for a single quote, and other escape sequences pass through unchanged. An
/// unterminated literal runs to the end of the line. Text without single quotes is returned
/// as-is.
pub fn normalize_quotes(input: &str) -> Cow<'_, str> {
    if !input.contains('\'') {
        return Cow::Borrowed(input);
    }

    repeat(0.., alt((unquoted, double_quoted, single_quoted)))
        .fold(String::new, concat)
        .parse(input)
        .map_or(Cow::Borrowed(input), Cow::Owned)
}

fn concat(mut output: String, part: String) -> String {
    output.push_str(&part);
    output
}

fn unquoted(input: &mut &str) -> ModalResult<String> {
    take_till(1.., ['"', '\''])
        .map(str::to_owned)
        .parse_next(input)
}

fn double_quoted(input: &mut &str) -> ModalResult<String> {
    let body = repeat(
        0..,
        alt((take_till(1.., ['"', '\\']).map(str::to_owned), escape)),
    )
    .fold(String::new, concat);

    delimited('"', body, opt('"'))
        .map(|body| format!("\"{body}\""))
        .parse_next(input)
}

fn single_quoted(input: &mut &str) -> ModalResult<String> {
    let body = repeat(
        0..,
        alt((
            take_till(1.., ['\'', '"', '\\']).map(str::to_owned),
            '"'.value(String::from("\\\"")),
            escape,
        )),
    )
    .fold(String::new, concat);

    delimited('\'', body, opt('\''))
        .map(|body| format!("\"{body}\""))
        .parse_next(input)
}

/// `\'` is not a JSON escape and becomes a bare quote; anything else is kept verbatim.
fn escape(input: &mut &str) -> ModalResult<String> {
    preceded(
        '\\',
        alt((
            '\''.value(String::from("'")),
            any.map(|escaped: char| format!("\\{escaped}")),
        )),
    )
    .parse_next(input)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_is_untouched() {
        let line = r#"{"asin": "B00001", "rating": 4}"#;
        assert!(matches!(normalize_quotes(line), Cow::Borrowed(_)));

        let object = parse_object(line).unwrap();
        assert_eq!(object["asin"], "B00001");
    }

    #[test]
    fn single_quoted_literals_are_accepted() {
        let object =
            parse_object("{'asin': '0000031852', 'categories': [['Clothing', 'Girls']]}").unwrap();

        assert_eq!(object["asin"], "0000031852");
        assert_eq!(object["categories"][0][1], "Girls");
    }

    #[test]
    fn mixed_quote_styles_keep_embedded_quotes() {
        let object = parse_object(
            r#"{'title': "Girls' Ballet Tutu", 'description': 'The "best" tutu', 'summary': 'it\'s fine'}"#,
        )
        .unwrap();

        assert_eq!(object["title"], "Girls' Ballet Tutu");
        assert_eq!(object["description"], "The \"best\" tutu");
        assert_eq!(object["summary"], "it's fine");
    }

    #[test]
    fn escaped_single_quote_inside_double_quotes() {
        let object = parse_object(r#"{"asin": "B1", "summary": "it\'s fine"}"#).unwrap();
        assert_eq!(object["summary"], "it's fine");

        let object = parse_object(r#"{"asin": "B1", "text": "say \"hi\", it\'s"}"#).unwrap();
        assert_eq!(object["text"], "say \"hi\", it's");
    }

    #[test]
    fn unterminated_literal_runs_to_end_of_line() {
        assert_eq!(normalize_quotes("{'asin': 'B1"), r#"{"asin": "B1""#);
    }

    #[test]
    fn escapes_inside_single_quotes_pass_through() {
        let object = parse_object(r"{'text': 'line\nbreak'}").unwrap();
        assert_eq!(object["text"], "line\nbreak");
    }

    #[test]
    fn non_object_records_are_rejected() {
        let err = parse_object("['a', 'b']").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn malformed_records_are_deserialization_errors() {
        let err = parse_object("{'asin': 'B00001'").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationError);
    }
}
