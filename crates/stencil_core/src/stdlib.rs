//! Standard library filters.
//!
//! Every template's base context holds these below the data, so a key of the
//! same name in the rendered data shadows them.
//!
//! | Filter | Result |
//! |---|---|
//! | `each(c)` | elements of a collection, positioned for `@key`, `@index`, `@first`, `@last` |
//! | `uppercase(s)`, `lowercase(s)`, `capitalized(s)` | case conversions of the scalar form |
//! | `isEmpty(v)` | `true` when `v` is falsy |
//! | `isBlank(v)` | `true` when `v` is falsy or a whitespace-only string |
//! | `HTMLEscape(s)` | the escaped scalar form, rendered as HTML |

use std::sync::OnceLock;

use crate::content::{escape_html, Rendering};
use crate::error::{RenderError, RenderResult};
use crate::value::{Position, Value};

/// The standard library as a keyed collection of filters.
pub fn standard_library() -> Value {
    static LIBRARY: OnceLock<Value> = OnceLock::new();
    LIBRARY
        .get_or_init(|| {
            Value::map([
                ("each", Value::filter(each)),
                ("uppercase", string_filter("uppercase", str::to_uppercase)),
                ("lowercase", string_filter("lowercase", str::to_lowercase)),
                ("capitalized", string_filter("capitalized", capitalize)),
                ("isEmpty", Value::filter(|value| Ok(Value::from(!value.is_truthy())))),
                ("isBlank", Value::filter(|value| Ok(Value::from(is_blank(&value))))),
                ("HTMLEscape", Value::filter(html_escape)),
            ])
        })
        .clone()
}

/// Positions the elements of a keyed collection or a sequence.
fn each(value: Value) -> RenderResult<Value> {
    if let Some(map) = value.as_map() {
        let len = map.len();
        return Ok(map
            .iter()
            .enumerate()
            .map(|(index, (key, element))| {
                element
                    .clone()
                    .with_position(Position::new(index, len).with_key(key.as_str()))
            })
            .collect());
    }

    if let Some(items) = value.as_sequence() {
        let len = items.len();
        return Ok(items
            .iter()
            .enumerate()
            .map(|(index, element)| element.clone().with_position(Position::new(index, len)))
            .collect());
    }

    if value.is_empty() {
        return Ok(Value::empty());
    }

    Err(RenderError::argument_mismatch(
        "each",
        format!("expected a collection, got {:?}", value.kind()),
    ))
}

fn string_filter(name: &'static str, convert: fn(&str) -> String) -> Value {
    Value::filter(move |value| {
        if value.is_empty() {
            return Ok(Value::empty());
        }
        match value.render_text() {
            Some(text) => Ok(Value::from(convert(&text))),
            None => Err(RenderError::argument_mismatch(
                name,
                format!("expected a scalar, got {:?}", value.kind()),
            )),
        }
    })
}

/// Uppercases the first letter of every word and lowercases the rest.
fn capitalize(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

fn is_blank(value: &Value) -> bool {
    if !value.is_truthy() {
        return true;
    }
    value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn html_escape(value: Value) -> RenderResult<Value> {
    let text = value.render_text().ok_or_else(|| {
        RenderError::argument_mismatch(
            "HTMLEscape",
            format!("expected a scalar, got {:?}", value.kind()),
        )
    })?;
    let escaped = escape_html(&text);
    Ok(Value::render_fn(move |_| Ok(Rendering::html(escaped.clone()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, argument: Value) -> RenderResult<Value> {
        standard_library()
            .lookup(name)
            .and_then(|filter| filter.call_filter(argument))
            .expect("filter exists")
    }

    #[test]
    fn test_each_map_positions() {
        let value = Value::map([("a", 1), ("b", 2)]);
        let result = call("each", value).unwrap();
        let items = result.as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_i64(), Some(1));
        assert_eq!(items[0].position().unwrap().key.as_deref(), Some("a"));
        assert!(items[0].position().unwrap().first);
        assert_eq!(items[1].position().unwrap().key.as_deref(), Some("b"));
        assert!(items[1].position().unwrap().last);
    }

    #[test]
    fn test_each_sequence_positions() {
        let result = call("each", Value::from(["x", "y", "z"])).unwrap();
        let items = result.as_sequence().unwrap();
        assert_eq!(items[1].position(), Some(&Position::new(1, 3)));
        assert_eq!(items[1].position().unwrap().key, None);
    }

    #[test]
    fn test_each_rejects_scalars() {
        assert!(call("each", Value::empty()).unwrap().is_empty());
        let err = call("each", Value::from(3)).unwrap_err();
        assert!(matches!(err, RenderError::ArgumentMismatch { ref filter, .. } if filter == "each"));
    }

    #[test]
    fn test_case_filters() {
        assert_eq!(call("uppercase", Value::from("foo")).unwrap().as_str(), Some("FOO"));
        assert_eq!(call("lowercase", Value::from("FoO")).unwrap().as_str(), Some("foo"));
        assert_eq!(
            call("capitalized", Value::from("hello wORLD")).unwrap().as_str(),
            Some("Hello World")
        );
        assert_eq!(call("uppercase", Value::from(12)).unwrap().as_str(), Some("12"));
        assert!(call("uppercase", Value::empty()).unwrap().is_empty());
        assert!(call("uppercase", Value::from([1])).is_err());
    }

    #[test]
    fn test_emptiness_filters() {
        assert_eq!(call("isEmpty", Value::empty()).unwrap().as_bool(), Some(true));
        assert_eq!(call("isEmpty", Value::from("x")).unwrap().as_bool(), Some(false));
        assert_eq!(call("isBlank", Value::from("  ")).unwrap().as_bool(), Some(true));
        assert_eq!(call("isBlank", Value::from(" x ")).unwrap().as_bool(), Some(false));
    }

    #[test]
    fn test_html_escape_renders_html() {
        let result = call("HTMLEscape", Value::from("<b>")).unwrap();
        assert!(result.has_render_override());
    }
}
