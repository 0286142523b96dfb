//! Pulling a JSON value out of free-form model output.
//!
//! Models wrap JSON in markdown fences, prepend chatter, or leave trailing
//! commas. [`extract_json_block`] tries, in order: the first fenced block,
//! the whole text, then every embedded `{...}` or `[...]` value, keeping the
//! longest one.

use serde_json::Value;
use thiserror::Error;

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON found in model response: {preview:?}")]
    NoJson { preview: String },

    #[error("model response is not valid JSON: {source}")]
    Invalid {
        #[source]
        source: serde_json::Error,
    },

    #[error("model JSON is missing {expected}")]
    Shape { expected: &'static str },
}

/// Extract the JSON payload from a model response.
///
/// # Errors
///
/// Returns [`ParseError::NoJson`] when nothing resembling JSON is present,
/// or [`ParseError::Invalid`] when no candidate parses.
pub fn extract_json_block(text: &str) -> Result<Value, ParseError> {
    let body = fenced_body(text).unwrap_or(text).trim();

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    // Trailing commas are never valid JSON, so stripping them cannot break
    // a value that would otherwise parse.
    let cleaned = strip_trailing_commas(body);
    match embedded_value(&cleaned) {
        Ok(value) => Ok(value),
        Err(Some(source)) => Err(ParseError::Invalid { source }),
        Err(None) => Err(ParseError::NoJson {
            preview: text.chars().take(PREVIEW_CHARS).collect(),
        }),
    }
}

/// Contents of the first ```` ``` ```` fence, minus an optional language tag.
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_ticks = &text[start + 3..];
    let body_start = after_ticks.find('\n').map_or(0, |nl| {
        let tag = after_ticks[..nl].trim();
        if tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            nl + 1
        } else {
            0
        }
    });
    let body = &after_ticks[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

/// The longest JSON object or array embedded in `text`.
///
/// Every `{` and `[` is tried as a starting point, so bracketed prose ahead
/// of the payload does not hide it. Openers inside an accepted value are
/// skipped. With no value found, returns the first parse error, or `None`
/// when there was nothing to try.
fn embedded_value(text: &str) -> Result<Value, Option<serde_json::Error>> {
    let mut best: Option<(usize, Value)> = None;
    let mut first_error = None;
    let mut resume_at = 0;

    for (start, _) in text.char_indices().filter(|&(_, c)| matches!(c, '{' | '[')) {
        if start < resume_at {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                let len = stream.byte_offset();
                resume_at = start + len;
                let longer = match &best {
                    Some((best_len, _)) => len > *best_len,
                    None => true,
                };
                if longer {
                    best = Some((len, value));
                }
            }
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    best.map(|(_, value)| value).ok_or(first_error)
}

fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Read a non-empty string field from a JSON object.
///
/// # Errors
///
/// Returns [`ParseError::Shape`] if the field is absent, not a string, or blank.
pub fn required_string(value: &Value, field: &'static str) -> Result<String, ParseError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ParseError::Shape { expected: field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_parses() {
        assert_eq!(
            extract_json_block(r#"{"name": "X"}"#).unwrap(),
            json!({"name": "X"})
        );
    }

    #[test]
    fn fenced_json_parses() {
        let text = "Sure! Here you go:\n```json\n{\"products\": []}\n```\nAnything else?";
        assert_eq!(extract_json_block(text).unwrap(), json!({"products": []}));
    }

    #[test]
    fn unlabelled_fence_parses() {
        let text = "```\n[1, 2]\n```";
        assert_eq!(extract_json_block(text).unwrap(), json!([1, 2]));
    }

    #[test]
    fn chatter_around_object_is_ignored() {
        let text = "The product is {\"name\": \"Product X\"} as requested.";
        assert_eq!(
            extract_json_block(text).unwrap(),
            json!({"name": "Product X"})
        );
    }

    #[test]
    fn bracketed_prose_before_object_is_skipped() {
        let text = "Here are the top [2] review videos:\n\
                    {\"products\": [{\"name\": \"A\"}, {\"name\": \"B\"}]}";
        assert_eq!(
            extract_json_block(text).unwrap(),
            json!({"products": [{"name": "A"}, {"name": "B"}]})
        );
    }

    #[test]
    fn unbalanced_bracket_in_prose_is_skipped() {
        let text = "Results (see [note below:\n{\"name\": \"Product X\"}\nThat's all.";
        assert_eq!(
            extract_json_block(text).unwrap(),
            json!({"name": "Product X"})
        );
    }

    #[test]
    fn longest_embedded_value_wins() {
        let text = "Option [1] of [3]: [{\"name\": \"A\"}, {\"name\": \"B\",}] done";
        assert_eq!(
            extract_json_block(text).unwrap(),
            json!([{"name": "A"}, {"name": "B"}])
        );
    }

    #[test]
    fn trailing_commas_are_tolerated() {
        let text = "{\n  \"name\": \"Product, X\",\n}";
        assert_eq!(
            extract_json_block(text).unwrap(),
            json!({"name": "Product, X"})
        );
    }

    #[test]
    fn prose_without_json_is_no_json() {
        let err = extract_json_block("I could not find any videos.").unwrap_err();
        assert!(matches!(err, ParseError::NoJson { .. }));
    }

    #[test]
    fn broken_json_is_invalid() {
        let err = extract_json_block("{\"name\": }").unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn required_string_rejects_blank_and_missing() {
        let value = json!({"name": "  ", "productName": " Product X "});
        assert_eq!(
            required_string(&value, "productName").unwrap(),
            "Product X"
        );
        assert!(matches!(
            required_string(&value, "name"),
            Err(ParseError::Shape { expected: "name" })
        ));
        assert!(required_string(&value, "brand").is_err());
    }
}
