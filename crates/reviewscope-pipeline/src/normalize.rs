//! Reshaping heterogeneous discovery payloads into [`NewVideoCandidate`] rows.
//!
//! Model output is loosely typed: counts arrive as numbers, as `"1,234"`, or
//! not at all, and thumbnails as a URL or a resolution map. Every field is
//! kept as a raw [`Value`] until normalization so no item is dropped for a
//! missing or oddly typed field.

use reviewscope_core::{DiscoverySource, InputType, LlmType, Locale, NewVideoCandidate};
use reviewscope_providers::YouTubeVideo;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::llm_json::ParseError;

/// One discovered item before normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCandidate {
    pub name: Value,
    pub title: Value,
    pub description: Value,
    pub video_url: Value,
    pub thumbnails: Value,
    pub view_count: Value,
    pub like_count: Value,
    pub comment_count: Value,
    pub favorite_count: Value,
    /// Only known for direct search results.
    #[serde(skip)]
    pub average_interaction: Option<f64>,
}

impl From<YouTubeVideo> for RawCandidate {
    fn from(video: YouTubeVideo) -> Self {
        let mut thumbnails = Map::new();
        for (size, url) in [
            ("default", video.thumbnails.default),
            ("medium", video.thumbnails.medium),
            ("high", video.thumbnails.high),
        ] {
            if let Some(url) = url {
                thumbnails.insert(size.to_string(), Value::String(url));
            }
        }

        Self {
            name: Value::Null,
            title: Value::String(video.title),
            description: Value::String(video.description),
            video_url: Value::String(video.video_url),
            thumbnails: Value::Object(thumbnails),
            view_count: Value::from(video.view_count),
            like_count: Value::from(video.like_count),
            comment_count: Value::from(video.comment_count),
            favorite_count: Value::from(video.favorite_count),
            average_interaction: Some(video.average_interaction),
        }
    }
}

/// Read the `products` array of a discovery response.
///
/// A bare top-level array is accepted too. Entries that are not objects are
/// skipped.
///
/// # Errors
///
/// Returns [`ParseError::Shape`] when there is no product list at all.
pub fn parse_products(value: Value) -> Result<Vec<RawCandidate>, ParseError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("products") {
            Some(Value::Array(items)) => items,
            _ => return Err(ParseError::Shape { expected: "products" }),
        },
        _ => return Err(ParseError::Shape { expected: "products" }),
    };

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<RawCandidate>(item).ok())
        .collect())
}

/// Coerce a loosely typed count to a non-negative integer.
///
/// Thousands separators are removed and the leading integer is taken, so
/// `"1,234"` is 1234 and `"12.9k"` is 12. Anything unparseable is 0.
#[must_use]
pub fn clean_numeric_value(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(truncate_f64)),
        Value::String(s) => leading_integer(&s.replace(',', "")),
        _ => None,
    };
    parsed.unwrap_or(0).max(0)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_f64(f: f64) -> i64 {
    // `as` saturates at the i64 bounds.
    f.trunc() as i64
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    if negative {
        return Some(0);
    }
    // Only digits remain, so a parse failure means overflow.
    Some(rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX))
}

/// Reduce a thumbnail field to a single URL.
///
/// A string passes through. A resolution map yields `high`, then `default`;
/// each entry may itself be a URL or an object with a `url`.
#[must_use]
pub fn normalize_thumbnail(value: &Value) -> String {
    match value {
        Value::String(url) => url.clone(),
        Value::Object(map) => ["high", "default"]
            .iter()
            .filter_map(|size| map.get(*size))
            .filter_map(thumbnail_url)
            .find(|url| !url.is_empty())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn thumbnail_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Analysis-level fields copied onto every candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateContext {
    pub analysis_id: Uuid,
    pub raw_input: String,
    pub product_name: String,
    pub input_search_type: InputType,
    pub locale: Option<Locale>,
    pub model: Option<LlmType>,
}

/// Build an insertable row from a raw item. `raw` is left untouched.
#[must_use]
pub fn normalize_candidate(
    ctx: &CandidateContext,
    source: DiscoverySource,
    raw: &RawCandidate,
) -> NewVideoCandidate {
    let name = text_value(&raw.name);
    let title = if name.is_empty() {
        text_value(&raw.title)
    } else {
        name
    };

    NewVideoCandidate {
        analysis_id: ctx.analysis_id,
        product_name: ctx.product_name.clone(),
        raw_input: ctx.raw_input.clone(),
        input_search_type: ctx.input_search_type,
        locale: ctx.locale,
        model: ctx.model,
        discovery_source: source,
        title,
        description: text_value(&raw.description),
        video_url: text_value(&raw.video_url),
        thumbnails: normalize_thumbnail(&raw.thumbnails),
        view_count: clean_numeric_value(&raw.view_count),
        like_count: clean_numeric_value(&raw.like_count),
        comment_count: clean_numeric_value(&raw.comment_count),
        favorite_count: clean_numeric_value(&raw.favorite_count),
        average_interaction: raw.average_interaction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewscope_providers::ThumbnailSet;
    use serde_json::json;

    #[test]
    fn clean_numeric_value_handles_source_shapes() {
        assert_eq!(clean_numeric_value(&json!("1,234")), 1234);
        assert_eq!(clean_numeric_value(&json!("")), 0);
        assert_eq!(clean_numeric_value(&Value::Null), 0);
        assert_eq!(clean_numeric_value(&json!(42)), 42);
        assert_eq!(clean_numeric_value(&json!("lots")), 0);
        assert_eq!(clean_numeric_value(&json!(true)), 0);
        assert_eq!(clean_numeric_value(&json!({"n": 1})), 0);
    }

    #[test]
    fn clean_numeric_value_takes_leading_integer() {
        assert_eq!(clean_numeric_value(&json!("12.9k")), 12);
        assert_eq!(clean_numeric_value(&json!("  7 views")), 7);
        assert_eq!(clean_numeric_value(&json!(4.7)), 4);
        assert_eq!(clean_numeric_value(&json!("1,000,000")), 1_000_000);
    }

    #[test]
    fn clean_numeric_value_is_never_negative() {
        assert_eq!(clean_numeric_value(&json!(-5)), 0);
        assert_eq!(clean_numeric_value(&json!("-1,200")), 0);
        assert_eq!(clean_numeric_value(&json!(-0.5)), 0);
    }

    #[test]
    fn clean_numeric_value_saturates_on_overflow() {
        assert_eq!(clean_numeric_value(&json!(u64::MAX)), i64::MAX);
        assert_eq!(
            clean_numeric_value(&json!("99999999999999999999999")),
            i64::MAX
        );
    }

    #[test]
    fn thumbnail_prefers_high_then_default() {
        assert_eq!(normalize_thumbnail(&json!({"default": "a", "high": "b"})), "b");
        assert_eq!(normalize_thumbnail(&json!({"default": "a"})), "a");
        assert_eq!(normalize_thumbnail(&json!({"default": "a", "high": ""})), "a");
        assert_eq!(normalize_thumbnail(&json!("https://img/x.jpg")), "https://img/x.jpg");
        assert_eq!(normalize_thumbnail(&json!({"medium": "m"})), "");
        assert_eq!(normalize_thumbnail(&Value::Null), "");
    }

    #[test]
    fn thumbnail_accepts_url_objects() {
        let value = json!({"high": {"url": "h", "width": 480}, "default": {"url": "d"}});
        assert_eq!(normalize_thumbnail(&value), "h");
    }

    #[test]
    fn parse_products_accepts_object_or_array() {
        let from_object =
            parse_products(json!({"products": [{"name": "A"}, "junk", {"title": "B"}]})).unwrap();
        assert_eq!(from_object.len(), 2);
        assert_eq!(from_object[0].name, json!("A"));
        assert_eq!(from_object[1].title, json!("B"));

        let from_array = parse_products(json!([{"name": "A"}])).unwrap();
        assert_eq!(from_array.len(), 1);
    }

    #[test]
    fn parse_products_without_list_is_shape_error() {
        assert!(matches!(
            parse_products(json!({"items": []})),
            Err(ParseError::Shape { expected: "products" })
        ));
        assert!(parse_products(json!("none")).is_err());
    }

    fn ctx() -> CandidateContext {
        CandidateContext {
            analysis_id: Uuid::nil(),
            raw_input: "https://www.youtube.com/watch?v=abc123".to_string(),
            product_name: "Product X".to_string(),
            input_search_type: InputType::Youtube,
            locale: Some(Locale::Vi),
            model: None,
        }
    }

    #[test]
    fn normalize_fills_defaults_for_missing_fields() {
        let raw = parse_products(json!({
            "products": [{"title": "Only a title", "viewCount": "3,400"}]
        }))
        .unwrap()
        .remove(0);
        let row = normalize_candidate(&ctx(), DiscoverySource::PrimaryLlm, &raw);

        assert_eq!(row.title, "Only a title");
        assert_eq!(row.description, "");
        assert_eq!(row.video_url, "");
        assert_eq!(row.thumbnails, "");
        assert_eq!(row.view_count, 3400);
        assert_eq!(row.like_count, 0);
        assert_eq!(row.average_interaction, None);
        assert_eq!(row.product_name, "Product X");
        assert_eq!(row.discovery_source, DiscoverySource::PrimaryLlm);
    }

    #[test]
    fn normalize_prefers_name_over_title() {
        let raw = RawCandidate {
            name: json!("Named"),
            title: json!("Titled"),
            ..RawCandidate::default()
        };
        let row = normalize_candidate(&ctx(), DiscoverySource::SecondaryLlm, &raw);
        assert_eq!(row.title, "Named");
    }

    #[test]
    fn youtube_video_keeps_stats_and_interaction() {
        let video = YouTubeVideo {
            id: "abc123defgh".to_string(),
            title: "Product X Review".to_string(),
            description: "desc".to_string(),
            thumbnails: ThumbnailSet {
                default: Some("d.jpg".to_string()),
                medium: None,
                high: Some("h.jpg".to_string()),
            },
            view_count: 1000,
            like_count: 50,
            comment_count: 10,
            favorite_count: 0,
            average_interaction: 0.06,
            video_url: "https://www.youtube.com/watch?v=abc123defgh".to_string(),
        };
        let raw = RawCandidate::from(video);
        let row = normalize_candidate(&ctx(), DiscoverySource::YoutubeSearch, &raw);

        assert_eq!(row.title, "Product X Review");
        assert_eq!(row.thumbnails, "h.jpg");
        assert_eq!(row.view_count, 1000);
        assert_eq!(row.like_count, 50);
        assert_eq!(row.average_interaction, Some(0.06));
        assert_eq!(row.video_url, "https://www.youtube.com/watch?v=abc123defgh");
    }
}
