//! Analysis and video-candidate records plus the sort vocabulary used when
//! listing candidates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::input::InputType;
use crate::tags::{LlmType, Locale};

/// A resolved product name for one `(input, locale, model)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub input: String,
    pub input_type: InputType,
    /// Empty when name cleaning degraded; such analyses never get candidates.
    pub product_name: String,
    pub locale: Option<Locale>,
    pub model: Option<LlmType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    #[must_use]
    pub fn key(&self) -> AnalysisKey {
        AnalysisKey {
            input: self.input.clone(),
            locale: self.locale,
            model: self.model,
        }
    }

    #[must_use]
    pub fn has_product_name(&self) -> bool {
        !self.product_name.trim().is_empty()
    }
}

/// Lookup key for an analysis. `None` tags match only `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    pub input: String,
    pub locale: Option<Locale>,
    pub model: Option<LlmType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnalysis {
    pub input: String,
    pub input_type: InputType,
    pub product_name: String,
    pub locale: Option<Locale>,
    pub model: Option<LlmType>,
}

/// Which discovery strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    YoutubeSearch,
    PrimaryLlm,
    SecondaryLlm,
}

impl DiscoverySource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiscoverySource::YoutubeSearch => "youtube_search",
            DiscoverySource::PrimaryLlm => "primary_llm",
            DiscoverySource::SecondaryLlm => "secondary_llm",
        }
    }

    #[must_use]
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "youtube_search" => Some(DiscoverySource::YoutubeSearch),
            "primary_llm" => Some(DiscoverySource::PrimaryLlm),
            "secondary_llm" => Some(DiscoverySource::SecondaryLlm),
            _ => None,
        }
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized candidate row ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideoCandidate {
    pub analysis_id: Uuid,
    pub product_name: String,
    pub raw_input: String,
    pub input_search_type: InputType,
    pub locale: Option<Locale>,
    pub model: Option<LlmType>,
    pub discovery_source: DiscoverySource,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnails: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub favorite_count: i64,
    pub average_interaction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub product_name: String,
    pub raw_input: String,
    pub input_search_type: InputType,
    pub locale: Option<Locale>,
    pub model: Option<LlmType>,
    pub discovery_source: DiscoverySource,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnails: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub favorite_count: i64,
    pub average_interaction: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Engagement fields a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    ViewCount,
    LikeCount,
    CommentCount,
    FavoriteCount,
    AverageInteraction,
}

impl SortField {
    /// Accepts the camelCase names used by clients. Anything else is `None`.
    #[must_use]
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "viewCount" => Some(SortField::ViewCount),
            "likeCount" => Some(SortField::LikeCount),
            "commentCount" => Some(SortField::CommentCount),
            "favoriteCount" => Some(SortField::FavoriteCount),
            "averageInteraction" => Some(SortField::AverageInteraction),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            SortField::ViewCount => "viewCount",
            SortField::LikeCount => "likeCount",
            SortField::CommentCount => "commentCount",
            SortField::FavoriteCount => "favoriteCount",
            SortField::AverageInteraction => "averageInteraction",
        }
    }

    /// Column name in `video_candidates`.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            SortField::ViewCount => "view_count",
            SortField::LikeCount => "like_count",
            SortField::CommentCount => "comment_count",
            SortField::FavoriteCount => "favorite_count",
            SortField::AverageInteraction => "average_interaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `DESC` in any case is descending; every other value is ascending.
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    /// Build an ordered sort list from request parameters.
    ///
    /// Both `viewCount=DESC` and `sort[viewCount]=DESC` are understood.
    /// Parameters that do not name a sort field are skipped, and a field
    /// named more than once keeps its first position and direction.
    pub fn from_params<I, K, V>(params: I) -> Vec<SortKey>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut keys: Vec<SortKey> = Vec::new();
        for (name, value) in params {
            let name = name.as_ref();
            let name = name
                .strip_prefix("sort[")
                .and_then(|rest| rest.strip_suffix(']'))
                .unwrap_or(name);
            let Some(field) = SortField::from_param(name) else {
                continue;
            };
            if keys.iter().any(|k| k.field == field) {
                continue;
            }
            keys.push(SortKey {
                field,
                direction: SortDirection::from_param(value.as_ref()),
            });
        }
        keys
    }
}

/// Filter and ordering for a candidate listing.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoQuery {
    /// Matched against either the raw input or the product name.
    pub input: String,
    pub analysis_id: Uuid,
    pub locale: Option<Locale>,
    pub sort: Vec<SortKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_keep_request_order() {
        let keys = SortKey::from_params([
            ("likeCount", "DESC"),
            ("input", "whatever"),
            ("viewCount", "asc"),
        ]);
        assert_eq!(
            keys,
            vec![
                SortKey {
                    field: SortField::LikeCount,
                    direction: SortDirection::Desc,
                },
                SortKey {
                    field: SortField::ViewCount,
                    direction: SortDirection::Asc,
                },
            ]
        );
    }

    #[test]
    fn bracketed_sort_params_are_understood() {
        let keys = SortKey::from_params([("sort[averageInteraction]", "desc")]);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].field, SortField::AverageInteraction);
        assert_eq!(keys[0].direction, SortDirection::Desc);
    }

    #[test]
    fn unknown_direction_defaults_to_ascending() {
        assert_eq!(SortDirection::from_param("sideways"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param(""), SortDirection::Asc);
        assert_eq!(SortDirection::from_param(" Desc "), SortDirection::Desc);
    }

    #[test]
    fn unknown_and_repeated_fields_are_ignored() {
        let keys = SortKey::from_params([
            ("title", "DESC"),
            ("sort[shareCount]", "DESC"),
            ("commentCount", "DESC"),
            ("commentCount", "ASC"),
        ]);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].direction, SortDirection::Desc);
    }

    #[test]
    fn sort_fields_map_to_columns() {
        assert_eq!(SortField::FavoriteCount.column(), "favorite_count");
        assert_eq!(
            SortField::from_param(SortField::ViewCount.as_param()),
            Some(SortField::ViewCount)
        );
    }

    #[test]
    fn analysis_serializes_in_camel_case() {
        let now = Utc::now();
        let analysis = Analysis {
            id: Uuid::nil(),
            input: "earbuds".to_string(),
            input_type: InputType::Text,
            product_name: "Earbuds".to_string(),
            locale: Some(Locale::Vi),
            model: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["inputType"], "text");
        assert_eq!(value["productName"], "Earbuds");
        assert_eq!(value["locale"], "vi");
        assert!(value["model"].is_null());
    }

    #[test]
    fn blank_product_name_is_not_a_name() {
        let now = Utc::now();
        let analysis = Analysis {
            id: Uuid::nil(),
            input: "x".to_string(),
            input_type: InputType::Text,
            product_name: "  ".to_string(),
            locale: None,
            model: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!analysis.has_product_name());
    }

    #[test]
    fn discovery_source_round_trips_through_db_text() {
        for s in [
            DiscoverySource::YoutubeSearch,
            DiscoverySource::PrimaryLlm,
            DiscoverySource::SecondaryLlm,
        ] {
            assert_eq!(DiscoverySource::from_db(s.as_str()), Some(s));
        }
        assert_eq!(DiscoverySource::from_db("manual"), None);
    }
}
