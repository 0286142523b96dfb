//! Database operations for `video_candidates`.
//!
//! Rows are append-only: re-running discovery for an analysis adds new rows
//! next to the old ones.

use chrono::{DateTime, Utc};
use reviewscope_core::{
    DiscoverySource, LlmType, Locale, NewVideoCandidate, SortDirection, SortKey, VideoCandidate,
    VideoQuery,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{parse_column, parse_optional_column, DbError};

/// Rows per multi-row `INSERT`; 17 binds each keeps a chunk well under the
/// Postgres bind-parameter limit.
const INSERT_CHUNK_SIZE: usize = 500;

const CANDIDATE_COLUMNS: &str = "id, analysis_id, product_name, raw_input, input_search_type, \
     locale, model, discovery_source, title, description, video_url, thumbnails, \
     view_count, like_count, comment_count, favorite_count, average_interaction, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoCandidateRow {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub product_name: String,
    pub raw_input: String,
    pub input_search_type: String,
    pub locale: Option<String>,
    pub model: Option<String>,
    pub discovery_source: String,
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

impl TryFrom<VideoCandidateRow> for VideoCandidate {
    type Error = DbError;

    fn try_from(row: VideoCandidateRow) -> Result<Self, Self::Error> {
        let discovery_source =
            DiscoverySource::from_db(&row.discovery_source).ok_or_else(|| DbError::InvalidValue {
                column: "discovery_source",
                value: row.discovery_source.clone(),
            })?;

        Ok(VideoCandidate {
            id: row.id,
            analysis_id: row.analysis_id,
            input_search_type: parse_column("input_search_type", &row.input_search_type)?,
            locale: parse_optional_column::<Locale>("locale", row.locale.as_deref())?,
            model: parse_optional_column::<LlmType>("model", row.model.as_deref())?,
            discovery_source,
            product_name: row.product_name,
            raw_input: row.raw_input,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            thumbnails: row.thumbnails,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            favorite_count: row.favorite_count,
            average_interaction: row.average_interaction,
            created_at: row.created_at,
        })
    }
}

/// Bulk-inserts candidates in a single transaction and returns the number written.
///
/// Either every row is written or none are.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails.
pub async fn insert_video_candidates(
    pool: &PgPool,
    candidates: &[NewVideoCandidate],
) -> Result<u64, DbError> {
    if candidates.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written = 0_u64;

    for chunk in candidates.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO video_candidates \
                 (id, analysis_id, product_name, raw_input, input_search_type, locale, model, \
                  discovery_source, title, description, video_url, thumbnails, \
                  view_count, like_count, comment_count, favorite_count, average_interaction) ",
        );
        builder.push_values(chunk, |mut row, c| {
            row.push_bind(Uuid::new_v4())
                .push_bind(c.analysis_id)
                .push_bind(&c.product_name)
                .push_bind(&c.raw_input)
                .push_bind(c.input_search_type.as_str())
                .push_bind(c.locale.map(Locale::as_str))
                .push_bind(c.model.map(LlmType::as_str))
                .push_bind(c.discovery_source.as_str())
                .push_bind(&c.title)
                .push_bind(&c.description)
                .push_bind(&c.video_url)
                .push_bind(&c.thumbnails)
                .push_bind(c.view_count.max(0))
                .push_bind(c.like_count.max(0))
                .push_bind(c.comment_count.max(0))
                .push_bind(c.favorite_count.max(0))
                .push_bind(c.average_interaction);
        });

        let result = builder.build().execute(&mut *tx).await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Lists candidates for one analysis whose raw input or product name equals
/// `query.input`, optionally restricted to a locale.
///
/// Rows are ordered by the requested sort keys, then in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidValue`] if a stored tag no longer parses.
pub async fn list_video_candidates(
    pool: &PgPool,
    query: &VideoQuery,
) -> Result<Vec<VideoCandidate>, DbError> {
    let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
        "SELECT {CANDIDATE_COLUMNS} FROM video_candidates WHERE (raw_input = "
    ));
    builder
        .push_bind(&query.input)
        .push(" OR product_name = ")
        .push_bind(&query.input)
        .push(") AND analysis_id = ")
        .push_bind(query.analysis_id);

    if let Some(locale) = query.locale {
        builder.push(" AND locale = ").push_bind(locale.as_str());
    }

    builder.push(" ORDER BY ").push(order_by_clause(&query.sort));

    let rows = builder
        .build_query_as::<VideoCandidateRow>()
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(VideoCandidate::try_from).collect()
}

/// Render the ORDER BY list. Column names come from a closed enum, never
/// from request text.
fn order_by_clause(sort: &[SortKey]) -> String {
    let mut parts: Vec<String> = sort
        .iter()
        .map(|key| {
            format!(
                "{} {} NULLS LAST",
                key.field.column(),
                key.direction.as_sql()
            )
        })
        .collect();
    parts.push("seq ASC".to_string());
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewscope_core::{InputType, SortField};

    #[test]
    fn default_order_is_insertion_order() {
        assert_eq!(order_by_clause(&[]), "seq ASC");
    }

    #[test]
    fn sort_keys_render_in_request_order() {
        let clause = order_by_clause(&[
            SortKey {
                field: SortField::LikeCount,
                direction: SortDirection::Desc,
            },
            SortKey {
                field: SortField::AverageInteraction,
                direction: SortDirection::Asc,
            },
        ]);
        assert_eq!(
            clause,
            "like_count DESC NULLS LAST, average_interaction ASC NULLS LAST, seq ASC"
        );
    }

    #[test]
    fn row_converts_to_candidate() {
        let row = VideoCandidateRow {
            id: Uuid::new_v4(),
            analysis_id: Uuid::new_v4(),
            product_name: "Product X".to_string(),
            raw_input: "product x".to_string(),
            input_search_type: "text".to_string(),
            locale: None,
            model: Some("gemini".to_string()),
            discovery_source: "secondary_llm".to_string(),
            title: "Unboxing".to_string(),
            description: String::new(),
            video_url: "https://www.tiktok.com/@a/video/1".to_string(),
            thumbnails: String::new(),
            view_count: 10,
            like_count: 2,
            comment_count: 0,
            favorite_count: 0,
            average_interaction: None,
            created_at: Utc::now(),
        };
        let candidate = VideoCandidate::try_from(row).unwrap();
        assert_eq!(candidate.input_search_type, InputType::Text);
        assert_eq!(candidate.model, Some(LlmType::Gemini));
        assert_eq!(candidate.discovery_source, DiscoverySource::SecondaryLlm);
    }
}
