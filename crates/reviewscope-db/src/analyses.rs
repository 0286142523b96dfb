//! Database operations for `analyses`.

use chrono::{DateTime, Utc};
use reviewscope_core::{Analysis, AnalysisKey, LlmType, Locale, NewAnalysis};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{parse_column, parse_optional_column, DbError};

const ANALYSIS_COLUMNS: &str =
    "id, input, input_type, product_name, locale, model, created_at, updated_at";

/// A row from the `analyses` table, with tags still in their text form.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub input: String,
    pub input_type: String,
    pub product_name: String,
    pub locale: Option<String>,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = DbError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(Analysis {
            id: row.id,
            input_type: parse_column("input_type", &row.input_type)?,
            locale: parse_optional_column::<Locale>("locale", row.locale.as_deref())?,
            model: parse_optional_column::<LlmType>("model", row.model.as_deref())?,
            input: row.input,
            product_name: row.product_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Looks up the analysis for an exact `(input, locale, model)` key.
///
/// An unset tag only matches rows where that tag is also unset.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_analysis(pool: &PgPool, key: &AnalysisKey) -> Result<Option<Analysis>, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analyses \
         WHERE input = $1 \
           AND locale IS NOT DISTINCT FROM $2 \
           AND model IS NOT DISTINCT FROM $3 \
         LIMIT 1"
    ))
    .bind(&key.input)
    .bind(key.locale.map(Locale::as_str))
    .bind(key.model.map(LlmType::as_str))
    .fetch_optional(pool)
    .await?;

    row.map(Analysis::try_from).transpose()
}

/// Fetches an analysis by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis(pool: &PgPool, id: Uuid) -> Result<Option<Analysis>, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Analysis::try_from).transpose()
}

/// Inserts an analysis, or returns the existing row for the same key.
///
/// On conflict only `updated_at` is touched, so a product name is never
/// overwritten once stored and two racing creators both get the first row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_analysis(pool: &PgPool, new: &NewAnalysis) -> Result<Analysis, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "INSERT INTO analyses (id, input, input_type, product_name, locale, model) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (input, (COALESCE(locale, '')), (COALESCE(model, ''))) DO UPDATE SET \
             updated_at = NOW() \
         RETURNING {ANALYSIS_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.input)
    .bind(new.input_type.as_str())
    .bind(&new.product_name)
    .bind(new.locale.map(Locale::as_str))
    .bind(new.model.map(LlmType::as_str))
    .fetch_one(pool)
    .await?;

    Analysis::try_from(row)
}

/// Deletes an analysis. Its candidates are removed by the foreign-key cascade.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no analysis has this id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_analysis(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM analyses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
