use std::collections::BTreeSet;

use opscore_features::MinuteFeatureRow;
use opscore_scoring::ScoredRow;
use sqlx::{Pool, QueryBuilder, Sqlite};

// Re-export so that clients can avoid having sqlx as a dependency
pub use sqlx::sqlite::SqlitePoolOptions;

pub use error::Error;

mod error;
pub mod model;

/// Rows per multi-row INSERT, kept well under SQLite's bound parameter limit.
const INSERT_CHUNK: usize = 200;

const SCORE_COLUMNS: &str =
    "match_id, participant_id, minute, phase, model_score, manual_score, op_score, final_score_norm";

/// Wrapper around the feature and score tables, so that clients of
/// [`DbHandler`] can remain database agnostic.
#[derive(Debug, Clone)]
pub struct DbHandler {
    pool: Pool<Sqlite>,
}

impl DbHandler {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Replace every stored minute row of the matches present in `rows`.
    ///
    /// Scores of those matches are dropped with them. Returns the number of
    /// rows written.
    pub async fn replace_minute_features(&self, rows: &[MinuteFeatureRow]) -> Result<u64, Error> {
        let match_ids: BTreeSet<&str> = rows.iter().map(|row| row.match_id.as_str()).collect();
        let mut tx = self.pool.begin().await?;

        for match_id in match_ids {
            sqlx::query("DELETE FROM scored_rows WHERE match_id = ?")
                .bind(match_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM minute_features WHERE match_id = ?")
                .bind(match_id)
                .execute(&mut *tx)
                .await?;
        }

        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO minute_features ({}) ",
                model::MinuteFeatureRecord::COLUMNS.join(", ")
            ));
            builder.push_values(chunk, |mut values, row| {
                model::MinuteFeatureRecord::from(row).push_binds(&mut values);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// All minute rows, ordered by match, participant and minute.
    pub async fn get_minute_features(&self) -> Result<Vec<MinuteFeatureRow>, Error> {
        sqlx::query_as::<_, model::MinuteFeatureRecord>(
            "SELECT * FROM minute_features ORDER BY match_id, participant_id, minute",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(MinuteFeatureRow::try_from)
        .collect()
    }

    /// IDs of every match with stored minute rows.
    pub async fn get_match_ids(&self) -> Result<Vec<String>, Error> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT DISTINCT match_id FROM minute_features ORDER BY match_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Replace the whole scored table. Normalization spans every row, so a
    /// partial replacement would leave stale scores behind.
    pub async fn replace_scored_rows(&self, rows: &[ScoredRow]) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM scored_rows").execute(&mut *tx).await?;

        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder =
                QueryBuilder::<Sqlite>::new(format!("INSERT INTO scored_rows ({SCORE_COLUMNS}) "));
            builder.push_values(chunk, |mut values, scored| {
                values
                    .push_bind(scored.row.match_id.clone())
                    .push_bind(scored.row.participant_id)
                    .push_bind(scored.row.minute)
                    .push_bind(scored.phase.to_string())
                    .push_bind(scored.model_score)
                    .push_bind(scored.manual_score)
                    .push_bind(scored.op_score)
                    .push_bind(scored.final_score_norm);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// All scored rows with their minute features, ordered by match,
    /// participant and minute.
    pub async fn get_scored_rows(&self) -> Result<Vec<ScoredRow>, Error> {
        sqlx::query_as::<_, model::ScoredRecord>(
            "SELECT minute_features.*, scored_rows.phase, scored_rows.model_score,
                scored_rows.manual_score, scored_rows.op_score, scored_rows.final_score_norm
            FROM scored_rows INNER JOIN minute_features
                ON minute_features.match_id = scored_rows.match_id
                AND minute_features.participant_id = scored_rows.participant_id
                AND minute_features.minute = scored_rows.minute
            ORDER BY scored_rows.match_id, scored_rows.participant_id, scored_rows.minute",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ScoredRow::try_from)
        .collect()
    }
}
