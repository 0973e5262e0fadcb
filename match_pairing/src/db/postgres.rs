//! PostgreSQL implementations of the repository traits.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use log::warn;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow, types::Json};
use std::sync::Arc;

use super::repository::{MatchUpdater, PairingRepository, ParticipantDirectory};
use crate::pairing::{
    EligiblePlayer, MatchFormat, MatchId, MatchInfo, Pair, PairingError, PairingId,
    PairingMetadata, PairingRecord, PairingResult, PairingStatus, PlayerSeeding, TournamentId,
};

const RECORD_COLUMNS: &str = r#"
    id, match_id, tournament_id, batch_id, pairing_type, seeding_method, algorithm_used,
    pairs, metadata, status, version, proposed_by, proposed_at, approved_by, approved_at,
    published_by, published_at, rejected_by, rejected_at, rejection_reason
"#;

/// Map a write error, turning unique violations into conflicts
fn write_error(match_id: MatchId, err: sqlx::Error) -> PairingError {
    let unique_violation =
        matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique_violation {
        PairingError::Conflict { match_id }
    } else {
        PairingError::Storage(err)
    }
}

/// Decode a JSONB column, reporting a malformed document as a bad stored value
fn json_column<T>(row: &PgRow, column: &str) -> PairingResult<T>
where
    T: serde::de::DeserializeOwned + 'static,
{
    row.try_get::<Json<T>, _>(column)
        .map(|json| json.0)
        .map_err(|e| PairingError::InvalidStoredValue(format!("{column}: {e}")))
}

fn record_from_row(row: &PgRow) -> PairingResult<PairingRecord> {
    let utc = |column: &str| -> PairingResult<_> {
        Ok(row
            .try_get::<Option<chrono::NaiveDateTime>, _>(column)?
            .map(|dt| dt.and_utc()))
    };

    Ok(PairingRecord {
        id: row.try_get("id")?,
        match_id: row.try_get("match_id")?,
        tournament_id: row.try_get("tournament_id")?,
        batch_id: row.try_get("batch_id")?,
        pairing_type: row.try_get::<String, _>("pairing_type")?.parse()?,
        seeding_method: row.try_get::<String, _>("seeding_method")?.parse()?,
        algorithm_used: MatchFormat::parse(&row.try_get::<String, _>("algorithm_used")?),
        pairs: json_column(row, "pairs")?,
        metadata: json_column(row, "metadata")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        version: row.try_get("version")?,
        proposed_by: row.try_get("proposed_by")?,
        proposed_at: row
            .try_get::<chrono::NaiveDateTime, _>("proposed_at")?
            .and_utc(),
        approved_by: row.try_get("approved_by")?,
        approved_at: utc("approved_at")?,
        published_by: row.try_get("published_by")?,
        published_at: utc("published_at")?,
        rejected_by: row.try_get("rejected_by")?,
        rejected_at: utc("rejected_at")?,
        rejection_reason: row.try_get("rejection_reason")?,
    })
}

/// Insert `record` and move its match pointer off `expected_current`.
///
/// Runs inside the caller's transaction; nothing is committed here.
async fn insert_and_point(
    conn: &mut PgConnection,
    record: &PairingRecord,
    expected_current: Option<PairingId>,
) -> PairingResult<()> {
    sqlx::query(
        r#"
        INSERT INTO match_pairings (
            id, match_id, tournament_id, batch_id, pairing_type, seeding_method,
            algorithm_used, pairs, metadata, status, version, proposed_by, proposed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(record.id)
    .bind(record.match_id)
    .bind(record.tournament_id)
    .bind(record.batch_id)
    .bind(record.pairing_type.to_string())
    .bind(record.seeding_method.to_string())
    .bind(record.algorithm_used.to_string())
    .bind(Json(&record.pairs))
    .bind(Json(&record.metadata))
    .bind(record.status.to_string())
    .bind(record.version)
    .bind(record.proposed_by)
    .bind(record.proposed_at.naive_utc())
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(record.match_id, e))?;

    // Compare-and-swap on the pointer so concurrent generators cannot both win
    let moved = sqlx::query(
        r#"
        UPDATE matches
        SET current_pairing_id = $1
        WHERE id = $2 AND current_pairing_id IS NOT DISTINCT FROM $3
        "#,
    )
    .bind(record.id)
    .bind(record.match_id)
    .bind(expected_current)
    .execute(&mut *conn)
    .await?;

    if moved.rows_affected() == 0 {
        warn!(
            "Match {} pointer moved away from {:?} before insert",
            record.match_id, expected_current
        );
        return Err(PairingError::Conflict {
            match_id: record.match_id,
        });
    }

    Ok(())
}

/// PostgreSQL implementation of `PairingRepository`
#[derive(Clone)]
pub struct PgPairingRepository {
    pool: Arc<PgPool>,
}

impl PgPairingRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PairingRepository for PgPairingRepository {
    async fn find_match(&self, match_id: MatchId) -> PairingResult<Option<MatchInfo>> {
        let row = sqlx::query(
            "SELECT id, tournament_id, batch_id, match_type, current_pairing_id FROM matches WHERE id = $1",
        )
        .bind(match_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| MatchInfo {
            id: r.get("id"),
            tournament_id: r.get("tournament_id"),
            batch_id: r.get("batch_id"),
            format: MatchFormat::parse(&r.get::<String, _>("match_type")),
            current_pairing_id: r.get("current_pairing_id"),
        }))
    }

    async fn find_record(&self, pairing_id: PairingId) -> PairingResult<Option<PairingRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM match_pairings WHERE id = $1"
        ))
        .bind(pairing_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn current_record(&self, match_id: MatchId) -> PairingResult<Option<PairingRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM match_pairings
            WHERE id = (SELECT current_pairing_id FROM matches WHERE id = $1)
            "#
        ))
        .bind(match_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn history(&self, match_id: MatchId) -> PairingResult<Vec<PairingRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM match_pairings
            WHERE match_id = $1
            ORDER BY proposed_at DESC, version DESC
            "#
        ))
        .bind(match_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn insert_current(
        &self,
        record: &PairingRecord,
        expected_current: Option<PairingId>,
    ) -> PairingResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_and_point(&mut *tx, record, expected_current).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn supersede(
        &self,
        record: &PairingRecord,
        prior_id: PairingId,
        expected_status: PairingStatus,
    ) -> PairingResult<()> {
        let mut tx = self.pool.begin().await?;

        // Holding the prior row blocks transitions on it until commit
        let prior = sqlx::query(
            "SELECT id FROM match_pairings WHERE id = $1 AND status = $2 FOR UPDATE",
        )
        .bind(prior_id)
        .bind(expected_status.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        if prior.is_none() {
            warn!(
                "Pairing {} is no longer {} for match {}",
                prior_id, expected_status, record.match_id
            );
            return Err(PairingError::Conflict {
                match_id: record.match_id,
            });
        }

        insert_and_point(&mut *tx, record, Some(prior_id)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn apply_transition(
        &self,
        record: &PairingRecord,
        expected_status: PairingStatus,
    ) -> PairingResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE match_pairings
            SET status = $1,
                approved_by = $2, approved_at = $3,
                published_by = $4, published_at = $5,
                rejected_by = $6, rejected_at = $7, rejection_reason = $8
            WHERE id = $9 AND status = $10
            "#,
        )
        .bind(record.status.to_string())
        .bind(record.approved_by)
        .bind(record.approved_at.map(|dt| dt.naive_utc()))
        .bind(record.published_by)
        .bind(record.published_at.map(|dt| dt.naive_utc()))
        .bind(record.rejected_by)
        .bind(record.rejected_at.map(|dt| dt.naive_utc()))
        .bind(&record.rejection_reason)
        .bind(record.id)
        .bind(expected_status.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(PairingError::Conflict {
                match_id: record.match_id,
            });
        }

        // Rewriting the pointer locks the match row and confirms the record is still current
        let pointed = sqlx::query(
            "UPDATE matches SET current_pairing_id = $1 WHERE id = $2 AND current_pairing_id = $1",
        )
        .bind(record.id)
        .bind(record.match_id)
        .execute(&mut *tx)
        .await?;

        if pointed.rows_affected() == 0 {
            return Err(PairingError::Conflict {
                match_id: record.match_id,
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> PairingResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// PostgreSQL implementation of `ParticipantDirectory`
#[derive(Clone)]
pub struct PgParticipantDirectory {
    pool: Arc<PgPool>,
}

impl PgParticipantDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantDirectory for PgParticipantDirectory {
    async fn eligible_players(
        &self,
        tournament_id: TournamentId,
    ) -> PairingResult<Vec<EligiblePlayer>> {
        let rows = sqlx::query(
            r#"
            SELECT external_id, name, joined_at, payment_status
            FROM tournament_participants
            WHERE tournament_id = $1 AND payment_status IN ('paid', 'pending')
            ORDER BY joined_at
            "#,
        )
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(EligiblePlayer {
                    external_id: row.get("external_id"),
                    name: row.get("name"),
                    joined_at: row.get::<chrono::NaiveDateTime, _>("joined_at").and_utc(),
                    payment_status: row.get::<String, _>("payment_status").parse()?,
                })
            })
            .collect()
    }

    async fn player_seedings(
        &self,
        tournament_id: TournamentId,
    ) -> PairingResult<Vec<PlayerSeeding>> {
        let rows = sqlx::query(
            "SELECT external_id, seed_number, skill_rating FROM player_seedings WHERE tournament_id = $1",
        )
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PlayerSeeding {
                external_id: row.get("external_id"),
                seed_number: row.get("seed_number"),
                skill_rating: row.get("skill_rating"),
            })
            .collect())
    }
}

/// PostgreSQL implementation of `MatchUpdater`, writing the `match_slots` table
#[derive(Clone)]
pub struct PgMatchUpdater {
    pool: Arc<PgPool>,
}

impl PgMatchUpdater {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchUpdater for PgMatchUpdater {
    async fn assign_pairs(&self, match_id: MatchId, pairs: &[Pair]) -> PairingResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM match_slots WHERE match_id = $1")
            .bind(match_id)
            .execute(&mut *tx)
            .await?;

        for pair in pairs {
            sqlx::query(
                r#"
                INSERT INTO match_slots (match_id, match_number, player1_id, player2_id, table_number, round_number)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(match_id)
            .bind(i64::from(pair.match_number))
            .bind(&pair.player1_id)
            .bind(&pair.player2_id)
            .bind(pair.table_number.map(i64::from))
            .bind(pair.round_number.map(i64::from))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
