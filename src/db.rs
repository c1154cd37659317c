use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dataset;
use crate::models::TurnRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Two short meetings with three speakers, including handoffs and missing scores.
fn seed_turns() -> Vec<TurnRecord> {
    let rows: [(i64, i64, &str, &str, f64, f64); 12] = [
        (1, 1, "spk-a", "spk-a", 3.0, 4.0),
        (1, 1, "spk-a", "spk-b", 2.0, 3.0),
        (1, 2, "spk-b", "spk-b", 4.0, 4.0),
        (1, 2, "spk-b", "spk-c", 3.0, 3.0),
        (1, 3, "spk-c", "spk-c", -1.0, -1.0),
        (1, 3, "spk-c", "spk-c", 5.0, 4.0),
        (2, 1, "spk-a", "spk-a", 4.0, 4.0),
        (2, 1, "spk-a", "spk-a", 2.0, 3.0),
        (2, 2, "spk-b", "spk-a", 3.0, 3.0),
        (2, 2, "spk-b", "spk-b", 5.0, 5.0),
        (2, 3, "spk-c", "spk-c", 3.0, -1.0),
        (2, 3, "spk-c", "spk-c", 4.0, 4.0),
    ];

    rows.into_iter()
        .map(
            |(meeting_number, speaker_number, speaker_id, next_speaker_id, individual, overall)| {
                TurnRecord {
                    meeting_number,
                    speaker_number,
                    speaker_id: speaker_id.to_string(),
                    next_speaker_id: next_speaker_id.to_string(),
                    individual_collaboration_score: individual,
                    overall_collaboration_score: overall,
                }
            },
        )
        .collect()
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let turns = seed_turns();
    let mut inserted = 0usize;
    for (index, turn) in turns.iter().enumerate() {
        if insert_turn(pool, &format!("seed-{:03}", index + 1), index, turn).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Inserts a turn unless its `source_key` is already stored.
async fn insert_turn(
    pool: &PgPool,
    source_key: &str,
    turn_index: usize,
    turn: &TurnRecord,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO self_score.turns
        (id, source_key, turn_index, meeting_number, speaker_number, speaker_id,
         next_speaker_id, individual_collaboration_score, overall_collaboration_score)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(source_key)
    .bind(i64::try_from(turn_index).context("turn index out of range")?)
    .bind(turn.meeting_number)
    .bind(turn.speaker_number)
    .bind(&turn.speaker_id)
    .bind(&turn.next_speaker_id)
    .bind(turn.individual_collaboration_score)
    .bind(turn.overall_collaboration_score)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_turns(pool: &PgPool) -> anyhow::Result<Vec<TurnRecord>> {
    let rows = sqlx::query(
        "SELECT meeting_number, speaker_number, speaker_id, next_speaker_id, \
         individual_collaboration_score, overall_collaboration_score \
         FROM self_score.turns \
         ORDER BY meeting_number, turn_index, source_key",
    )
    .fetch_all(pool)
    .await
    .context("failed to read self_score.turns")?;

    let mut turns = Vec::with_capacity(rows.len());
    for row in rows {
        turns.push(TurnRecord {
            meeting_number: row.get("meeting_number"),
            speaker_number: row.get("speaker_number"),
            speaker_id: row.get("speaker_id"),
            next_speaker_id: row.get("next_speaker_id"),
            individual_collaboration_score: row.get("individual_collaboration_score"),
            overall_collaboration_score: row.get("overall_collaboration_score"),
        });
    }

    info!(rows = turns.len(), "loaded dataset from postgres");
    Ok(turns)
}

#[derive(serde::Deserialize)]
struct ImportRow {
    meeting_number: i64,
    speaker_number: i64,
    speaker_id: String,
    next_speaker_id: String,
    individual_collaboration_score: f64,
    overall_collaboration_score: f64,
    #[serde(default)]
    source_key: Option<String>,
}

impl ImportRow {
    fn turn(&self) -> TurnRecord {
        TurnRecord {
            meeting_number: self.meeting_number,
            speaker_number: self.speaker_number,
            speaker_id: self.speaker_id.clone(),
            next_speaker_id: self.next_speaker_id.clone(),
            individual_collaboration_score: self.individual_collaboration_score,
            overall_collaboration_score: self.overall_collaboration_score,
        }
    }
}

/// Key for an imported row: the row's own `source_key` when the file has
/// one, otherwise file path, position and a digest of the row's values.
fn row_source_key(file_key: &str, index: usize, row: &ImportRow) -> String {
    if let Some(key) = row.source_key.as_deref().filter(|key| !key.is_empty()) {
        return key.to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(file_key.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(row.meeting_number.to_le_bytes());
    hasher.update(row.speaker_number.to_le_bytes());
    hasher.update(row.speaker_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(row.next_speaker_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(row.individual_collaboration_score.to_le_bytes());
    hasher.update(row.overall_collaboration_score.to_le_bytes());
    format!("import-{:x}", hasher.finalize())
}

/// Copies a CSV dataset into the turns table. Re-importing an unchanged file
/// inserts nothing; files at other paths and edited rows get new keys.
pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let rows: Vec<ImportRow> = dataset::load_rows(csv_path)?;
    let file_key = std::fs::canonicalize(csv_path)
        .with_context(|| format!("failed to resolve {}", csv_path.display()))?
        .to_string_lossy()
        .into_owned();

    let mut inserted = 0usize;
    for (index, row) in rows.iter().enumerate() {
        let source_key = row_source_key(&file_key, index, row);
        if insert_turn(pool, &source_key, index, &row.turn()).await? {
            inserted += 1;
        }
    }

    if inserted < rows.len() {
        warn!(
            path = %csv_path.display(),
            rows = rows.len(),
            inserted,
            skipped = rows.len() - inserted,
            "some rows were already imported"
        );
    }

    Ok(inserted)
}
