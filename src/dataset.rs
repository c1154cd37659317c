use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::models::TurnRecord;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "meeting_number",
    "speaker_number",
    "speaker_id",
    "next_speaker_id",
    "individual_collaboration_score",
    "overall_collaboration_score",
];

pub fn load_csv(csv_path: &Path) -> anyhow::Result<Vec<TurnRecord>> {
    let records: Vec<TurnRecord> = load_rows(csv_path)?;

    let missing = records.iter().filter(|r| !r.has_scores()).count();
    info!(
        path = %csv_path.display(),
        rows = records.len(),
        missing_scores = missing,
        "loaded dataset"
    );
    Ok(records)
}

/// Opens `csv_path` and reads it with [`read_rows`].
pub fn load_rows<T: DeserializeOwned>(csv_path: &Path) -> anyhow::Result<Vec<T>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_rows(file).with_context(|| format!("failed to load {}", csv_path.display()))
}

pub fn read_csv<R: Read>(input: R) -> anyhow::Result<Vec<TurnRecord>> {
    read_rows(input)
}

/// Reads rows of turn data, rejecting input that lacks any required column.
/// Extra columns are ignored unless `T` asks for them.
pub fn read_rows<T: DeserializeOwned, R: Read>(input: R) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers()?.clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("dataset is missing required columns: {}", missing.join(", "));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| format!("invalid record at data row {}", index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Trace;
    use crate::models::{Selection, ViewType};
    use crate::panel::SelfScorePanel;

    const HEADER: &str = "meeting_number,speaker_number,speaker_id,next_speaker_id,\
individual_collaboration_score,overall_collaboration_score";

    #[test]
    fn reads_records_and_ignores_extra_columns() {
        let input = format!("{HEADER},notes\n1,2,S2,S2,3.5,4,opening\n1,3,S3,S2,-1,-1,\n");
        let records = read_csv(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].speaker_number, 2);
        assert!(records[0].is_self_turn());
        assert!((records[0].individual_collaboration_score - 3.5).abs() < 0.001);
        assert!(!records[1].has_scores());
    }

    #[test]
    fn rejects_missing_columns() {
        let input = "meeting_number,speaker_number,speaker_id\n1,2,S2\n";
        let err = read_csv(input.as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("next_speaker_id"));
        assert!(message.contains("overall_collaboration_score"));
        assert!(!message.contains("speaker_number,"));
    }

    #[test]
    fn reports_bad_rows() {
        let input = format!("{HEADER}\none,2,S2,S2,3,4\n");
        let err = read_csv(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("data row 1"));
    }

    #[test]
    fn blank_speaker_ids_stay_out_of_self_scores() {
        let input = format!("{HEADER}\n1,1,S1,S1,2,4\n1,1,,,10,4\n");
        let records = read_csv(input.as_bytes()).unwrap();
        assert_eq!(records[1].speaker_id, "");
        assert!(!records[1].is_self_turn());

        let figure = SelfScorePanel::new(records).render(&Selection {
            view_type: ViewType::Total,
            ..Selection::default()
        });
        let Trace::Scatter(line) = &figure.data[0] else {
            panic!("expected scatter trace");
        };
        assert_eq!(line.y, vec![2.0]);
    }
}
