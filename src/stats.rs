use std::collections::BTreeMap;

use crate::models::{
    MeetingScore, ScoreSummary, Selection, SpeakerMeetingScore, SpeakerScore, TurnRecord,
};

/// Rows that carry both scores and match the meeting and speaker filters.
pub fn filter_turns<'a>(records: &'a [TurnRecord], selection: &Selection) -> Vec<&'a TurnRecord> {
    records
        .iter()
        .filter(|record| record.has_scores())
        .filter(|record| {
            selection.meetings.is_empty() || selection.meetings.contains(&record.meeting_number)
        })
        .filter(|record| {
            selection.speakers.is_empty() || selection.speakers.contains(&record.speaker_number)
        })
        .collect()
}

pub fn self_turns<'a>(rows: &[&'a TurnRecord]) -> Vec<&'a TurnRecord> {
    rows.iter().copied().filter(|record| record.is_self_turn()).collect()
}

/// Sample mean and standard error (n - 1 denominator).
pub fn summarize(values: &[f64]) -> ScoreSummary {
    let count = values.len();
    if count == 0 {
        return ScoreSummary {
            mean: f64::NAN,
            sem: None,
            count,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let sem = if count < 2 {
        None
    } else {
        let variance = values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        Some((variance / count as f64).sqrt())
    };

    ScoreSummary { mean, sem, count }
}

pub fn scores_by_meeting(rows: &[&TurnRecord]) -> Vec<MeetingScore> {
    let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for record in rows {
        groups
            .entry(record.meeting_number)
            .or_default()
            .push(record.individual_collaboration_score);
    }

    groups
        .into_iter()
        .map(|(meeting_number, values)| MeetingScore {
            meeting_number,
            summary: summarize(&values),
        })
        .collect()
}

/// Groups ordered by meeting, then speaker.
pub fn scores_by_meeting_and_speaker(rows: &[&TurnRecord]) -> Vec<SpeakerMeetingScore> {
    let mut groups: BTreeMap<(i64, i64), Vec<f64>> = BTreeMap::new();
    for record in rows {
        groups
            .entry((record.meeting_number, record.speaker_number))
            .or_default()
            .push(record.individual_collaboration_score);
    }

    groups
        .into_iter()
        .map(|((meeting_number, speaker_number), values)| SpeakerMeetingScore {
            meeting_number,
            speaker_number,
            summary: summarize(&values),
        })
        .collect()
}

pub fn mean_by_speaker(rows: &[&TurnRecord]) -> Vec<SpeakerScore> {
    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for record in rows {
        let entry = groups.entry(record.speaker_number).or_insert((0.0, 0));
        entry.0 += record.individual_collaboration_score;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(speaker_number, (total, count))| SpeakerScore {
            speaker_number,
            mean: total / count as f64,
            count,
        })
        .collect()
}
