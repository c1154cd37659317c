use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{Selection, TurnRecord};
use crate::stats;

fn describe_selection(selection: &Selection) -> String {
    let join = |values: &std::collections::BTreeSet<i64>| {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    match (selection.meetings.is_empty(), selection.speakers.is_empty()) {
        (true, true) => "all meetings and speakers".to_string(),
        (false, true) => format!("meetings {}", join(&selection.meetings)),
        (true, false) => format!("speakers {}", join(&selection.speakers)),
        (false, false) => format!(
            "meetings {}, speakers {}",
            join(&selection.meetings),
            join(&selection.speakers)
        ),
    }
}

pub fn build_report(
    records: &[TurnRecord],
    selection: &Selection,
    generated_on: NaiveDate,
) -> String {
    let filtered = stats::filter_turns(records, selection);
    let own = stats::self_turns(&filtered);
    let missing = records.iter().filter(|r| !r.has_scores()).count();

    let mut output = String::new();

    let _ = writeln!(output, "# Self Collaboration Score Report");
    let _ = writeln!(
        output,
        "Generated on {} for {}",
        generated_on,
        describe_selection(selection)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Coverage");
    let _ = writeln!(output, "- {} turns in dataset", records.len());
    let _ = writeln!(output, "- {missing} turns without scores");
    let _ = writeln!(output, "- {} scored turns match the filters", filtered.len());
    let _ = writeln!(output, "- {} of those are self turns", own.len());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Self Scores by Meeting");

    let meetings = stats::scores_by_meeting(&own);
    if meetings.is_empty() {
        let _ = writeln!(output, "No self turns for this selection.");
    } else {
        for score in meetings.iter() {
            let sem = score
                .summary
                .sem
                .map_or_else(|| "n/a".to_string(), |sem| format!("{sem:.2}"));
            let _ = writeln!(
                output,
                "- Meeting {}: mean {:.2} (SEM {}) across {} turns",
                score.meeting_number, score.summary.mean, sem, score.summary.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Self Scores by Speaker");

    let speakers = stats::mean_by_speaker(&own);
    if speakers.is_empty() {
        let _ = writeln!(output, "No self turns for this selection.");
    } else {
        for score in speakers.iter() {
            let _ = writeln!(
                output,
                "- Speaker {}: mean {:.2} across {} turns",
                score.speaker_number, score.mean, score.count
            );
        }
    }

    output
}
