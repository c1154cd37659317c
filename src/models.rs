use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Score value meaning "not applicable" in both score columns.
pub const MISSING_SCORE: f64 = -1.0;

/// One speaker turn from the collaboration dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub meeting_number: i64,
    pub speaker_number: i64,
    pub speaker_id: String,
    pub next_speaker_id: String,
    pub individual_collaboration_score: f64,
    pub overall_collaboration_score: f64,
}

impl TurnRecord {
    pub fn has_scores(&self) -> bool {
        self.individual_collaboration_score != MISSING_SCORE
            && self.overall_collaboration_score != MISSING_SCORE
    }

    /// A turn where the speaker hands the floor back to themselves. Empty
    /// ids are missing values and never match.
    pub fn is_self_turn(&self) -> bool {
        !self.speaker_id.is_empty() && self.speaker_id == self.next_speaker_id
    }
}

/// Entry of a dropdown list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewType {
    Total,
    #[default]
    #[value(alias = "by_speakers")]
    BySpeakers,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewType::Total => f.write_str("total"),
            ViewType::BySpeakers => f.write_str("by_speakers"),
        }
    }
}

impl FromStr for ViewType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "total" => Ok(ViewType::Total),
            "by_speakers" | "by-speakers" => Ok(ViewType::BySpeakers),
            other => anyhow::bail!("unknown view type {other:?}, expected total or by_speakers"),
        }
    }
}

/// Current values of the panel's filter controls. Empty sets mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub meetings: BTreeSet<i64>,
    pub speakers: BTreeSet<i64>,
    pub view_type: ViewType,
}

impl Selection {
    pub fn new(
        meetings: impl IntoIterator<Item = i64>,
        speakers: impl IntoIterator<Item = i64>,
        view_type: ViewType,
    ) -> Self {
        Self {
            meetings: meetings.into_iter().collect(),
            speakers: speakers.into_iter().collect(),
            view_type,
        }
    }

    /// Clears both filters, keeping the view type.
    pub fn reset(&mut self) {
        self.meetings.clear();
        self.speakers.clear();
    }
}

/// Mean and standard error of one group of self scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub mean: f64,
    /// `None` for groups with fewer than two samples.
    pub sem: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetingScore {
    pub meeting_number: i64,
    pub summary: ScoreSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerMeetingScore {
    pub meeting_number: i64,
    pub speaker_number: i64,
    pub summary: ScoreSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerScore {
    pub speaker_number: i64,
    pub mean: f64,
    pub count: usize,
}
