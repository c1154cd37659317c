//! Plotly-compatible figure description produced by the panel.
//!
//! Only the attributes the panel sets are modelled; everything else is left to
//! the renderer's defaults.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{MeetingScore, SpeakerMeetingScore, SpeakerScore};

/// matplotlib/seaborn `tab10`.
pub const TAB10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub const TOTAL_COLOR: &str = "green";
const UNMAPPED_COLOR: &str = "#7f7f7f";

pub const MEETING_TITLE: &str = "Mean Individual Collaboration Score (Self) by Meeting";
pub const SPEAKER_BAR_TITLE: &str =
    "Mean Individual Collaboration Score (Self) by Speaker for Selected Meetings";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Bar(BarTrace),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub x: Vec<i64>,
    pub y: Vec<f64>,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_y: Option<ErrorBars>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub x: Vec<i64>,
    pub y: Vec<f64>,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: MarkerColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Single(String),
    PerPoint(Vec<String>),
}

/// Symmetric error bars; `None` entries draw no bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBars {
    #[serde(rename = "type")]
    pub kind: String,
    pub array: Vec<Option<f64>>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub showlegend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<i64>>,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Self {
            title: Title {
                text: text.to_string(),
            },
            tickmode: None,
            tickvals: None,
        }
    }
}

impl ErrorBars {
    fn from_sems(array: Vec<Option<f64>>) -> Self {
        Self {
            kind: "data".to_string(),
            array,
            visible: true,
        }
    }
}

/// Speaker number to palette colour, fixed for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerColors {
    colors: HashMap<i64, &'static str>,
}

impl SpeakerColors {
    /// Assigns palette entries in the order speakers are first seen.
    pub fn assign(speakers: impl IntoIterator<Item = i64>) -> Self {
        let mut colors = HashMap::new();
        for speaker in speakers {
            let next = colors.len();
            colors
                .entry(speaker)
                .or_insert(TAB10[next % TAB10.len()]);
        }
        Self { colors }
    }

    pub fn get(&self, speaker: i64) -> Option<&'static str> {
        self.colors.get(&speaker).copied()
    }
}

pub fn meeting_layout(tickvals: Vec<i64>) -> Layout {
    let mut xaxis = Axis::titled("Meeting Number");
    xaxis.tickmode = Some("array".to_string());
    xaxis.tickvals = Some(tickvals);

    Layout {
        title: Title {
            text: MEETING_TITLE.to_string(),
        },
        xaxis,
        yaxis: Axis::titled("Mean Individual Collaboration Score (Self)"),
        showlegend: true,
    }
}

/// Mean line plus an overlaid marker series carrying the error bars.
pub fn total_traces(scores: &[MeetingScore]) -> Vec<Trace> {
    let x: Vec<i64> = scores.iter().map(|s| s.meeting_number).collect();
    let y: Vec<f64> = scores.iter().map(|s| s.summary.mean).collect();
    let sems: Vec<Option<f64>> = scores.iter().map(|s| s.summary.sem).collect();

    vec![
        Trace::Scatter(ScatterTrace {
            x: x.clone(),
            y: y.clone(),
            mode: "lines+markers".to_string(),
            name: Some("Mean Individual Collaboration Score (Self)".to_string()),
            line: Some(Line {
                color: TOTAL_COLOR.to_string(),
            }),
            marker: Marker {
                color: MarkerColor::Single(TOTAL_COLOR.to_string()),
                size: None,
            },
            error_y: None,
            showlegend: None,
        }),
        Trace::Scatter(ScatterTrace {
            x,
            y,
            mode: "markers".to_string(),
            name: None,
            line: None,
            marker: Marker {
                color: MarkerColor::Single(TOTAL_COLOR.to_string()),
                size: Some(8),
            },
            error_y: Some(ErrorBars::from_sems(sems)),
            showlegend: Some(false),
        }),
    ]
}

/// One line per speaker, in the order speakers first appear in `scores`.
pub fn speaker_traces(scores: &[SpeakerMeetingScore], colors: &SpeakerColors) -> Vec<Trace> {
    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, Vec<&SpeakerMeetingScore>> = HashMap::new();
    for score in scores {
        groups
            .entry(score.speaker_number)
            .or_insert_with(|| {
                order.push(score.speaker_number);
                Vec::new()
            })
            .push(score);
    }

    order
        .into_iter()
        .map(|speaker| {
            let points = groups.remove(&speaker).unwrap_or_default();
            let color = colors.get(speaker).unwrap_or(UNMAPPED_COLOR).to_string();

            Trace::Scatter(ScatterTrace {
                x: points.iter().map(|p| p.meeting_number).collect(),
                y: points.iter().map(|p| p.summary.mean).collect(),
                mode: "lines+markers".to_string(),
                name: Some(format!("Speaker {speaker}")),
                line: Some(Line {
                    color: color.clone(),
                }),
                marker: Marker {
                    color: MarkerColor::Single(color),
                    size: None,
                },
                error_y: Some(ErrorBars::from_sems(
                    points.iter().map(|p| p.summary.sem).collect(),
                )),
                showlegend: None,
            })
        })
        .collect()
}

pub fn speaker_bar_figure(scores: &[SpeakerScore], colors: &SpeakerColors) -> Figure {
    let bar = BarTrace {
        x: scores.iter().map(|s| s.speaker_number).collect(),
        y: scores.iter().map(|s| s.mean).collect(),
        marker: Marker {
            color: MarkerColor::PerPoint(
                scores
                    .iter()
                    .map(|s| colors.get(s.speaker_number).unwrap_or(UNMAPPED_COLOR).to_string())
                    .collect(),
            ),
            size: None,
        },
    };

    Figure {
        data: vec![Trace::Bar(bar)],
        layout: Layout {
            title: Title {
                text: SPEAKER_BAR_TITLE.to_string(),
            },
            xaxis: Axis::titled("Speaker Number"),
            yaxis: Axis::titled("Individual Collaboration Score (Self)"),
            showlegend: false,
        },
    }
}
