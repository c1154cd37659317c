use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::chart::{self, Figure, SpeakerColors};
use crate::models::{DropdownOption, Selection, TurnRecord, ViewType};
use crate::stats;

/// The self-score panel: dropdown derivation, filter reset and chart
/// rendering over a read-only dataset.
#[derive(Debug, Clone)]
pub struct SelfScorePanel {
    records: Arc<[TurnRecord]>,
}

impl SelfScorePanel {
    pub fn new(records: impl Into<Arc<[TurnRecord]>>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Every meeting in the dataset, ascending.
    pub fn meeting_options(&self) -> Vec<DropdownOption> {
        let meetings: BTreeSet<i64> = self.records.iter().map(|r| r.meeting_number).collect();
        meetings
            .into_iter()
            .map(|meeting| DropdownOption {
                label: format!("Meeting {meeting}"),
                value: meeting,
            })
            .collect()
    }

    /// Speakers present in the selected meetings, or all speakers when none
    /// are selected. Ascending.
    pub fn speaker_options(&self, selected_meetings: &BTreeSet<i64>) -> Vec<DropdownOption> {
        let speakers: BTreeSet<i64> = self
            .records
            .iter()
            .filter(|r| {
                selected_meetings.is_empty() || selected_meetings.contains(&r.meeting_number)
            })
            .map(|r| r.speaker_number)
            .collect();
        speakers
            .into_iter()
            .map(|speaker| DropdownOption {
                label: format!("Speaker {speaker}"),
                value: speaker,
            })
            .collect()
    }

    /// Cleared meeting and speaker selections, whatever the trigger.
    pub fn reset_filters<T>(_trigger: T) -> (Option<BTreeSet<i64>>, Option<BTreeSet<i64>>) {
        (None, None)
    }

    pub fn render(&self, selection: &Selection) -> Figure {
        let filtered = stats::filter_turns(&self.records, selection);
        let own = stats::self_turns(&filtered);
        let by_speaker = stats::scores_by_meeting_and_speaker(&own);
        let colors = SpeakerColors::assign(by_speaker.iter().map(|s| s.speaker_number));

        let data = match selection.view_type {
            ViewType::Total => chart::total_traces(&stats::scores_by_meeting(&own)),
            ViewType::BySpeakers => chart::speaker_traces(&by_speaker, &colors),
        };

        let tickvals: Vec<i64> = filtered
            .iter()
            .map(|r| r.meeting_number)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        debug!(
            view = %selection.view_type,
            rows = filtered.len(),
            self_rows = own.len(),
            series = data.len(),
            "rendered meeting chart"
        );

        let figure = Figure {
            data,
            layout: chart::meeting_layout(tickvals),
        };

        if selection.meetings.is_empty() {
            return figure;
        }

        // `filtered` is already limited to the selected meetings.
        let speaker_means = stats::mean_by_speaker(&own);
        if speaker_means.is_empty() {
            debug!("no self turns in selected meetings, keeping meeting chart");
            return figure;
        }

        debug!(bars = speaker_means.len(), "rendered speaker bar chart");
        chart::speaker_bar_figure(&speaker_means, &colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{MarkerColor, Trace, SPEAKER_BAR_TITLE, TAB10};

    fn turn(meeting: i64, speaker: i64, next: i64, score: f64) -> TurnRecord {
        TurnRecord {
            meeting_number: meeting,
            speaker_number: speaker,
            speaker_id: format!("S{speaker}"),
            next_speaker_id: format!("S{next}"),
            individual_collaboration_score: score,
            overall_collaboration_score: 4.0,
        }
    }

    fn sample_panel() -> SelfScorePanel {
        SelfScorePanel::new(vec![
            turn(2, 3, 3, 5.0),
            turn(1, 1, 1, 2.0),
            turn(1, 1, 1, 4.0),
            turn(1, 2, 1, 9.0),
            turn(2, 1, 1, 6.0),
            turn(3, 2, 2, -1.0),
        ])
    }

    fn scatter(trace: &Trace) -> &chart::ScatterTrace {
        match trace {
            Trace::Scatter(scatter) => scatter,
            Trace::Bar(_) => panic!("expected scatter trace"),
        }
    }

    #[test]
    fn meeting_options_cover_every_meeting_in_order() {
        let options = sample_panel().meeting_options();
        let values: Vec<i64> = options.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(options[0].label, "Meeting 1");
    }

    #[test]
    fn speaker_options_follow_meeting_selection() {
        let panel = sample_panel();
        let all: Vec<i64> = panel
            .speaker_options(&BTreeSet::new())
            .iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(all, vec![1, 2, 3]);

        let options = panel.speaker_options(&BTreeSet::from([2]));
        let values: Vec<i64> = options.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1, 3]);
        assert_eq!(options[1].label, "Speaker 3");
    }

    #[test]
    fn reset_always_clears_both_filters() {
        assert_eq!(SelfScorePanel::reset_filters(0), (None, None));
        assert_eq!(SelfScorePanel::reset_filters(Some(7)), (None, None));
        assert_eq!(SelfScorePanel::reset_filters(()), (None, None));
    }

    #[test]
    fn total_view_averages_self_turns_per_meeting() {
        let panel = SelfScorePanel::new(vec![
            turn(1, 1, 1, 2.0),
            turn(1, 2, 2, 4.0),
            turn(2, 1, 1, 6.0),
            turn(2, 1, 2, 10.0),
        ]);
        let figure = panel.render(&Selection {
            view_type: ViewType::Total,
            ..Selection::default()
        });

        assert_eq!(figure.data.len(), 2);
        let line = scatter(&figure.data[0]);
        assert_eq!(line.x, vec![1, 2]);
        assert_eq!(line.y, vec![3.0, 6.0]);
        assert_eq!(line.mode, "lines+markers");

        let bars = scatter(&figure.data[1]);
        assert_eq!(bars.y, line.y);
        let sems = &bars.error_y.as_ref().unwrap().array;
        assert!((sems[0].unwrap() - 1.0).abs() < 0.001);
        assert_eq!(sems[1], None);
        assert_eq!(figure.layout.xaxis.tickvals, Some(vec![1, 2]));
    }

    #[test]
    fn sentinel_rows_never_contribute() {
        let mut missing_overall = turn(1, 1, 1, 100.0);
        missing_overall.overall_collaboration_score = -1.0;
        let panel = SelfScorePanel::new(vec![
            turn(1, 1, 1, 2.0),
            turn(1, 1, 1, -1.0),
            missing_overall,
        ]);
        let figure = panel.render(&Selection {
            view_type: ViewType::Total,
            ..Selection::default()
        });
        assert_eq!(scatter(&figure.data[0]).y, vec![2.0]);
    }

    #[test]
    fn by_speakers_view_colors_each_speaker() {
        let figure = sample_panel().render(&Selection::default());

        assert_eq!(figure.data.len(), 2);
        let first = scatter(&figure.data[0]);
        let second = scatter(&figure.data[1]);
        assert_eq!(first.name.as_deref(), Some("Speaker 1"));
        assert_eq!(first.x, vec![1, 2]);
        assert_eq!(first.y, vec![3.0, 6.0]);
        assert_eq!(second.name.as_deref(), Some("Speaker 3"));
        assert_eq!(first.line.as_ref().unwrap().color, TAB10[0]);
        assert_eq!(second.line.as_ref().unwrap().color, TAB10[1]);
        assert_eq!(figure.layout.xaxis.tickvals, Some(vec![1, 2]));
        assert!(figure.layout.showlegend);
    }

    #[test]
    fn by_speakers_view_carries_error_bars_per_speaker() {
        let figure = sample_panel().render(&Selection::default());

        let first = scatter(&figure.data[0]);
        let sems = &first.error_y.as_ref().unwrap().array;
        assert_eq!(sems.len(), 2);
        assert!((sems[0].unwrap() - 1.0).abs() < 0.001);
        assert_eq!(sems[1], None);

        let second = scatter(&figure.data[1]);
        assert_eq!(second.error_y.as_ref().unwrap().array, vec![None]);
    }

    #[test]
    fn ticks_ignore_self_restriction_but_respect_filters() {
        let panel = SelfScorePanel::new(vec![
            turn(1, 1, 1, 2.0),
            turn(4, 1, 2, 3.0),
            turn(5, 2, 2, 1.0),
        ]);
        let figure = panel.render(&Selection {
            speakers: BTreeSet::from([1]),
            view_type: ViewType::Total,
            ..Selection::default()
        });
        assert_eq!(figure.layout.xaxis.tickvals, Some(vec![1, 4]));
        assert_eq!(scatter(&figure.data[0]).x, vec![1]);
    }

    #[test]
    fn selected_meetings_switch_to_speaker_bars() {
        for view_type in [ViewType::Total, ViewType::BySpeakers] {
            let selection = Selection::new([1], Vec::<i64>::new(), view_type);
            let figure = sample_panel().render(&selection);

            assert_eq!(figure.layout.title.text, SPEAKER_BAR_TITLE);
            assert!(!figure.layout.showlegend);
            let Trace::Bar(bar) = &figure.data[0] else {
                panic!("expected bar trace");
            };
            assert_eq!(bar.x, vec![1]);
            assert_eq!(bar.y, vec![3.0]);
            assert_eq!(
                bar.marker.color,
                MarkerColor::PerPoint(vec![TAB10[0].to_string()])
            );
        }
    }

    #[test]
    fn several_selected_meetings_pool_speaker_bars() {
        let selection = Selection::new([1, 2], Vec::<i64>::new(), ViewType::Total);
        let figure = sample_panel().render(&selection);

        let Trace::Bar(bar) = &figure.data[0] else {
            panic!("expected bar trace");
        };
        assert_eq!(bar.x, vec![1, 3]);
        assert_eq!(bar.y, vec![4.0, 5.0]);
        assert_eq!(
            bar.marker.color,
            MarkerColor::PerPoint(vec![TAB10[0].to_string(), TAB10[1].to_string()])
        );
    }

    #[test]
    fn selected_meetings_without_self_turns_keep_line_chart() {
        let panel = SelfScorePanel::new(vec![turn(1, 1, 2, 3.0), turn(2, 1, 1, 4.0)]);
        let selection = Selection::new([1], Vec::<i64>::new(), ViewType::BySpeakers);
        let figure = panel.render(&selection);

        assert_eq!(figure.layout.title.text, chart::MEETING_TITLE);
        assert!(figure.data.is_empty());
        assert_eq!(figure.layout.xaxis.tickvals, Some(vec![1]));
    }

    #[test]
    fn empty_dataset_renders_titled_empty_chart() {
        let panel = SelfScorePanel::new(Vec::<TurnRecord>::new());
        let figure = panel.render(&Selection {
            view_type: ViewType::Total,
            ..Selection::default()
        });
        assert_eq!(figure.layout.title.text, chart::MEETING_TITLE);
        assert_eq!(figure.layout.xaxis.tickvals, Some(Vec::new()));
        let line = scatter(&figure.data[0]);
        assert!(line.x.is_empty());
    }
}
