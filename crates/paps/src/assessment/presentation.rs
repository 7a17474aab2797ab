use super::aggregation::{total_grade, total_score};
use super::criteria::ReferenceRow;
use super::domain::{FactorResult, FitnessFactor, GradeBand};
use super::state::EvaluationState;
use serde::Serialize;
use tracing::warn;

/// Chart values are `CHART_CEILING - band`, so grade 1 plots highest.
pub const CHART_CEILING: u8 = 6;

/// Single-query grade text when no criteria row matches.
pub const NOT_FOUND_GRADE: &str = "해당 없음";
/// Single-query score text when no criteria row matches.
pub const NOT_FOUND_SCORE: &str = "-";

/// Radar chart value for one result: 0 when empty, otherwise `6 - band`.
pub fn chart_value(result: &FactorResult) -> u8 {
    if result.is_empty() {
        return 0;
    }

    match GradeBand::parse(&result.grade) {
        Some(band) => CHART_CEILING - band.value(),
        None => {
            warn!(grade = %result.grade, "grade has no 1-5 band, plotting as empty");
            0
        }
    }
}

/// One value per factor in [`FitnessFactor::ordered`] order.
pub fn chart_series(state: &EvaluationState) -> [u8; 5] {
    FitnessFactor::ordered().map(|factor| chart_value(state.result(factor)))
}

/// Recovers the grade band from a plotted value. Exact inverse of
/// [`chart_value`] for values 1 through 5.
pub fn grade_from_chart_value(raw: u8) -> Option<GradeBand> {
    CHART_CEILING.checked_sub(raw).and_then(GradeBand::new)
}

/// Radial axis tick text, e.g. `5` renders as `1등급`.
pub fn tick_label(value: u8) -> Option<String> {
    grade_from_chart_value(value).map(GradeBand::label)
}

/// Point tooltip text, e.g. `1등급 (20점)`. Empty factors have no tooltip.
pub fn tooltip_label(state: &EvaluationState, factor: FitnessFactor) -> Option<String> {
    let result = state.result(factor);
    let grade = grade_from_chart_value(chart_value(result))?;
    Some(format!("{} ({}점)", grade.label(), result.score))
}

/// Payload handed to a chart backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<&'static str>,
    pub series: [u8; 5],
}

impl ChartData {
    pub fn from_state(state: &EvaluationState) -> Self {
        Self {
            labels: FitnessFactor::ordered()
                .iter()
                .map(|factor| factor.label())
                .collect(),
            series: chart_series(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("chart backend unavailable: {0}")]
    Unavailable(String),
}

/// Rendering backend for the radar chart. Updates are fire-and-forget.
pub trait ChartSink {
    fn render(&mut self, chart: &ChartData) -> Result<(), RenderError>;
}

/// Pushes a frame, logging failures instead of propagating them.
pub fn push_chart<S: ChartSink + ?Sized>(sink: &mut S, chart: &ChartData) {
    if let Err(err) = sink.render(chart) {
        warn!(error = %err, "chart update failed, continuing without chart");
    }
}

/// Keeps every frame it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingChartSink {
    frames: Vec<ChartData>,
}

impl RecordingChartSink {
    pub fn frames(&self) -> &[ChartData] {
        &self.frames
    }

    pub fn last(&self) -> Option<&ChartData> {
        self.frames.last()
    }
}

impl ChartSink for RecordingChartSink {
    fn render(&mut self, chart: &ChartData) -> Result<(), RenderError> {
        self.frames.push(chart.clone());
        Ok(())
    }
}

/// Display row for one factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorDisplay {
    pub factor: FitnessFactor,
    pub label: &'static str,
    pub score: u32,
    pub score_text: String,
    pub grade: String,
    pub chart_value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl FactorDisplay {
    pub fn new(state: &EvaluationState, factor: FitnessFactor) -> Self {
        let result = state.result(factor);
        Self {
            factor,
            label: factor.label(),
            score: result.score,
            score_text: result.score_text(),
            grade: result.grade.clone(),
            chart_value: chart_value(result),
            tooltip: tooltip_label(state, factor),
        }
    }
}

/// Everything the per-factor view shows at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub factors: Vec<FactorDisplay>,
    pub chart: ChartData,
    pub total_score: u32,
    pub total_grade: GradeBand,
}

impl Dashboard {
    pub fn from_state(state: &EvaluationState) -> Self {
        let total = total_score(state);
        Self {
            factors: FitnessFactor::ordered()
                .into_iter()
                .map(|factor| FactorDisplay::new(state, factor))
                .collect(),
            chart: ChartData::from_state(state),
            total_score: total,
            total_grade: total_grade(total),
        }
    }
}

/// Result pair shown by the single-query path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleQueryDisplay {
    pub matched: bool,
    pub grade: String,
    pub score: String,
}

impl SingleQueryDisplay {
    pub fn from_match(row: Option<&ReferenceRow>) -> Self {
        match row {
            Some(row) => Self {
                matched: true,
                grade: row.grade.trim().to_string(),
                score: row.score.to_string(),
            },
            None => Self {
                matched: false,
                grade: NOT_FOUND_GRADE.to_string(),
                score: NOT_FOUND_SCORE.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl ChartSink for BrokenSink {
        fn render(&mut self, _chart: &ChartData) -> Result<(), RenderError> {
            Err(RenderError::Unavailable("no canvas".to_string()))
        }
    }

    #[test]
    fn chart_inversion_round_trips_for_every_band() {
        for value in 1..=5 {
            let band = GradeBand::new(value).expect("valid band");
            let plotted = chart_value(&FactorResult::new(0, band.label()));
            assert_eq!(plotted, 6 - value);
            assert_eq!(grade_from_chart_value(plotted), Some(band));
        }
    }

    #[test]
    fn empty_and_unparseable_grades_plot_zero() {
        assert_eq!(chart_value(&FactorResult::default()), 0);
        assert_eq!(chart_value(&FactorResult::new(3, "우수")), 0);
        assert_eq!(grade_from_chart_value(0), None);
        assert_eq!(grade_from_chart_value(7), None);
    }

    #[test]
    fn series_follows_factor_order() {
        let state = EvaluationState::default()
            .with_result(FitnessFactor::Cardio, FactorResult::new(20, "1등급"))
            .with_result(FitnessFactor::Obesity, FactorResult::new(5, "5등급"));
        assert_eq!(chart_series(&state), [5, 0, 0, 0, 1]);
    }

    #[test]
    fn labels_render_grade_and_score() {
        let state = EvaluationState::default()
            .with_result(FitnessFactor::Power, FactorResult::new(16, "2등급"));
        assert_eq!(tick_label(5).as_deref(), Some("1등급"));
        assert_eq!(tick_label(1).as_deref(), Some("5등급"));
        assert_eq!(
            tooltip_label(&state, FitnessFactor::Power).as_deref(),
            Some("2등급 (16점)")
        );
        assert_eq!(tooltip_label(&state, FitnessFactor::Cardio), None);
    }

    #[test]
    fn render_failures_are_swallowed() {
        let chart = ChartData::from_state(&EvaluationState::default());
        push_chart(&mut BrokenSink, &chart);

        let mut sink = RecordingChartSink::default();
        push_chart(&mut sink, &chart);
        assert_eq!(sink.frames().len(), 1);
        assert_eq!(sink.last().map(|frame| frame.labels.len()), Some(5));
    }

    #[test]
    fn dashboard_summarizes_totals() {
        let state = EvaluationState::default()
            .with_result(FitnessFactor::Cardio, FactorResult::new(20, "1등급"))
            .with_result(FitnessFactor::Flexibility, FactorResult::new(20, "1등급"))
            .with_result(FitnessFactor::Muscular, FactorResult::new(20, "1등급"));
        let dashboard = Dashboard::from_state(&state);
        assert_eq!(dashboard.total_score, 60);
        assert_eq!(dashboard.total_grade.label(), "2등급");
        assert_eq!(dashboard.factors[0].score_text, "20점");
        assert_eq!(dashboard.factors[4].grade, "-");
    }

    #[test]
    fn single_query_display_uses_sentinels_when_not_found() {
        let display = SingleQueryDisplay::from_match(None);
        assert!(!display.matched);
        assert_eq!(display.grade, "해당 없음");
        assert_eq!(display.score, "-");
    }
}
