use super::criteria::CriteriaTable;
use super::domain::{AssessmentItem, FactorResult, FitnessFactor, StudentProfile};
use super::lookup::{
    self, lenient_record, parse_record, CriteriaQuery, EvaluationError, LookupRequest,
};
use super::presentation::{
    push_chart, ChartData, ChartSink, Dashboard, FactorDisplay, SingleQueryDisplay,
};
use super::state::EvaluationState;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Raw (item, record) pair entered for one factor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactorInput {
    pub item: Option<AssessmentItem>,
    pub record: String,
}

impl FactorInput {
    pub fn new(item: Option<AssessmentItem>, record: impl Into<String>) -> Self {
        Self {
            item,
            record: record.into(),
        }
    }
}

/// Input changes the evaluator reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentEvent {
    ProfileChanged(StudentProfile),
    FactorInputChanged {
        factor: FitnessFactor,
        input: FactorInput,
    },
}

/// Which factor rows need redrawing after an event. The chart and totals are
/// redrawn after every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    AllFactors,
    Factor(FitnessFactor),
}

impl Refresh {
    pub fn factors(self) -> Vec<FitnessFactor> {
        match self {
            Refresh::AllFactors => FitnessFactor::ordered().to_vec(),
            Refresh::Factor(factor) => vec![factor],
        }
    }
}

/// Computes one factor's result for the live path. Incomplete or invalid
/// input yields the empty result rather than an error.
pub fn recompute_factor(
    table: &CriteriaTable,
    state: EvaluationState,
    profile: &StudentProfile,
    factor: FitnessFactor,
    input: &FactorInput,
) -> EvaluationState {
    match live_query(profile, factor, input) {
        Ok(query) => state.with_result(factor, lookup::evaluate(table, &query)),
        Err(reason) => {
            debug!(factor = factor.key(), %reason, "factor input incomplete, clearing result");
            state.with_cleared(factor)
        }
    }
}

/// Identity inputs changed: every factor result is invalidated.
pub fn reset_for_profile(state: EvaluationState) -> EvaluationState {
    state.reset()
}

fn live_query(
    profile: &StudentProfile,
    factor: FitnessFactor,
    input: &FactorInput,
) -> Result<CriteriaQuery, EvaluationError> {
    let item = input.item.ok_or(EvaluationError::MissingField("item"))?;
    let record = parse_record(&input.record)?;
    CriteriaQuery::new(factor, item, profile.clone(), record)
}

/// Per-student evaluation: profile, per-factor inputs, results, and the chart
/// they drive.
pub struct AssessmentSession<S> {
    table: Arc<CriteriaTable>,
    profile: StudentProfile,
    inputs: [FactorInput; 5],
    state: EvaluationState,
    chart: S,
}

impl<S: ChartSink> AssessmentSession<S> {
    /// Starts with empty results and pushes the initial all-zero chart.
    pub fn new(table: Arc<CriteriaTable>, chart: S) -> Self {
        let mut session = Self {
            table,
            profile: StudentProfile::default(),
            inputs: Default::default(),
            state: EvaluationState::default(),
            chart,
        };
        session.refresh_chart();
        session
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    pub fn input(&self, factor: FitnessFactor) -> &FactorInput {
        &self.inputs[factor.index()]
    }

    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    pub fn result(&self, factor: FitnessFactor) -> &FactorResult {
        self.state.result(factor)
    }

    pub fn chart(&self) -> &S {
        &self.chart
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::from_state(&self.state)
    }

    pub fn factor_display(&self, factor: FitnessFactor) -> FactorDisplay {
        FactorDisplay::new(&self.state, factor)
    }

    pub fn apply(&mut self, event: AssessmentEvent) -> Refresh {
        match event {
            AssessmentEvent::ProfileChanged(profile) => self.set_profile(profile),
            AssessmentEvent::FactorInputChanged { factor, input } => {
                self.set_factor_input(factor, input)
            }
        }
    }

    /// Replaces the student identity and resets every factor.
    pub fn set_profile(&mut self, profile: StudentProfile) -> Refresh {
        self.profile = profile;
        self.state = reset_for_profile(std::mem::take(&mut self.state));
        self.refresh_chart();
        Refresh::AllFactors
    }

    /// Stores one factor's input and recomputes only that factor.
    pub fn set_factor_input(&mut self, factor: FitnessFactor, input: FactorInput) -> Refresh {
        self.state = recompute_factor(
            &self.table,
            std::mem::take(&mut self.state),
            &self.profile,
            factor,
            &input,
        );
        self.inputs[factor.index()] = input;
        self.refresh_chart();
        Refresh::Factor(factor)
    }

    /// Single combined query. Leaves results and chart untouched.
    pub fn lookup(&self, request: &LookupRequest) -> Result<SingleQueryDisplay, EvaluationError> {
        single_query(&self.table, request)
    }

    fn refresh_chart(&mut self) {
        let chart = ChartData::from_state(&self.state);
        push_chart(&mut self.chart, &chart);
    }
}

/// Looks up one tuple for the single-query path.
pub fn single_query(
    table: &CriteriaTable,
    request: &LookupRequest,
) -> Result<SingleQueryDisplay, EvaluationError> {
    let query = request.to_query()?;
    let row = lookup::find_match(table.rows(), &query);
    Ok(SingleQueryDisplay::from_match(row))
}

/// Per-factor entry as submitted by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FactorEntry {
    pub factor: FitnessFactor,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default, deserialize_with = "lenient_record")]
    pub record: String,
}

impl FactorEntry {
    /// Unknown item names count as "not selected".
    pub fn to_input(&self) -> FactorInput {
        let item = self.item.as_deref().and_then(AssessmentItem::parse);
        FactorInput::new(item, self.record.clone())
    }
}

/// Replays a profile and a batch of factor entries through a session.
pub fn replay<S: ChartSink>(
    table: Arc<CriteriaTable>,
    chart: S,
    profile: StudentProfile,
    entries: &[FactorEntry],
) -> AssessmentSession<S> {
    let mut session = AssessmentSession::new(table, chart);
    session.apply(AssessmentEvent::ProfileChanged(profile));
    for entry in entries {
        session.apply(AssessmentEvent::FactorInputChanged {
            factor: entry.factor,
            input: entry.to_input(),
        });
    }
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::criteria::ReferenceRow;
    use crate::assessment::presentation::RecordingChartSink;

    fn table() -> Arc<CriteriaTable> {
        Arc::new(CriteriaTable::new(vec![
            ReferenceRow::new(
                "심폐지구력",
                "왕복오래달리기",
                "3",
                "M",
                "elementary",
                "8~10",
                80,
                "1등급",
            ),
            ReferenceRow::new("비만", "체질량지수", "3", "M", "elementary", "0~30", 5, "3등급"),
        ]))
    }

    fn profile() -> StudentProfile {
        StudentProfile::new("elementary", "3", "M")
    }

    fn session() -> AssessmentSession<RecordingChartSink> {
        let mut session = AssessmentSession::new(table(), RecordingChartSink::default());
        session.set_profile(profile());
        session
    }

    #[test]
    fn new_session_pushes_an_empty_chart() {
        let session = AssessmentSession::new(table(), RecordingChartSink::default());
        assert_eq!(session.chart().frames().len(), 1);
        assert_eq!(session.chart().last().map(|c| c.series), Some([0; 5]));
    }

    #[test]
    fn factor_input_updates_one_factor_and_chart() {
        let mut session = session();
        let refresh = session.set_factor_input(
            FitnessFactor::Cardio,
            FactorInput::new(Some(AssessmentItem::ShuttleRun), "9"),
        );

        assert_eq!(refresh, Refresh::Factor(FitnessFactor::Cardio));
        assert_eq!(session.result(FitnessFactor::Cardio), &FactorResult::new(80, "1등급"));
        assert_eq!(session.chart().last().map(|c| c.series), Some([5, 0, 0, 0, 0]));
        assert_eq!(session.dashboard().total_score, 80);
        assert_eq!(session.dashboard().total_grade.label(), "1등급");
    }

    #[test]
    fn profile_change_resets_every_factor() {
        let mut session = session();
        session.set_factor_input(
            FitnessFactor::Cardio,
            FactorInput::new(Some(AssessmentItem::ShuttleRun), "9"),
        );
        session.set_factor_input(
            FitnessFactor::Obesity,
            FactorInput::new(Some(AssessmentItem::BodyMassIndex), "21.4"),
        );
        assert_eq!(session.dashboard().total_score, 85);

        let refresh = session.apply(AssessmentEvent::ProfileChanged(StudentProfile::new(
            "middle", "3", "M",
        )));

        assert_eq!(refresh, Refresh::AllFactors);
        assert_eq!(refresh.factors().len(), 5);
        assert!(session.state().is_empty());
        let dashboard = session.dashboard();
        assert_eq!(dashboard.total_score, 0);
        assert_eq!(dashboard.total_grade.label(), "5등급");
        assert_eq!(session.chart().last().map(|c| c.series), Some([0; 5]));
    }

    #[test]
    fn invalid_live_input_clears_quietly_and_repeatably() {
        let mut session = session();
        session.set_factor_input(
            FitnessFactor::Cardio,
            FactorInput::new(Some(AssessmentItem::ShuttleRun), "9"),
        );

        for _ in 0..3 {
            session.set_factor_input(
                FitnessFactor::Cardio,
                FactorInput::new(Some(AssessmentItem::ShuttleRun), "abc"),
            );
            assert_eq!(session.result(FitnessFactor::Cardio), &FactorResult::default());
        }
    }

    #[test]
    fn live_input_without_profile_is_empty() {
        let mut session = AssessmentSession::new(table(), RecordingChartSink::default());
        session.set_factor_input(
            FitnessFactor::Cardio,
            FactorInput::new(Some(AssessmentItem::ShuttleRun), "9"),
        );
        assert!(session.state().is_empty());
    }

    #[test]
    fn mismatched_item_clears_the_factor() {
        let mut session = session();
        session.set_factor_input(
            FitnessFactor::Flexibility,
            FactorInput::new(Some(AssessmentItem::ShuttleRun), "9"),
        );
        assert!(session.result(FitnessFactor::Flexibility).is_empty());
    }

    #[test]
    fn single_query_leaves_state_alone() {
        let session = session();
        let frames_before = session.chart().frames().len();
        let display = session
            .lookup(&LookupRequest {
                factor: "심폐지구력".to_string(),
                item: "왕복오래달리기".to_string(),
                grade_level: "3".to_string(),
                sex: "M".to_string(),
                school_stage: "elementary".to_string(),
                record: "10".to_string(),
            })
            .expect("lookup succeeds");

        assert!(display.matched);
        assert_eq!(display.grade, "1등급");
        assert_eq!(display.score, "80");
        assert!(session.state().is_empty());
        assert_eq!(session.chart().frames().len(), frames_before);
    }

    #[test]
    fn single_query_reports_incomplete_input() {
        let session = session();
        let error = session
            .lookup(&LookupRequest::default())
            .expect_err("blank form rejected");
        assert_eq!(error, EvaluationError::MissingField("factor"));
    }

    #[test]
    fn replay_applies_entries_in_order() {
        let entries = vec![
            FactorEntry {
                factor: FitnessFactor::Cardio,
                item: Some("왕복오래달리기".to_string()),
                record: "9".to_string(),
            },
            FactorEntry {
                factor: FitnessFactor::Cardio,
                item: Some("왕복오래달리기".to_string()),
                record: "11".to_string(),
            },
            FactorEntry {
                factor: FitnessFactor::Obesity,
                item: Some("bmi".to_string()),
                record: "18".to_string(),
            },
        ];
        let session = replay(table(), RecordingChartSink::default(), profile(), &entries);

        assert!(session.result(FitnessFactor::Cardio).is_empty());
        assert_eq!(session.result(FitnessFactor::Obesity).score, 5);
        assert_eq!(session.input(FitnessFactor::Cardio).record, "11");
        assert_eq!(session.chart().last().map(|c| c.series), Some([0, 0, 0, 0, 3]));
    }
}
