//! PAPS fitness assessment: criteria lookup, score aggregation, and the
//! radar-chart presentation adapter.

pub mod aggregation;
pub mod criteria;
pub mod domain;
pub mod lookup;
pub mod presentation;
pub mod router;
pub mod session;
pub mod state;

pub use aggregation::{total_grade, total_score};
pub use criteria::{wait_for_dataset, CriteriaTable, DatasetError, RecordRange, ReferenceRow};
pub use domain::{AssessmentItem, FactorResult, FitnessFactor, GradeBand, StudentProfile};
pub use lookup::{find_match, parse_record, CriteriaQuery, EvaluationError, LookupRequest};
pub use presentation::{
    chart_series, grade_from_chart_value, ChartData, ChartSink, Dashboard, RecordingChartSink,
    RenderError, SingleQueryDisplay,
};
pub use router::assessment_router;
pub use session::{
    replay, single_query, AssessmentEvent, AssessmentSession, FactorEntry, FactorInput, Refresh,
};
pub use state::EvaluationState;
