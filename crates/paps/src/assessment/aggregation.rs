use super::domain::GradeBand;
use super::state::EvaluationState;

/// Sum of all five factor scores. Factors without a result contribute 0.
/// Saturates at `u32::MAX`.
pub fn total_score(state: &EvaluationState) -> u32 {
    state
        .results()
        .fold(0u32, |acc, (_, result)| acc.saturating_add(result.score))
}

/// Bands a total score into an overall grade.
///
/// | Total | Grade |
/// |-------|-------|
/// | >= 80 | 1등급 |
/// | >= 60 | 2등급 |
/// | >= 40 | 3등급 |
/// | >= 20 | 4등급 |
/// | < 20  | 5등급 |
pub fn total_grade(total_score: u32) -> GradeBand {
    let band = match total_score {
        score if score >= 80 => 1,
        score if score >= 60 => 2,
        score if score >= 40 => 3,
        score if score >= 20 => 4,
        _ => 5,
    };
    GradeBand::new(band).unwrap_or(GradeBand::WORST)
}
