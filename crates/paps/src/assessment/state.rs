use super::domain::{FactorResult, FitnessFactor};
use serde::Serialize;

/// One result per fitness factor. Transitions consume the state and return
/// the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationState {
    results: [FactorResult; 5],
}

impl EvaluationState {
    pub fn result(&self, factor: FitnessFactor) -> &FactorResult {
        &self.results[factor.index()]
    }

    /// Results paired with their factor, in chart order.
    pub fn results(&self) -> impl Iterator<Item = (FitnessFactor, &FactorResult)> + '_ {
        FitnessFactor::ordered()
            .into_iter()
            .map(move |factor| (factor, self.result(factor)))
    }

    pub fn with_result(mut self, factor: FitnessFactor, result: FactorResult) -> Self {
        self.results[factor.index()] = result;
        self
    }

    pub fn with_cleared(self, factor: FitnessFactor) -> Self {
        self.with_result(factor, FactorResult::default())
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.iter().all(FactorResult::is_empty)
    }
}
