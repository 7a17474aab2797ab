use crate::infra::{parse_factor_entry, prepare_cli};
use clap::Args;
use paps::assessment::lookup::INCOMPLETE_INPUT_MESSAGE;
use paps::assessment::presentation::tick_label;
use paps::assessment::router::factor_catalog;
use paps::assessment::{
    replay, single_query, ChartData, Dashboard, FactorEntry, LookupRequest, RecordingChartSink,
    SingleQueryDisplay, StudentProfile,
};
use paps::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Criteria dataset (.csv or .json). Defaults to APP_DATASET_PATH.
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Fitness factor, Korean label or key (e.g. 심폐지구력, cardio)
    #[arg(long, default_value = "")]
    pub(crate) factor: String,
    /// Assessment item, Korean label or key (e.g. 왕복오래달리기, shuttle_run)
    #[arg(long, default_value = "")]
    pub(crate) item: String,
    /// Grade level as written in the dataset
    #[arg(long, default_value = "")]
    pub(crate) grade: String,
    /// Sex as written in the dataset
    #[arg(long, default_value = "")]
    pub(crate) sex: String,
    /// School stage as written in the dataset
    #[arg(long, default_value = "")]
    pub(crate) stage: String,
    /// Measured record
    #[arg(long, default_value = "")]
    pub(crate) record: String,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Criteria dataset (.csv or .json). Defaults to APP_DATASET_PATH.
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Grade level as written in the dataset
    #[arg(long, default_value = "")]
    pub(crate) grade: String,
    /// Sex as written in the dataset
    #[arg(long, default_value = "")]
    pub(crate) sex: String,
    /// School stage as written in the dataset
    #[arg(long, default_value = "")]
    pub(crate) stage: String,
    /// Factor input as factor=item:record; repeat once per factor
    #[arg(long = "entry", value_parser = parse_factor_entry)]
    pub(crate) entries: Vec<FactorEntry>,
}

pub(crate) async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let LookupArgs {
        dataset,
        factor,
        item,
        grade,
        sex,
        stage,
        record,
    } = args;

    let table = prepare_cli(dataset).await?;
    let request = LookupRequest {
        factor,
        item,
        grade_level: grade,
        sex,
        school_stage: stage,
        record,
    };

    match single_query(&table, &request) {
        Ok(display) => {
            print!("{}", render_single_query(&display));
            Ok(())
        }
        Err(err) => {
            eprintln!("{INCOMPLETE_INPUT_MESSAGE}");
            Err(err.into())
        }
    }
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        dataset,
        grade,
        sex,
        stage,
        entries,
    } = args;

    let table = prepare_cli(dataset).await?;
    let profile = StudentProfile::new(stage, grade, sex);
    let session = replay(table, RecordingChartSink::default(), profile, &entries);

    print!("{}", render_dashboard(session.profile(), &session.dashboard()));
    Ok(())
}

pub(crate) fn run_items() {
    for factor in factor_catalog() {
        println!("{} ({})", factor.label, factor.factor.key());
        for item in factor.items {
            println!("- {} ({})", item.label, item.key);
        }
    }
}

pub(crate) fn render_single_query(display: &SingleQueryDisplay) -> String {
    format!("등급: {}\n점수: {}\n", display.grade, display.score)
}

pub(crate) fn render_dashboard(profile: &StudentProfile, dashboard: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "PAPS evaluation: {} / {} / {}\n",
        display_or_dash(&profile.school_stage),
        display_or_dash(&profile.grade_level),
        display_or_dash(&profile.sex)
    ));

    out.push_str("\nFactor results\n");
    for factor in &dashboard.factors {
        out.push_str(&format!(
            "- {}: {} | {}\n",
            factor.label, factor.score_text, factor.grade
        ));
    }

    out.push_str("\nRadar chart\n");
    out.push_str(&render_chart_bars(&dashboard.chart));

    out.push_str(&format!(
        "\nTotal: {}점 ({})\n",
        dashboard.total_score,
        dashboard.total_grade.label()
    ));
    out
}

/// Text stand-in for the radar chart: one bar per factor, longest for grade 1.
pub(crate) fn render_chart_bars(chart: &ChartData) -> String {
    let width = chart
        .labels
        .iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0);

    chart
        .labels
        .iter()
        .zip(chart.series.iter())
        .map(|(label, value)| {
            let pad = width - label.chars().count();
            let bar = format!("{}{}", "#".repeat(*value as usize), ".".repeat(5 - *value as usize));
            let tick = tick_label(*value).unwrap_or_else(|| "-".to_string());
            format!("  {label}{} {bar} {tick}\n", " ".repeat(pad))
        })
        .collect()
}

fn display_or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "-"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paps::assessment::{EvaluationState, FactorResult, FitnessFactor};

    fn sample_state() -> EvaluationState {
        EvaluationState::default()
            .with_result(FitnessFactor::Cardio, FactorResult::new(20, "1등급"))
            .with_result(FitnessFactor::Power, FactorResult::new(10, "3등급"))
    }

    #[test]
    fn chart_bars_scale_with_grade() {
        let chart = ChartData::from_state(&sample_state());
        let rendered = render_chart_bars(&chart);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("##### 1등급"));
        assert!(lines[1].contains("..... -"));
        assert!(lines[3].contains("###.. 3등급"));
    }

    #[test]
    fn dashboard_rendering_includes_totals() {
        let profile = StudentProfile::new("초등학교", "5", "");
        let rendered = render_dashboard(&profile, &Dashboard::from_state(&sample_state()));

        assert!(rendered.contains("초등학교 / 5 / -"));
        assert!(rendered.contains("- 심폐지구력: 20점 | 1등급"));
        assert!(rendered.contains("- 비만: 0점 | -"));
        assert!(rendered.contains("Total: 30점 (4등급)"));
    }

    #[test]
    fn single_query_rendering_shows_sentinels() {
        let rendered = render_single_query(&SingleQueryDisplay::from_match(None));
        assert_eq!(rendered, "등급: 해당 없음\n점수: -\n");
    }
}
