use metrics_exporter_prometheus::PrometheusHandle;
use paps::assessment::{wait_for_dataset, CriteriaTable, FactorEntry, FitnessFactor};
use paps::config::{AppConfig, DatasetConfig};
use paps::error::AppError;
use paps::telemetry;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Waits for the configured dataset, honoring a command-line override.
pub(crate) async fn load_criteria(
    mut config: DatasetConfig,
    dataset: Option<PathBuf>,
) -> Result<Arc<CriteriaTable>, AppError> {
    if let Some(path) = dataset {
        config.path = path;
    }
    let table = wait_for_dataset(&config).await?;
    Ok(Arc::new(table))
}

/// Shared start-up for the one-shot subcommands: config, telemetry, criteria.
pub(crate) async fn prepare_cli(
    dataset: Option<PathBuf>,
) -> Result<Arc<CriteriaTable>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    load_criteria(config.dataset, dataset).await
}

/// Parses `factor=item:record`. The item and record may be blank.
pub(crate) fn parse_factor_entry(raw: &str) -> Result<FactorEntry, String> {
    let (factor, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected factor=item:record, got '{raw}'"))?;
    let factor = FitnessFactor::parse(factor)
        .ok_or_else(|| format!("unknown fitness factor '{}'", factor.trim()))?;
    let (item, record) = rest.split_once(':').unwrap_or((rest, ""));
    let item = item.trim();

    Ok(FactorEntry {
        factor,
        item: (!item.is_empty()).then(|| item.to_string()),
        record: record.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_entries() {
        let entry = parse_factor_entry("유연성=앉아윗몸앞으로굽히기:7.5").expect("parses");
        assert_eq!(entry.factor, FitnessFactor::Flexibility);
        assert_eq!(entry.item.as_deref(), Some("앉아윗몸앞으로굽히기"));
        assert_eq!(entry.record, "7.5");
    }

    #[test]
    fn blank_item_and_record_are_allowed() {
        let entry = parse_factor_entry("power=").expect("parses");
        assert_eq!(entry.factor, FitnessFactor::Power);
        assert!(entry.item.is_none());
        assert!(entry.record.is_empty());
    }

    #[tokio::test]
    async fn cli_start_up_installs_telemetry_and_loads_criteria() {
        let path = std::env::temp_dir().join(format!("paps-cli-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "체력요인,평가종목,학년,성별,학교과정,기록,점수,등급\n\
             비만,체질량지수,5,남,초등학교,14.6~19.9,20,1등급\n",
        )
        .expect("write fixture");

        let table = prepare_cli(Some(path.clone())).await.expect("criteria load");
        assert_eq!(table.len(), 1);

        let config = AppConfig::load().expect("config loads");
        let again = telemetry::init(&config.telemetry);
        assert!(matches!(again, Err(telemetry::TelemetryError::Subscriber(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_factor_is_rejected() {
        let error = parse_factor_entry("speed=50m달리기:9").expect_err("rejected");
        assert!(error.contains("speed"));
    }
}
