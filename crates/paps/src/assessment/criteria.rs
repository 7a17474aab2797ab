use crate::config::DatasetConfig;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Separator between the lower and upper bound of a record range.
pub const RANGE_SEPARATOR: char = '~';

/// Inclusive `[min, max]` bounds for a measured record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordRange {
    pub min: f64,
    pub max: f64,
}

impl RecordRange {
    /// Parses `"min~max"`. Pieces after the second separator are ignored.
    /// Returns `None` when either bound is missing or not a number.
    pub fn parse(value: &str) -> Option<Self> {
        let mut pieces = value.split(RANGE_SEPARATOR);
        let min = pieces.next()?.trim().parse::<f64>().ok()?;
        let max = pieces.next()?.trim().parse::<f64>().ok()?;
        Some(Self { min, max })
    }

    pub fn contains(&self, record: f64) -> bool {
        record >= self.min && record <= self.max
    }
}

/// One row of the externally supplied assessment criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    #[serde(rename = "체력요인")]
    pub factor: String,
    #[serde(rename = "평가종목")]
    pub item: String,
    #[serde(rename = "학년")]
    pub grade_level: String,
    #[serde(rename = "성별")]
    pub sex: String,
    #[serde(rename = "학교과정")]
    pub school_stage: String,
    #[serde(rename = "기록")]
    pub record: String,
    #[serde(rename = "점수", deserialize_with = "lenient_score")]
    pub score: u32,
    #[serde(rename = "등급")]
    pub grade: String,
    #[serde(skip)]
    range: Option<RecordRange>,
}

impl ReferenceRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        factor: impl Into<String>,
        item: impl Into<String>,
        grade_level: impl Into<String>,
        sex: impl Into<String>,
        school_stage: impl Into<String>,
        record: impl Into<String>,
        score: u32,
        grade: impl Into<String>,
    ) -> Self {
        let record = record.into();
        let range = RecordRange::parse(&record);
        Self {
            factor: factor.into(),
            item: item.into(),
            grade_level: grade_level.into(),
            sex: sex.into(),
            school_stage: school_stage.into(),
            record,
            score,
            grade: grade.into(),
            range,
        }
    }

    /// Parsed record bounds, `None` when the dataset range is malformed.
    pub fn range(&self) -> Option<RecordRange> {
        self.range
    }

    fn with_parsed_range(mut self) -> Self {
        self.range = RecordRange::parse(&self.record);
        if self.range.is_none() {
            debug!(record = %self.record, item = %self.item, "criteria row has no usable range");
        }
        self
    }
}

/// Immutable, ordered collection of criteria rows.
#[derive(Debug, Clone, Default)]
pub struct CriteriaTable {
    rows: Vec<ReferenceRow>,
}

impl CriteriaTable {
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        let rows = rows
            .into_iter()
            .map(ReferenceRow::with_parsed_range)
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Loads a `.csv` or `.json` dataset, chosen by file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let format = DatasetFormat::from_path(path).ok_or_else(|| {
            DatasetError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
        })?;

        let file = std::fs::File::open(path)?;
        let table = match format {
            DatasetFormat::Csv => Self::from_csv_reader(file)?,
            DatasetFormat::Json => Self::from_json_reader(file)?,
        };

        info!(path = %path.display(), rows = table.len(), "reference criteria loaded");
        Ok(table)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let mut rows = Vec::new();

        for row in csv_reader.deserialize::<ReferenceRow>() {
            rows.push(row?);
        }

        Ok(Self::new(rows))
    }

    /// Accepts either `{"평가기준": [...]}` or a bare array of rows.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let dataset: JsonDataset = serde_json::from_reader(reader)?;
        let rows = match dataset {
            JsonDataset::Wrapped { rows } => rows,
            JsonDataset::Bare(rows) => rows,
        };
        Ok(Self::new(rows))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDataset {
    Wrapped {
        #[serde(rename = "평가기준")]
        rows: Vec<ReferenceRow>,
    },
    Bare(Vec<ReferenceRow>),
}

/// Polls for the dataset file, giving up after the configured number of
/// attempts. A file that exists but fails to parse is reported immediately.
pub async fn wait_for_dataset(config: &DatasetConfig) -> Result<CriteriaTable, DatasetError> {
    let attempts = config.wait_attempts.max(1);

    for attempt in 1..=attempts {
        if config.path.exists() {
            return CriteriaTable::from_path(&config.path);
        }

        debug!(attempt, path = %config.path.display(), "reference dataset not present yet");
        if attempt < attempts {
            tokio::time::sleep(config.wait_delay).await;
        }
    }

    error!(path = %config.path.display(), attempts, "reference dataset failed to load");
    Err(DatasetError::Unavailable {
        path: config.path.clone(),
        attempts,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read reference dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reference CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid reference JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported dataset format for '{}'", .path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("reference dataset unavailable after {attempts} attempts: {}", .path.display())]
    Unavailable { path: PathBuf, attempts: u32 },
}

/// Scores arrive as numbers or numeric strings depending on the source.
fn lenient_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative score as a number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u32, E> {
            u32::try_from(value).map_err(|_| E::custom(format!("score {value} out of range")))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u32, E> {
            u32::try_from(value).map_err(|_| E::custom(format!("score {value} out of range")))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<u32, E> {
            if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
                Ok(value.trunc() as u32)
            } else {
                Err(E::custom(format!("score {value} out of range")))
            }
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u32, E> {
            let trimmed = value.trim();
            if let Ok(score) = trimmed.parse::<u32>() {
                return Ok(score);
            }
            match trimmed.parse::<f64>() {
                Ok(score) => self.visit_f64(score),
                Err(_) => Err(E::custom(format!("score '{value}' is not numeric"))),
            }
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}
