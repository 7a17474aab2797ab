use serde::{Deserialize, Serialize};
use std::fmt;

/// Grade text shown when a factor has no result yet.
pub const NO_RESULT: &str = "-";

/// The five measured physical capacities, in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FitnessFactor {
    Cardio,
    Flexibility,
    Muscular,
    Power,
    Obesity,
}

impl FitnessFactor {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Cardio,
            Self::Flexibility,
            Self::Muscular,
            Self::Power,
            Self::Obesity,
        ]
    }

    /// Position in [`FitnessFactor::ordered`].
    pub const fn index(self) -> usize {
        match self {
            Self::Cardio => 0,
            Self::Flexibility => 1,
            Self::Muscular => 2,
            Self::Power => 3,
            Self::Obesity => 4,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Cardio => "cardio",
            Self::Flexibility => "flexibility",
            Self::Muscular => "muscular",
            Self::Power => "power",
            Self::Obesity => "obesity",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cardio => "심폐지구력",
            Self::Flexibility => "유연성",
            Self::Muscular => "근력근지구력",
            Self::Power => "순발력",
            Self::Obesity => "비만",
        }
    }

    pub const fn items(self) -> &'static [AssessmentItem] {
        match self {
            Self::Cardio => &[
                AssessmentItem::ShuttleRun,
                AssessmentItem::StepTest,
                AssessmentItem::LongRunWalk,
            ],
            Self::Flexibility => &[
                AssessmentItem::SitAndReach,
                AssessmentItem::ComprehensiveFlexibility,
            ],
            Self::Muscular => &[
                AssessmentItem::PushUp,
                AssessmentItem::CurlUp,
                AssessmentItem::GripStrength,
            ],
            Self::Power => &[AssessmentItem::Sprint50m, AssessmentItem::StandingLongJump],
            Self::Obesity => &[AssessmentItem::BodyMassIndex],
        }
    }

    /// Accepts either the Korean label or the ASCII key.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ordered()
            .into_iter()
            .find(|factor| factor.label() == value || factor.key().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for FitnessFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for FitnessFactor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown fitness factor '{value}'"))
    }
}

impl From<FitnessFactor> for String {
    fn from(value: FitnessFactor) -> Self {
        value.key().to_string()
    }
}

/// A test administered for exactly one fitness factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssessmentItem {
    ShuttleRun,
    StepTest,
    LongRunWalk,
    SitAndReach,
    ComprehensiveFlexibility,
    PushUp,
    CurlUp,
    GripStrength,
    Sprint50m,
    StandingLongJump,
    BodyMassIndex,
}

impl AssessmentItem {
    pub const fn all() -> [Self; 11] {
        [
            Self::ShuttleRun,
            Self::StepTest,
            Self::LongRunWalk,
            Self::SitAndReach,
            Self::ComprehensiveFlexibility,
            Self::PushUp,
            Self::CurlUp,
            Self::GripStrength,
            Self::Sprint50m,
            Self::StandingLongJump,
            Self::BodyMassIndex,
        ]
    }

    pub const fn factor(self) -> FitnessFactor {
        match self {
            Self::ShuttleRun | Self::StepTest | Self::LongRunWalk => FitnessFactor::Cardio,
            Self::SitAndReach | Self::ComprehensiveFlexibility => FitnessFactor::Flexibility,
            Self::PushUp | Self::CurlUp | Self::GripStrength => FitnessFactor::Muscular,
            Self::Sprint50m | Self::StandingLongJump => FitnessFactor::Power,
            Self::BodyMassIndex => FitnessFactor::Obesity,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::ShuttleRun => "shuttle_run",
            Self::StepTest => "step_test",
            Self::LongRunWalk => "long_run_walk",
            Self::SitAndReach => "sit_and_reach",
            Self::ComprehensiveFlexibility => "comprehensive_flexibility",
            Self::PushUp => "push_up",
            Self::CurlUp => "curl_up",
            Self::GripStrength => "grip_strength",
            Self::Sprint50m => "sprint_50m",
            Self::StandingLongJump => "standing_long_jump",
            Self::BodyMassIndex => "bmi",
        }
    }

    /// Name used by the reference dataset.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShuttleRun => "왕복오래달리기",
            Self::StepTest => "스텝검사",
            Self::LongRunWalk => "오래달리기-걷기",
            Self::SitAndReach => "앉아윗몸앞으로굽히기",
            Self::ComprehensiveFlexibility => "종합유연성검사",
            Self::PushUp => "(무릎대고)팔굽혀펴기",
            Self::CurlUp => "윗몸말아올리기",
            Self::GripStrength => "악력",
            Self::Sprint50m => "50m달리기",
            Self::StandingLongJump => "제자리멀리뛰기",
            Self::BodyMassIndex => "체질량지수",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all()
            .into_iter()
            .find(|item| item.label() == value || item.key().eq_ignore_ascii_case(value))
    }

    pub fn belongs_to(self, factor: FitnessFactor) -> bool {
        self.factor() == factor
    }
}

impl fmt::Display for AssessmentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for AssessmentItem {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown assessment item '{value}'"))
    }
}

impl From<AssessmentItem> for String {
    fn from(value: AssessmentItem) -> Self {
        value.key().to_string()
    }
}

/// Grade band 1 (best) through 5 (worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GradeBand(u8);

impl GradeBand {
    pub const WORST: Self = Self(5);

    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= 5 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("{}등급", self.0)
    }

    /// Reads the band out of a `"{n}등급"` label.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_suffix("등급").unwrap_or(trimmed).trim();
        digits.parse::<u8>().ok().and_then(Self::new)
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}등급", self.0)
    }
}

impl Serialize for GradeBand {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Shared student identity inputs. Changing any of them invalidates every
/// factor result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default)]
    pub school_stage: String,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub sex: String,
}

impl StudentProfile {
    pub fn new(
        school_stage: impl Into<String>,
        grade_level: impl Into<String>,
        sex: impl Into<String>,
    ) -> Self {
        Self {
            school_stage: school_stage.into(),
            grade_level: grade_level.into(),
            sex: sex.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.school_stage, &self.grade_level, &self.sex]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

/// Score and grade for one factor. The default is the "no result" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorResult {
    pub score: u32,
    pub grade: String,
}

impl FactorResult {
    pub fn new(score: u32, grade: impl Into<String>) -> Self {
        Self {
            score,
            grade: grade.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grade == NO_RESULT
    }

    pub fn grade_band(&self) -> Option<GradeBand> {
        if self.is_empty() {
            None
        } else {
            GradeBand::parse(&self.grade)
        }
    }

    pub fn score_text(&self) -> String {
        format!("{}점", self.score)
    }
}

impl Default for FactorResult {
    fn default() -> Self {
        Self {
            score: 0,
            grade: NO_RESULT.to_string(),
        }
    }
}
