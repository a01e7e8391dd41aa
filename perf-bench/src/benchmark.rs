//! Benchmark subjects: models, datasets and criteria groups.

use crate::{common::*, criterion::Criterion};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    Balance,
    Speed,
    Accuracy,
    Other,
}

/// A model recipe under benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Model {
    pub task: String,
    pub name: String,
    pub category: ModelCategory,
}

impl Model {
    pub fn new(task: &str, name: &str, category: ModelCategory) -> Self {
        Self {
            task: task.to_string(),
            name: name.to_string(),
            category,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataSize {
    Small,
    Medium,
    Large,
}

/// A dataset the models are trained and evaluated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    /// Location relative to the data root.
    pub path: PathBuf,
    pub size: DataSize,
    pub data_format: String,
    pub num_classes: usize,
    /// Number of repeated runs with distinct seeds.
    #[serde(default = "default_num_repeat")]
    pub num_repeat: usize,
    /// Extra options passed to every run on this dataset.
    #[serde(default)]
    pub extra_overrides: IndexMap<String, String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkKind {
    Accuracy,
    Efficiency,
}

/// A named set of criteria checked together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkGroup {
    #[serde(rename = "type")]
    pub kind: BenchmarkKind,
    pub criteria: Vec<Criterion>,
}

/// One cell of the benchmark matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkCase {
    pub model: Model,
    pub dataset: Dataset,
    pub group: BenchmarkGroup,
}

impl BenchmarkCase {
    pub fn id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.model.name,
            self.dataset.name,
            self.group.kind.as_ref()
        )
    }

    /// The key that identifies rows of this case in result tables.
    pub fn result_key(&self) -> ResultKey {
        ResultKey {
            task: self.model.task.clone(),
            model: self.model.name.clone(),
            data: self.dataset.name.clone(),
        }
    }
}

/// Identifies the runs of one model on one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub task: String,
    pub model: String,
    pub data: String,
}

impl Display for ResultKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.task, self.model, self.data)
    }
}

fn default_num_repeat() -> usize {
    1
}
