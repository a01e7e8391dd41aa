//! Benchmark session configuration format.

use crate::{
    common::*,
    filter::{CaseFilter, DataGroup, ModelCategoryFilter},
};

/// The benchmark session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfConfig {
    /// The directory the dataset paths are relative to.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// The directory where runs write their outputs.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default)]
    pub model_category: ModelCategoryFilter,
    #[serde(default)]
    pub data_group: DataGroup,
    /// If set, it overrides the number of repeats of every dataset.
    pub num_repeat: Option<NonZeroUsize>,
    /// Benchmark suite file. The built-in semantic segmentation suite is used
    /// if it is not set.
    pub suite_file: Option<PathBuf>,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            output_root: default_output_root(),
            model_category: ModelCategoryFilter::default(),
            data_group: DataGroup::default(),
            num_repeat: None,
            suite_file: None,
        }
    }
}

impl PerfConfig {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }

    pub fn filter(&self) -> CaseFilter {
        CaseFilter {
            model_category: self.model_category,
            data_group: self.data_group,
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("perf-output")
}
