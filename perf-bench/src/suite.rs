//! Benchmark suites: the models, datasets and criteria of one task.

use crate::{
    benchmark::{
        BenchmarkCase, BenchmarkGroup, BenchmarkKind, DataSize, Dataset, Model, ModelCategory,
    },
    common::*,
    criterion::{Compare, Criterion, Summary},
    filter::CaseFilter,
};

pub const SEMANTIC_SEGMENTATION: &str = "semantic_segmentation";

const KVASIR_FORMAT: &str = "common_semantic_segmentation_with_subset_dirs";
const DEFAULT_MARGIN: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    pub task: String,
    pub models: Vec<Model>,
    pub datasets: Vec<Dataset>,
    pub groups: Vec<BenchmarkGroup>,
}

impl Suite {
    /// Semantic segmentation models on the Kvasir polyp datasets.
    pub fn semantic_segmentation() -> Self {
        use ModelCategory as C;

        let models = [
            ("litehrnet_18", C::Balance),
            ("litehrnet_s", C::Speed),
            ("litehrnet_x", C::Accuracy),
            ("segnext_b", C::Other),
            ("segnext_s", C::Other),
            ("segnext_t", C::Other),
            ("dino_v2", C::Other),
        ]
        .into_iter()
        .map(|(name, category)| Model::new(SEMANTIC_SEGMENTATION, name, category))
        .collect();

        let kvasir = |name: String, path: PathBuf, size: DataSize, num_repeat: usize| Dataset {
            name,
            path,
            size,
            data_format: KVASIR_FORMAT.to_string(),
            num_classes: 2,
            num_repeat,
            extra_overrides: IndexMap::new(),
        };
        let small_root = Path::new("semantic_seg").join("kvasir_small");
        let datasets = (1..=3)
            .map(|index| {
                kvasir(
                    format!("kvasir_small_{}", index),
                    small_root.join(index.to_string()),
                    DataSize::Small,
                    3,
                )
            })
            .chain([
                kvasir(
                    "kvasir_medium".to_string(),
                    Path::new("semantic_seg").join("kvasir_medium"),
                    DataSize::Medium,
                    3,
                ),
                kvasir(
                    "kvasir_large".to_string(),
                    Path::new("semantic_seg").join("kvasir_large"),
                    DataSize::Large,
                    1,
                ),
            ])
            .collect();

        let accuracy = BenchmarkGroup {
            kind: BenchmarkKind::Accuracy,
            criteria: [
                ("epoch", Compare::Less),
                ("val/Dice", Compare::Greater),
                ("test/Dice", Compare::Greater),
                ("export/Dice", Compare::Greater),
                ("optimize/Dice", Compare::Greater),
            ]
            .into_iter()
            .map(|(name, compare)| Criterion::new(name, Summary::Max, compare, DEFAULT_MARGIN))
            .collect(),
        };
        let efficiency = BenchmarkGroup {
            kind: BenchmarkKind::Efficiency,
            criteria: [
                "train/iter_time",
                "test/iter_time",
                "export/iter_time",
                "optimize/iter_time",
            ]
            .into_iter()
            .map(|name| Criterion::new(name, Summary::Mean, Compare::Less, DEFAULT_MARGIN))
            .collect(),
        };

        Self {
            task: SEMANTIC_SEGMENTATION.to_string(),
            models,
            datasets,
            groups: vec![accuracy, efficiency],
        }
    }

    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let suite: Self = json5::from_str(&text)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        suite.validate()?;
        Ok(suite)
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            task,
            models,
            datasets,
            groups,
        } = self;

        if let Some(model) = models.iter().find(|model| &model.task != task) {
            bail!(
                "model '{}' belongs to task '{}' instead of '{}'",
                model.name,
                model.task,
                task
            );
        }
        if let Some(dataset) = datasets.iter().find(|dataset| dataset.num_repeat == 0) {
            bail!("dataset '{}' must repeat at least once", dataset.name);
        }
        ensure!(
            models.iter().map(|model| &model.name).all_unique(),
            "model names must be unique"
        );
        ensure!(
            datasets.iter().map(|dataset| &dataset.name).all_unique(),
            "dataset names must be unique"
        );
        ensure!(
            groups.iter().map(|group| group.kind).all_unique(),
            "benchmark types must be unique"
        );
        for criterion in groups.iter().flat_map(|group| &group.criteria) {
            ensure!(
                criterion.margin.raw() >= 0.0,
                "margin of criterion '{}' must be non-negative",
                criterion.name
            );
        }

        Ok(())
    }

    /// The full cartesian product of models, datasets and groups.
    pub fn all_cases(&self) -> Vec<BenchmarkCase> {
        iproduct!(&self.models, &self.datasets, &self.groups)
            .map(|(model, dataset, group)| BenchmarkCase {
                model: model.clone(),
                dataset: dataset.clone(),
                group: group.clone(),
            })
            .collect()
    }

    /// The cases selected by `filter`.
    pub fn cases(&self, filter: &CaseFilter) -> Vec<BenchmarkCase> {
        let cases = self.all_cases();
        let total = cases.len();
        let selected: Vec<_> = cases
            .into_iter()
            .filter(|case| filter.accepts(case))
            .collect();
        debug!(
            "select {} of {} {} cases",
            selected.len(),
            total,
            self.task
        );
        selected
    }
}
