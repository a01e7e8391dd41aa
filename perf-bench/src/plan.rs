use crate::{benchmark::BenchmarkCase, common::*, config::PerfConfig};

/// One training and evaluation run of a benchmark case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub case_id: String,
    pub task: String,
    pub model: String,
    pub dataset: String,
    pub seed: usize,
    pub data_path: PathBuf,
    pub work_dir: PathBuf,
    pub overrides: IndexMap<String, String>,
}

impl Run {
    /// Command line options describing the run, in `--key value` form.
    pub fn args(&self) -> Vec<String> {
        let Self {
            model,
            seed,
            data_path,
            work_dir,
            overrides,
            ..
        } = self;

        let mut args = vec![
            "--model".to_string(),
            model.clone(),
            "--data_root".to_string(),
            data_path.display().to_string(),
            "--work_dir".to_string(),
            work_dir.display().to_string(),
            "--seed".to_string(),
            seed.to_string(),
            "--deterministic".to_string(),
            "True".to_string(),
        ];
        args.extend(
            overrides
                .iter()
                .flat_map(|(key, value)| [format!("--{}", key), value.clone()]),
        );
        args
    }
}

/// Expands cases into runs, one per repeat.
pub fn plan_runs(cases: &[BenchmarkCase], config: &PerfConfig) -> Vec<Run> {
    let PerfConfig {
        data_root,
        output_root,
        num_repeat,
        ..
    } = config;

    cases
        .iter()
        .flat_map(|case| {
            let BenchmarkCase {
                model,
                dataset,
                group,
            } = case;
            let case_id = case.id();
            let kind: &str = group.kind.as_ref();
            let num_repeat = num_repeat.map(NonZeroUsize::get).unwrap_or(dataset.num_repeat);

            (0..num_repeat).map(move |seed| Run {
                case_id: case_id.clone(),
                task: model.task.clone(),
                model: model.name.clone(),
                dataset: dataset.name.clone(),
                seed,
                data_path: data_root.join(&dataset.path),
                work_dir: output_root
                    .join(&model.task)
                    .join(&model.name)
                    .join(&dataset.name)
                    .join(kind)
                    .join(format!("repeat_{}", seed)),
                overrides: dataset.extra_overrides.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{CaseFilter, DataGroup, ModelCategoryFilter},
        suite::Suite,
    };

    #[test]
    fn plan_runs_test() {
        let suite = Suite::semantic_segmentation();
        let config = PerfConfig {
            data_root: PathBuf::from("/data"),
            output_root: PathBuf::from("/out"),
            ..Default::default()
        };
        let cases = suite.cases(&CaseFilter {
            model_category: ModelCategoryFilter::Default,
            data_group: DataGroup::Small,
        });
        let runs = plan_runs(&cases, &config);

        // 3 models, 3 small datasets, 2 groups, 3 repeats
        assert_eq!(runs.len(), 3 * 3 * 2 * 3);

        let run = &runs[2];
        assert_eq!(run.case_id, "litehrnet_18-kvasir_small_1-accuracy");
        assert_eq!(run.seed, 2);
        assert_eq!(run.data_path, Path::new("/data/semantic_seg/kvasir_small/1"));
        assert_eq!(
            run.work_dir,
            Path::new("/out/semantic_segmentation/litehrnet_18/kvasir_small_1/accuracy/repeat_2")
        );

        let args = run.args();
        assert_eq!(&args[..2], &["--model", "litehrnet_18"]);
        assert!(args.windows(2).any(|pair| pair == ["--seed", "2"]));
    }

    #[test]
    fn plan_runs_override_test() {
        let mut suite = Suite::semantic_segmentation();
        suite.datasets[4]
            .extra_overrides
            .insert("max_epochs".to_string(), "50".to_string());

        let config = PerfConfig {
            num_repeat: NonZeroUsize::new(2),
            data_group: DataGroup::Large,
            ..Default::default()
        };
        let cases = suite.cases(&config.filter());
        let runs = plan_runs(&cases, &config);

        assert_eq!(runs.len(), 3 * 2 * 2);
        assert!(runs.iter().all(|run| run.dataset == "kvasir_large"));
        assert!(runs[0]
            .args()
            .ends_with(&["--max_epochs".to_string(), "50".to_string()]));
    }
}
