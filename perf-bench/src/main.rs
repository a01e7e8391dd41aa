use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use perf_bench::{
    check_cases, plan_runs, BenchmarkCase, CaseReport, DataGroup, ModelCategoryFilter,
    PerfConfig, ResultTable, Suite,
};
use prettytable::{cell, row, Table};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
/// Plan model performance benchmarks and check their results.
struct Opts {
    /// session configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// benchmark suite file, overriding the one in the configuration
    #[clap(long, global = true)]
    suite: Option<PathBuf>,
    /// model categories to benchmark: default or all
    #[clap(long, global = true)]
    model_category: Option<ModelCategoryFilter>,
    /// dataset sizes to benchmark: small, medium, large or all
    #[clap(long, global = true)]
    data_group: Option<DataGroup>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// list the selected benchmark cases
    List,
    /// list the runs of the selected cases
    Plan {
        /// print runs in JSON
        #[clap(long)]
        json: bool,
    },
    /// check a result table against a reference table
    Check {
        /// result CSV file
        #[clap(long)]
        result: PathBuf,
        /// reference CSV file
        #[clap(long)]
        reference: PathBuf,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let Opts {
        config,
        suite,
        model_category,
        data_group,
        command,
    } = Opts::parse();

    let mut config = match config {
        Some(path) => PerfConfig::open(&path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => PerfConfig::default(),
    };
    if let Some(suite) = suite {
        config.suite_file = Some(suite);
    }
    if let Some(model_category) = model_category {
        config.model_category = model_category;
    }
    if let Some(data_group) = data_group {
        config.data_group = data_group;
    }

    let suite = match &config.suite_file {
        Some(path) => Suite::load(path)?,
        None => Suite::semantic_segmentation(),
    };
    let cases = suite.cases(&config.filter());

    match command {
        Command::List => list_cases(&cases),
        Command::Plan { json } => {
            let runs = plan_runs(&cases, &config);

            if json {
                println!("{}", serde_json::to_string_pretty(&runs)?);
            } else {
                let mut table = Table::new();
                table.add_row(row!["case", "seed", "data", "work dir"]);
                runs.iter().for_each(|run| {
                    table.add_row(row![
                        run.case_id,
                        run.seed,
                        run.data_path.display(),
                        run.work_dir.display(),
                    ]);
                });
                table.printstd();
            }
        }
        Command::Check { result, reference } => {
            let result = ResultTable::load(&result)?;
            let reference = ResultTable::load(&reference)?;
            let reports = check_cases(&cases, &result, &reference);
            print_reports(&reports);

            let num_failed = reports.iter().filter(|report| !report.passed()).count();
            if num_failed > 0 {
                bail!("{} of {} cases failed", num_failed, reports.len());
            }
            info!("all {} cases passed", reports.len());
        }
    }

    Ok(())
}

fn list_cases(cases: &[BenchmarkCase]) {
    let mut table = Table::new();
    table.add_row(row![
        "case", "category", "data size", "repeats", "criteria"
    ]);

    cases.iter().for_each(|case| {
        table.add_row(row![
            case.id(),
            case.model.category.as_ref(),
            case.dataset.size.as_ref(),
            case.dataset.num_repeat,
            case.group.criteria.len(),
        ]);
    });

    table.printstd();
}

fn print_reports(reports: &[CaseReport]) {
    let mut table = Table::new();
    table.add_row(row!["case", "criterion", "result", "reference", "verdict"]);

    let format_value = |value: Option<f64>| match value {
        Some(value) => format!("{:.4}", value),
        None => "-".to_string(),
    };

    reports.iter().for_each(|report| {
        report.criteria.iter().for_each(|criterion| {
            table.add_row(row![
                report.case_id,
                criterion.criterion,
                format_value(criterion.result),
                format_value(criterion.target),
                criterion.verdict,
            ]);
        });
    });

    table.printstd();
}
