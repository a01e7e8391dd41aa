use crate::{
    benchmark::BenchmarkCase,
    common::*,
    criterion::{Criterion, Verdict},
    result::ResultTable,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CriterionReport {
    pub criterion: Criterion,
    pub result: Option<f64>,
    pub target: Option<f64>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub case_id: String,
    pub criteria: Vec<CriterionReport>,
}

impl CaseReport {
    /// True if no criterion failed. Skipped criteria do not fail a case.
    pub fn passed(&self) -> bool {
        !self.criteria.iter().any(|report| report.verdict.is_fail())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CriterionReport> {
        self.criteria.iter().filter(|report| report.verdict.is_fail())
    }
}

/// Checks every criterion of a case, comparing the summarized runs of the
/// result table against those of the reference table.
pub fn check_case(
    case: &BenchmarkCase,
    result: &ResultTable,
    reference: &ResultTable,
) -> CaseReport {
    let case_id = case.id();
    let key = case.result_key();

    let criteria = case
        .group
        .criteria
        .iter()
        .map(|criterion| {
            let result_value = result.summarize(&key, criterion);
            let target_value = reference.summarize(&key, criterion);
            let verdict = criterion.check(result_value, target_value);

            match verdict {
                Verdict::Pass => debug!(
                    "[{}] {} passed: result {:?}, reference {:?}",
                    case_id, criterion, result_value, target_value
                ),
                Verdict::Fail => warn!(
                    "[{}] {} failed: result {:?}, reference {:?}",
                    case_id, criterion, result_value, target_value
                ),
                Verdict::Skipped => info!(
                    "[{}] {} skipped: result {:?}, reference {:?}",
                    case_id, criterion, result_value, target_value
                ),
            }

            CriterionReport {
                criterion: criterion.clone(),
                result: result_value,
                target: target_value,
                verdict,
            }
        })
        .collect();

    CaseReport { case_id, criteria }
}

/// Checks all cases and returns the reports in the same order.
pub fn check_cases(
    cases: &[BenchmarkCase],
    result: &ResultTable,
    reference: &ResultTable,
) -> Vec<CaseReport> {
    cases
        .iter()
        .map(|case| check_case(case, result, reference))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{benchmark::BenchmarkKind, filter::CaseFilter, suite::Suite};

    const REFERENCE: &str = "\
task,model,data,seed,epoch,val/Dice,test/Dice,train/iter_time
semantic_segmentation,litehrnet_18,kvasir_small_1,0,20,0.80,0.78,0.5
semantic_segmentation,litehrnet_18,kvasir_small_1,1,20,0.82,0.79,0.5
";

    const RESULT: &str = "\
task,model,data,seed,epoch,val/Dice,test/Dice,train/iter_time
semantic_segmentation,litehrnet_18,kvasir_small_1,0,21,0.81,0.60,0.52
semantic_segmentation,litehrnet_18,kvasir_small_1,1,19,0.77,0.65,0.54
";

    fn case(kind: BenchmarkKind) -> BenchmarkCase {
        Suite::semantic_segmentation()
            .cases(&CaseFilter::default())
            .into_iter()
            .find(|case| {
                case.model.name == "litehrnet_18"
                    && case.dataset.name == "kvasir_small_1"
                    && case.group.kind == kind
            })
            .unwrap()
    }

    #[test]
    fn accuracy_case_test() -> Result<()> {
        let result = ResultTable::from_reader(RESULT.as_bytes())?;
        let reference = ResultTable::from_reader(REFERENCE.as_bytes())?;

        let report = check_case(&case(BenchmarkKind::Accuracy), &result, &reference);
        assert_eq!(report.case_id, "litehrnet_18-kvasir_small_1-accuracy");

        let verdicts: Vec<_> = report
            .criteria
            .iter()
            .map(|report| (report.criterion.name.as_str(), report.verdict))
            .collect();
        assert_eq!(
            verdicts,
            vec![
                ("epoch", Verdict::Pass),
                ("val/Dice", Verdict::Pass),
                ("test/Dice", Verdict::Fail),
                ("export/Dice", Verdict::Skipped),
                ("optimize/Dice", Verdict::Skipped),
            ]
        );
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
        Ok(())
    }

    #[test]
    fn efficiency_case_test() -> Result<()> {
        let result = ResultTable::from_reader(RESULT.as_bytes())?;
        let reference = ResultTable::from_reader(REFERENCE.as_bytes())?;

        let report = check_case(&case(BenchmarkKind::Efficiency), &result, &reference);
        assert!(report.passed());
        assert_eq!(report.criteria[0].verdict, Verdict::Pass);
        let mean_iter_time = report.criteria[0].result.unwrap();
        assert!((mean_iter_time - 0.53).abs() < 1e-9);
        assert!(report.criteria[1..]
            .iter()
            .all(|report| report.verdict == Verdict::Skipped));
        Ok(())
    }
}
