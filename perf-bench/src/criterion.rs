use crate::common::*;

/// Reduction applied to the values of repeated runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Summary {
    Max,
    Min,
    Mean,
}

impl Summary {
    /// Reduces the values, or returns `None` if there are none.
    pub fn reduce<I>(&self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().peekable();
        values.peek()?;

        let value = match self {
            Self::Max => values.fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.fold(f64::INFINITY, f64::min),
            Self::Mean => {
                let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
                    (sum + value, count + 1)
                });
                sum / count as f64
            }
        };
        Some(value)
    }
}

/// Direction in which a result may deviate from its reference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
pub enum Compare {
    /// Lower is better.
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Less,
    /// Higher is better.
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Greater,
    #[strum(serialize = "==")]
    #[serde(rename = "==")]
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// The result or the reference lacks the metric.
    Skipped,
}

impl Verdict {
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// An acceptance rule on one metric, relative to a reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// The metric column, such as `val/Dice` or `train/iter_time`.
    pub name: String,
    pub summary: Summary,
    pub compare: Compare,
    /// Tolerated relative deviation from the reference.
    pub margin: R64,
}

impl Criterion {
    pub fn new(name: &str, summary: Summary, compare: Compare, margin: f64) -> Self {
        Self {
            name: name.to_string(),
            summary,
            compare,
            margin: r64(margin),
        }
    }

    /// Judges a summarized result against the summarized reference.
    pub fn check(&self, result: Option<f64>, target: Option<f64>) -> Verdict {
        let (result, target) = match (result, target) {
            (Some(result), Some(target)) if !result.is_nan() && !target.is_nan() => {
                (result, target)
            }
            _ => return Verdict::Skipped,
        };
        let margin = self.margin.raw();

        let pass = match self.compare {
            Compare::Less => result <= target * (1.0 + margin),
            Compare::Greater => result >= target * (1.0 - margin),
            Compare::Equal => (result - target).abs() <= target.abs() * margin,
        };

        if pass {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

impl Display for Criterion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) {} ±{}",
            self.summary.as_ref(),
            self.name,
            self.compare.as_ref(),
            self.margin
        )
    }
}
