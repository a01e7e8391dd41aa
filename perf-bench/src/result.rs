//! Benchmark result tables.
//!
//! A table is a CSV file with the key columns `task`, `model` and `data`, an
//! optional `seed` column and one numeric column per metric. Rows sharing a
//! key are repeated runs of the same model on the same dataset.

use crate::{benchmark::ResultKey, common::*, criterion::Criterion};

const KEY_COLUMNS: [&str; 3] = ["task", "model", "data"];
const SEED_COLUMN: &str = "seed";

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub key: ResultKey,
    pub seed: Option<u64>,
    /// Metric values. Empty, non-numeric and NaN cells are `None`.
    pub metrics: IndexMap<String, Option<f64>>,
}

impl ResultRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    metric_names: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open result file '{}'", path.display()))?;
        let table = Self::from_csv_reader(reader)
            .with_context(|| format!("failed to parse result file '{}'", path.display()))?;
        debug!(
            "load {} rows with {} metrics from '{}'",
            table.rows.len(),
            table.metric_names.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R>(reader: R) -> Result<Self>
    where
        R: Read,
    {
        Self::from_csv_reader(csv::Reader::from_reader(reader))
    }

    fn from_csv_reader<R>(mut reader: csv::Reader<R>) -> Result<Self>
    where
        R: Read,
    {
        let headers = reader.headers()?.clone();
        let column_index = |name: &str| headers.iter().position(|header| header.trim() == name);

        let key_indexes = KEY_COLUMNS
            .iter()
            .map(|&name| {
                column_index(name).ok_or_else(|| format_err!("missing key column '{}'", name))
            })
            .collect::<Result<Vec<usize>>>()?;
        let seed_index = column_index(SEED_COLUMN);

        let metric_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|&(index, _)| !key_indexes.contains(&index) && Some(index) != seed_index)
            .map(|(index, name)| (index, name.trim().to_string()))
            .collect();

        let rows = reader
            .records()
            .enumerate()
            .map(|(index, record)| -> Result<_> {
                let record = record?;
                let field = |index: usize| record.get(index).unwrap_or("").trim();

                let key = ResultKey {
                    task: field(key_indexes[0]).to_string(),
                    model: field(key_indexes[1]).to_string(),
                    data: field(key_indexes[2]).to_string(),
                };
                let seed = match seed_index.map(field) {
                    Some(text) if !text.is_empty() => Some(text.parse().with_context(|| {
                        format!("invalid seed '{}' at line {}", text, index + 2)
                    })?),
                    _ => None,
                };
                let metrics = metric_columns
                    .iter()
                    .map(|(index, name)| (name.clone(), parse_metric(field(*index))))
                    .collect();

                Ok(ResultRow { key, seed, metrics })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            metric_names: metric_columns.into_iter().map(|(_, name)| name).collect(),
            rows,
        })
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of the runs identified by `key`.
    pub fn runs<'a>(&'a self, key: &'a ResultKey) -> impl Iterator<Item = &'a ResultRow> + 'a {
        self.rows.iter().filter(move |row| &row.key == key)
    }

    /// Reduces the criterion's metric over the runs of `key`.
    pub fn summarize(&self, key: &ResultKey, criterion: &Criterion) -> Option<f64> {
        criterion
            .summary
            .reduce(self.runs(key).filter_map(|row| row.metric(&criterion.name)))
    }
}

fn parse_metric(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| !value.is_nan())
}
