use std::{collections::BTreeMap, fmt, fs::File, path::Path};

use polars::prelude::*;
use tracing::info;

use crate::{collection::FeatureCollection, error::{Error, Result}};

/// Sum of one numeric attribute per group identity, ordered by identity.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    group_key: String,
    value_key: String,
    sums: BTreeMap<String, f64>,
}

impl GroupSummary {
    #[inline] pub fn group_key(&self) -> &str { &self.group_key }

    #[inline] pub fn value_key(&self) -> &str { &self.value_key }

    #[inline] pub fn get(&self, group: &str) -> Option<f64> { self.sums.get(group).copied() }

    #[inline] pub fn len(&self) -> usize { self.sums.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.sums.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sums.iter().map(|(group, &sum)| (group.as_str(), sum))
    }

    /// Sum over all groups.
    pub fn total(&self) -> f64 { self.sums.values().sum() }

    /// Two-column table: group identity and summed value.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new(self.group_key.as_str().into(), self.sums.keys().cloned().collect::<Vec<_>>()),
            Column::new(self.value_key.as_str().into(), self.sums.values().copied().collect::<Vec<_>>()),
        ])?)
    }

    /// Writes the summary table to a CSV file at `path`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        Ok(())
    }
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.sums.keys()
            .map(String::len)
            .chain(std::iter::once(self.group_key.len()))
            .max()
            .unwrap_or(0);
        writeln!(f, "{:<width$}  {}", self.group_key, self.value_key)?;
        for (group, sum) in &self.sums {
            writeln!(f, "{group:<width$}  {sum}")?;
        }
        Ok(())
    }
}

/// Group features by `group_key` and sum `value_key` within each group.
/// Null values are left out of the sums and rows with a null group are dropped.
pub fn summarize(features: &FeatureCollection, group_key: &str, value_key: &str) -> Result<GroupSummary> {
    features.column(group_key)?;
    features.column(value_key)?;

    let df = features.data().clone().lazy()
        .filter(col(group_key).is_not_null())
        .group_by([col(group_key).cast(DataType::String)])
        .agg([col(value_key).cast(DataType::Float64).sum().alias(value_key)])
        .collect()?;

    let groups = df.column(group_key)?.str()?;
    let values = df.column(value_key)?.f64()?;
    let sums = groups.into_iter().zip(values.into_iter())
        .filter_map(|(group, sum)| Some((group?.to_string(), sum.unwrap_or(0.0))))
        .collect::<BTreeMap<_, _>>();

    info!("[summarize] {} rows -> {} groups by {group_key:?}", features.len(), sums.len());

    Ok(GroupSummary { group_key: group_key.to_string(), value_key: value_key.to_string(), sums })
}

/// Rows holding the largest and smallest value of a numeric attribute (ties kept).
#[derive(Debug, Clone, PartialEq)]
pub struct Extremes {
    pub max: f64,
    pub max_rows: Vec<usize>,
    pub min: f64,
    pub min_rows: Vec<usize>,
}

/// Find the extremes of `key`; `None` when the attribute has no non-null value.
pub fn extremes(features: &FeatureCollection, key: &str) -> Result<Option<Extremes>> {
    let column = features.column(key)?.cast(&DataType::Float64)
        .map_err(|_| Error::MissingAttribute(format!("{key} (not numeric)")))?;
    let values = column.f64()?.into_iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i, v)))
        .collect::<Vec<_>>();

    let Some(max) = values.iter().map(|&(_, v)| v).reduce(f64::max) else { return Ok(None) };
    let min = values.iter().map(|&(_, v)| v).fold(max, f64::min);

    let rows_at = |target: f64| values.iter()
        .filter(|&&(_, v)| v == target)
        .map(|&(i, _)| i)
        .collect::<Vec<_>>();

    Ok(Some(Extremes { max, max_rows: rows_at(max), min, min_rows: rows_at(min) }))
}
