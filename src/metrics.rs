// Metrics engine: pure derivations over the loaded tables.
//
// Every function here is side-effect free and works on already-typed,
// in-memory data. Degenerate arithmetic (zero denominators, empty series,
// constant series) is reported through `MetricError` instead of silently
// producing NaN or infinity, so a failed metric degrades one report section
// without taking down the rest of the run.
use crate::types::HousingPriceYear;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MetricError {
    #[error("undefined ratio: total is zero")]
    UndefinedRatio,
    #[error("undefined change: starting value is zero")]
    UndefinedChange,
    #[error("undefined rate: year span is zero")]
    UndefinedRate,
    #[error("undefined index: series is empty or its maximum is not positive")]
    UndefinedIndex,
    #[error("no data for year {0}")]
    YearNotFound(i32),
    #[error("shape mismatch: series lengths {left} and {right} differ")]
    ShapeMismatch { left: usize, right: usize },
    #[error("correlation undefined: series has zero variance")]
    ZeroVariance,
}

/// Count rows per distinct value of a categorical key.
///
/// The category set is exactly the distinct values present; counts always
/// sum to the row count. Ordering is up to the caller.
pub fn count_by_category<T, F>(rows: &[T], key: F) -> HashMap<String, usize>
where
    F: Fn(&T) -> &str,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        *counts.entry(key(row).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Percentage of `count` over `total`, errors when `total` is zero rather
/// than returning NaN.
pub fn percentage_share(count: usize, total: usize) -> Result<f64, MetricError> {
    if total == 0 {
        return Err(MetricError::UndefinedRatio);
    }
    Ok(count as f64 / total as f64 * 100.0)
}

/// Two-way contingency counts: row category -> (column category -> count).
pub fn cross_tabulate<T, F, G>(
    rows: &[T],
    row_key: F,
    col_key: G,
) -> HashMap<String, HashMap<String, usize>>
where
    F: Fn(&T) -> &str,
    G: Fn(&T) -> &str,
{
    let mut table: HashMap<String, HashMap<String, usize>> = HashMap::new();
    for row in rows {
        let cell = table
            .entry(row_key(row).to_string())
            .or_default()
            .entry(col_key(row).to_string())
            .or_insert(0);
        *cell += 1;
    }
    table
}

/// Arithmetic mean of the present values per group.
///
/// Rows whose value accessor yields `None` contribute nothing; groups that
/// end up with zero observations are absent from the result instead of
/// carrying a NaN entry.
pub fn grouped_mean<T, F, G>(rows: &[T], key: F, value: G) -> HashMap<String, f64>
where
    F: Fn(&T) -> &str,
    G: Fn(&T) -> Option<f64>,
{
    let mut acc: HashMap<String, (f64, usize)> = HashMap::new();
    for row in rows {
        if let Some(v) = value(row) {
            let e = acc.entry(key(row).to_string()).or_insert((0.0, 0));
            e.0 += v;
            e.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Quantile with linear interpolation between the two nearest ranks, over an
/// ascending-sorted slice. Matches the convention the source data analysis
/// used for its quartiles.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Drop entries outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` (bounds inclusive).
///
/// Quartiles are computed over the per-group aggregate values handed in,
/// not over the underlying raw observations. That is how the original
/// analysis filtered its neighbourhood ranking and is kept as-is for
/// behavioral parity.
pub fn filter_outliers_iqr(values: &HashMap<String, f64>) -> HashMap<String, f64> {
    if values.is_empty() {
        return HashMap::new();
    }
    let mut sorted: Vec<f64> = values.values().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    values
        .iter()
        .filter(|(_, v)| **v >= lower && **v <= upper)
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

/// Exact-year lookup into the price series. A missing year is an error;
/// there is no nearest-year fallback.
pub fn value_for_year<F>(
    series: &[HousingPriceYear],
    year: i32,
    field: F,
) -> Result<f64, MetricError>
where
    F: Fn(&HousingPriceYear) -> f64,
{
    series
        .iter()
        .find(|row| row.year == year)
        .map(field)
        .ok_or(MetricError::YearNotFound(year))
}

/// Percentage change from `start` to `end`; undefined when `start` is zero.
pub fn percentage_change(start: f64, end: f64) -> Result<f64, MetricError> {
    if start == 0.0 {
        return Err(MetricError::UndefinedChange);
    }
    Ok((end - start) / start * 100.0)
}

/// Simple linear annualization: total change divided by the year span.
/// Deliberately non-compounding; the narrative figures depend on it.
pub fn annualized_rate(pct_change: f64, years: u32) -> Result<f64, MetricError> {
    if years == 0 {
        return Err(MetricError::UndefinedRate);
    }
    Ok(pct_change / years as f64)
}

/// Rescale a series to base 100 against its own maximum.
pub fn normalize_to_index(series: &[f64]) -> Result<Vec<f64>, MetricError> {
    let max = series
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if series.is_empty() || max <= 0.0 {
        return Err(MetricError::UndefinedIndex);
    }
    Ok(series.iter().map(|v| v / max * 100.0).collect())
}

/// Pearson correlation coefficient of two equal-length series.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
    if a.len() != b.len() || a.is_empty() {
        return Err(MetricError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return Err(MetricError::ZeroVariance);
    }
    Ok(cov / (var_a.sqrt() * var_b.sqrt()))
}
