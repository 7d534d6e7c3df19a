use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Pairwise Pearson correlation of close-price series
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    /// values[i][j] = correlation(symbols[i], symbols[j]); NaN when undefined
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }
}

/// Build the correlation matrix for a set of price series
///
/// Series of different length are compared over their common most recent
/// points. Pairs with fewer than two overlapping points or zero variance
/// are NaN.
pub fn correlation_matrix(series: &BTreeMap<String, Vec<f64>>) -> CorrelationMatrix {
    let symbols: Vec<String> = series.keys().cloned().collect();
    let columns: Vec<&Vec<f64>> = series.values().collect();

    let values = columns
        .iter()
        .enumerate()
        .map(|(i, a)| {
            columns
                .iter()
                .enumerate()
                .map(|(j, b)| if i == j { 1.0 } else { pearson(a, b) })
                .collect()
        })
        .collect();

    CorrelationMatrix { symbols, values }
}

/// Sample Pearson correlation over the shared tail of two series
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }

    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];

    let std_a = a.iter().std_dev();
    let std_b = b.iter().std_dev();
    if std_a == 0.0 || std_b == 0.0 {
        return f64::NAN;
    }

    let r = a.iter().covariance(b.iter()) / (std_a * std_b);
    r.clamp(-1.0, 1.0)
}
