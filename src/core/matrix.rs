//! Labelled correlation matrix and its validation.
//!
//! Missing entries are stored as NaN; they mark excluded variable pairs and
//! never become graph edges.

use std::io::Read;

use tracing::debug;

use crate::error::{Result, VizError};

/// Absolute tolerance used by every closeness check.
pub const ABS_TOLERANCE: f64 = 1e-8;
/// Relative tolerance used by every closeness check.
pub const REL_TOLERANCE: f64 = 1e-5;

/// `|a - b| <= atol + rtol * |b|`; NaN is never close to anything.
#[inline]
pub fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ABS_TOLERANCE + REL_TOLERANCE * b.abs()
}

/// Square table of pairwise correlations keyed by label on both axes.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Matrix whose rows and columns share `labels`.
    pub fn new<S: Into<String>>(labels: Vec<S>, values: Vec<Vec<f64>>) -> Self {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        Self {
            row_labels: labels.clone(),
            col_labels: labels,
            values,
        }
    }

    /// Matrix with independent row and column labels; nothing is checked
    /// until [`validate`](Self::validate).
    pub fn with_labels<S: Into<String>>(
        row_labels: Vec<S>,
        col_labels: Vec<S>,
        values: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            row_labels: row_labels.into_iter().map(Into::into).collect(),
            col_labels: col_labels.into_iter().map(Into::into).collect(),
            values,
        }
    }

    /// Read a matrix from CSV: a header row whose first cell is ignored, then
    /// one row per label. Empty and `NaN` cells are missing entries.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let col_labels: Vec<String> = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(str::to_string)
            .collect();

        let mut row_labels = Vec::new();
        let mut values = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut cells = record.iter();
            let label = cells.next().unwrap_or_default().to_string();
            let row = cells
                .map(|cell| parse_cell(cell, &label))
                .collect::<Result<Vec<f64>>>()?;
            row_labels.push(label);
            values.push(row);
        }

        debug!(rows = row_labels.len(), cols = col_labels.len(), "read correlation matrix from csv");
        Ok(Self {
            row_labels,
            col_labels,
            values,
        })
    }

    /// Pearson correlation between observation columns.
    ///
    /// Pairs involving a zero-variance column are missing; the diagonal is
    /// always 1. Take [`abs`](Self::abs) afterwards for an unsigned matrix.
    pub fn pearson<S: Into<String>>(labels: Vec<S>, columns: &[Vec<f64>]) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != columns.len() {
            return Err(VizError::InvalidShape(format!(
                "{} labels for {} columns",
                labels.len(),
                columns.len()
            )));
        }
        let n_obs = columns.first().map_or(0, Vec::len);
        if let Some(col) = columns.iter().find(|c| c.len() != n_obs) {
            return Err(VizError::InvalidShape(format!(
                "observation columns differ in length ({} vs {n_obs})",
                col.len()
            )));
        }

        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = pearson_correlation(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Ok(Self::new(labels, values))
    }

    /// Element-wise absolute value; missing entries stay missing.
    pub fn abs(&self) -> Self {
        Self {
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            values: self
                .values
                .iter()
                .map(|row| row.iter().map(|v| v.abs()).collect())
                .collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn len(&self) -> usize {
        self.col_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.col_labels.is_empty()
    }

    /// Entry at `(row, col)`; `None` when out of range or missing.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .filter(|v| !v.is_nan())
    }

    /// Check shape, symmetry, unit diagonal and sign, in that order.
    pub fn validate(&self) -> Result<()> {
        self.check_shape()?;
        self.check_symmetric()?;
        self.check_diagonal()?;
        self.check_non_negative()?;
        Ok(())
    }

    fn check_shape(&self) -> Result<()> {
        if self.row_labels != self.col_labels {
            return Err(VizError::InvalidShape(format!(
                "rows {:?} vs columns {:?}",
                self.row_labels, self.col_labels
            )));
        }
        let n = self.col_labels.len();
        if self.values.len() != n {
            return Err(VizError::InvalidShape(format!(
                "{} value rows for {n} labels",
                self.values.len()
            )));
        }
        if let Some((i, row)) = self.values.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(VizError::InvalidShape(format!(
                "row {} has {} values, expected {n}",
                self.row_labels[i],
                row.len()
            )));
        }
        Ok(())
    }

    fn check_symmetric(&self) -> Result<()> {
        let n = self.len();
        for i in 0..n {
            for j in 0..n {
                let a = self.values[i][j];
                let b = self.values[j][i];
                let both_missing = a.is_nan() && b.is_nan();
                if !both_missing && !is_close(a, b) {
                    return Err(VizError::NotSymmetric {
                        row: self.row_labels[i].clone(),
                        col: self.col_labels[j].clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_diagonal(&self) -> Result<()> {
        for i in 0..self.len() {
            let value = self.values[i][i];
            if !is_close(value, 1.0) {
                return Err(VizError::BadDiagonal {
                    label: self.col_labels[i].clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn check_non_negative(&self) -> Result<()> {
        for (i, row) in self.values.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if !value.is_nan() && !is_close(value.abs(), value) {
                    return Err(VizError::NegativeValue {
                        row: self.row_labels[i].clone(),
                        col: self.col_labels[j].clone(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

fn parse_cell(cell: &str, row_label: &str) -> Result<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|_| VizError::InvalidValue(format!("{cell:?} in row {row_label}")))
}

fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() {
        return f64::NAN;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 { f64::NAN } else { (cov / denom).clamp(-1.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn closeness_follows_abs_and_rel_tolerance() {
        assert!(is_close(1.0, 1.0 + 5e-6));
        assert!(!is_close(1.0, 1.0 + 5e-5));
        assert!(is_close(0.0, 5e-9));
        assert!(!is_close(f64::NAN, f64::NAN));
    }

    #[test]
    fn csv_reader_keeps_missing_cells() {
        let text = ",a,b,c\na,1,0.5,\nb,0.5,1,0.2\nc,NaN,0.2,1\n";
        let m = CorrelationMatrix::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(m.labels(), ["a", "b", "c"]);
        assert_eq!(m.row_labels(), ["a", "b", "c"]);
        assert_eq!(m.get(0, 1), Some(0.5));
        assert_eq!(m.get(0, 2), None);
        assert_eq!(m.get(2, 0), None);
        m.validate().unwrap();
    }

    #[test]
    fn csv_reader_rejects_non_numeric_cells() {
        let text = ",a,b\na,1,oops\nb,0.1,1\n";
        let err = CorrelationMatrix::from_csv_reader(text.as_bytes()).unwrap_err();
        assert!(matches!(err, VizError::InvalidValue(_)));
    }

    #[test]
    fn pearson_detects_perfect_and_inverse_relations() {
        let cols = vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 4.0, 6.0, 8.0],
            vec![4.0, 3.0, 2.0, 1.0],
            vec![5.0, 5.0, 5.0, 5.0],
        ];
        let m = CorrelationMatrix::pearson(vec!["a", "b", "c", "d"], &cols).unwrap();
        assert_relative_eq!(m.get(0, 1).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.get(0, 2).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(m.get(0, 3), None);
        assert_eq!(m.get(3, 3), Some(1.0));

        assert!(matches!(m.validate(), Err(VizError::NegativeValue { .. })));
        m.abs().validate().unwrap();
    }

    #[test]
    fn pearson_rejects_ragged_columns() {
        let cols = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            CorrelationMatrix::pearson(vec!["a", "b"], &cols),
            Err(VizError::InvalidShape(_))
        ));
    }
}
