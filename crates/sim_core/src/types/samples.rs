//! Sample matrix container.
//!
//! [`SampleMatrix`] holds the joint draws of one simulation run as an
//! `iterations × variables` matrix. Storage is column-major because every
//! downstream analysis (percentiles, moments, tail means) walks a single
//! variable at a time.
//!
//! The matrix is immutable once built: transformations such as stress
//! scenarios produce a new matrix via [`SampleMatrix::map_values`] or
//! [`SampleMatrix::from_columns`].

use serde::{Deserialize, Serialize};

use super::error::CoreError;

/// Immutable `iterations × variables` matrix of finite draws.
///
/// # Invariants
///
/// - At least one row and one column
/// - Every column has exactly `n_rows` entries
/// - Every value is finite
/// - Column names are unique
///
/// # Examples
///
/// ```rust
/// use sim_core::SampleMatrix;
///
/// let samples = SampleMatrix::from_rows(
///     vec!["a".to_string(), "b".to_string()],
///     &[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
/// )
/// .unwrap();
///
/// assert_eq!(samples.n_rows(), 3);
/// assert_eq!(samples.n_cols(), 2);
/// assert_eq!(samples.column(1), &[2.0, 4.0, 6.0]);
/// assert_eq!(samples.row(2), vec![5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleMatrixRepr", into = "SampleMatrixRepr")]
pub struct SampleMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

/// Wire form; deserialisation goes back through [`SampleMatrix::from_columns`].
#[derive(Serialize, Deserialize)]
struct SampleMatrixRepr {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl TryFrom<SampleMatrixRepr> for SampleMatrix {
    type Error = CoreError;

    fn try_from(repr: SampleMatrixRepr) -> Result<Self, Self::Error> {
        SampleMatrix::from_columns(repr.names, repr.columns)
    }
}

impl From<SampleMatrix> for SampleMatrixRepr {
    fn from(matrix: SampleMatrix) -> Self {
        Self {
            names: matrix.names,
            columns: matrix.columns,
        }
    }
}

impl SampleMatrix {
    /// Builds a matrix from named columns.
    ///
    /// # Errors
    ///
    /// - [`CoreError::EmptySamples`] if there are no columns or no rows
    /// - [`CoreError::DimensionMismatch`] if names and columns disagree, or
    ///   columns have different lengths
    /// - [`CoreError::NonFiniteValue`] on NaN or infinite entries
    /// - [`CoreError::DuplicateName`] if two columns share a name
    pub fn from_columns(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, CoreError> {
        if columns.is_empty() {
            return Err(CoreError::EmptySamples);
        }
        if names.len() != columns.len() {
            return Err(CoreError::DimensionMismatch {
                expected: columns.len(),
                got: names.len(),
            });
        }

        let n_rows = columns[0].len();
        if n_rows == 0 {
            return Err(CoreError::EmptySamples);
        }

        for (j, column) in columns.iter().enumerate() {
            if column.len() != n_rows {
                return Err(CoreError::DimensionMismatch {
                    expected: n_rows,
                    got: column.len(),
                });
            }
            if let Some((row, &value)) = column.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(CoreError::NonFiniteValue {
                    column: j,
                    row,
                    value,
                });
            }
        }

        for (j, name) in names.iter().enumerate() {
            if names[..j].contains(name) {
                return Err(CoreError::DuplicateName(name.clone()));
            }
        }

        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Builds a matrix whose columns are named `variable_0`, `variable_1`, ...
    pub fn from_unnamed_columns(columns: Vec<Vec<f64>>) -> Result<Self, CoreError> {
        let names = (0..columns.len()).map(default_column_name).collect();
        Self::from_columns(names, columns)
    }

    /// Builds a matrix from row vectors.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, CoreError> {
        let n_cols = names.len();
        let mut columns = vec![Vec::with_capacity(rows.len()); n_cols];
        for row in rows {
            if row.len() != n_cols {
                return Err(CoreError::DimensionMismatch {
                    expected: n_cols,
                    got: row.len(),
                });
            }
            for (column, &value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Self::from_columns(names, columns)
    }

    /// Concatenates chunks row-wise, in the order given.
    ///
    /// All chunks must carry identical column names.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sim_core::SampleMatrix;
    ///
    /// let a = SampleMatrix::from_unnamed_columns(vec![vec![1.0, 2.0]]).unwrap();
    /// let b = SampleMatrix::from_unnamed_columns(vec![vec![3.0]]).unwrap();
    /// let stacked = SampleMatrix::vstack(&[a, b]).unwrap();
    /// assert_eq!(stacked.column(0), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn vstack(chunks: &[SampleMatrix]) -> Result<Self, CoreError> {
        let first = chunks.first().ok_or(CoreError::EmptySamples)?;
        let total: usize = chunks.iter().map(|c| c.n_rows).sum();

        let mut columns: Vec<Vec<f64>> = (0..first.n_cols())
            .map(|_| Vec::with_capacity(total))
            .collect();

        for chunk in chunks {
            if chunk.names != first.names {
                return Err(CoreError::DimensionMismatch {
                    expected: first.n_cols(),
                    got: chunk.n_cols(),
                });
            }
            for (dst, src) in columns.iter_mut().zip(&chunk.columns) {
                dst.extend_from_slice(src);
            }
        }

        Ok(Self {
            names: first.names.clone(),
            columns,
            n_rows: total,
        })
    }

    /// Number of rows (iterations).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (variables).
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `j >= n_cols()`.
    #[inline]
    pub fn name(&self, j: usize) -> &str {
        &self.names[j]
    }

    /// Column `j` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `j >= n_cols()`.
    #[inline]
    pub fn column(&self, j: usize) -> &[f64] {
        &self.columns[j]
    }

    /// All columns in order.
    #[inline]
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|j| self.columns[j].as_slice())
    }

    /// Copies row `i` into a new vector.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[i]).collect()
    }

    /// Row sums, one per iteration.
    pub fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_rows];
        for column in &self.columns {
            for (s, v) in sums.iter_mut().zip(column) {
                *s += v;
            }
        }
        sums
    }

    /// Applies `f` to every value, producing a new matrix with the same names.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteValue`] if `f` produces NaN or infinity.
    pub fn map_values<F>(&self, f: F) -> Result<Self, CoreError>
    where
        F: Fn(f64) -> f64,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| c.iter().map(|&v| f(v)).collect())
            .collect();
        Self::from_columns(self.names.clone(), columns)
    }

    /// Consumes the matrix and returns its names and columns.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<f64>>) {
        (self.names, self.columns)
    }

    /// Shape and range summary.
    pub fn summary(&self) -> SampleSummary {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for column in &self.columns {
            for &v in column {
                min = min.min(v);
                max = max.max(v);
                sum += v;
            }
        }
        SampleSummary {
            n_rows: self.n_rows,
            n_cols: self.n_cols(),
            min,
            max,
            mean: sum / (self.n_rows * self.n_cols()) as f64,
        }
    }
}

/// Default name for column `j`.
#[inline]
pub fn default_column_name(j: usize) -> String {
    format!("variable_{}", j)
}

/// Shape and range of a [`SampleMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Iterations
    pub n_rows: usize,
    /// Variables
    pub n_cols: usize,
    /// Smallest value across all columns
    pub min: f64,
    /// Largest value across all columns
    pub max: f64,
    /// Grand mean
    pub mean: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(default_column_name).collect()
    }

    #[test]
    fn test_from_columns_valid() {
        let m = SampleMatrix::from_columns(names(2), vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.name(1), "variable_1");
        assert_eq!(m.column_by_name("variable_0"), Some(&[1.0, 2.0][..]));
        assert!(m.column_by_name("missing").is_none());
    }

    #[test]
    fn test_from_columns_rejects_empty() {
        assert_eq!(
            SampleMatrix::from_columns(vec![], vec![]),
            Err(CoreError::EmptySamples)
        );
        assert_eq!(
            SampleMatrix::from_columns(names(1), vec![vec![]]),
            Err(CoreError::EmptySamples)
        );
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let err = SampleMatrix::from_columns(names(2), vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err, CoreError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn test_from_columns_rejects_non_finite() {
        let err = SampleMatrix::from_columns(names(1), vec![vec![1.0, f64::INFINITY]]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NonFiniteValue {
                column: 0,
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_from_columns_rejects_duplicate_names() {
        let err = SampleMatrix::from_columns(
            vec!["x".to_string(), "x".to_string()],
            vec![vec![1.0], vec![2.0]],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::DuplicateName("x".to_string()));
    }

    #[test]
    fn test_from_rows_transposes() {
        let m = SampleMatrix::from_rows(names(3), &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.column(0), &[1.0, 4.0]);
        assert_eq!(m.column(2), &[3.0, 6.0]);
        assert_eq!(m.row(1), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_vstack_preserves_chunk_order() {
        let a = SampleMatrix::from_unnamed_columns(vec![vec![1.0], vec![10.0]]).unwrap();
        let b = SampleMatrix::from_unnamed_columns(vec![vec![2.0, 3.0], vec![20.0, 30.0]]).unwrap();
        let m = SampleMatrix::vstack(&[a, b]).unwrap();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.column(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.column(1), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_vstack_rejects_mismatched_columns() {
        let a = SampleMatrix::from_unnamed_columns(vec![vec![1.0]]).unwrap();
        let b = SampleMatrix::from_unnamed_columns(vec![vec![1.0], vec![2.0]]).unwrap();
        assert!(SampleMatrix::vstack(&[a, b]).is_err());
        assert_eq!(SampleMatrix::vstack(&[]), Err(CoreError::EmptySamples));
    }

    #[test]
    fn test_map_values_and_row_sums() {
        let m = SampleMatrix::from_unnamed_columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let doubled = m.map_values(|v| v * 2.0).unwrap();
        assert_eq!(doubled.column(1), &[6.0, 8.0]);
        assert_eq!(m.row_sums(), vec![4.0, 6.0]);
        assert!(m.map_values(|v| v / 0.0).is_err());
    }

    #[test]
    fn test_summary() {
        let m = SampleMatrix::from_unnamed_columns(vec![vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        let s = m.summary();
        assert_eq!(s.n_rows, 2);
        assert_eq!(s.n_cols, 2);
        assert_relative_eq!(s.min, 1.0);
        assert_relative_eq!(s.max, 6.0);
        assert_relative_eq!(s.mean, 3.0);
    }

    #[test]
    fn test_serde_revalidates() {
        let m = SampleMatrix::from_unnamed_columns(vec![vec![1.0, 2.0]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: SampleMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let ragged = r#"{"names":["a","b"],"columns":[[1.0],[1.0,2.0]]}"#;
        assert!(serde_json::from_str::<SampleMatrix>(ragged).is_err());
    }
}
