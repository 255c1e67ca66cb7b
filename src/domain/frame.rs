//! A small named-column numeric table.
//!
//! Everything downstream of feature derivation (lender preparation, split,
//! training, evaluation) works on a dense `f64` matrix with named columns.
//! This is deliberately minimal: just the operations the stages need, with
//! strict arity checks so schema drift fails loudly instead of silently
//! misaligning features.

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<f64>) -> Result<(), AppError> {
        if row.len() != self.columns.len() {
            return Err(AppError::new(
                4,
                format!(
                    "Frame row arity mismatch: expected {} values, got {}.",
                    self.columns.len(),
                    row.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Values of a single column.
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>, AppError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| AppError::io(format!("Missing column: `{name}`")))?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// New frame with columns reordered/subset to `names` (strict).
    pub fn select(&self, names: &[String]) -> Result<FeatureFrame, AppError> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| AppError::io(format!("Missing column: `{name}`")))?;
            indices.push(idx);
        }

        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i]).collect())
            .collect();

        Ok(FeatureFrame {
            columns: names.to_vec(),
            rows,
        })
    }

    /// New frame without the named columns; names not present are ignored.
    ///
    /// The per-lender drop lists share entries across lenders, so missing
    /// names are not an error here.
    pub fn drop_columns(&self, names: &[&str]) -> FeatureFrame {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();

        FeatureFrame {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i]).collect())
                .collect(),
        }
    }

    /// Keep only rows satisfying the predicate.
    pub fn filter_rows(&self, mut pred: impl FnMut(&[f64]) -> bool) -> FeatureFrame {
        FeatureFrame {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }

    /// Append a column; `values` must match the current row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), AppError> {
        if values.len() != self.rows.len() {
            return Err(AppError::new(
                4,
                format!(
                    "Frame column length mismatch: {} rows, {} values.",
                    self.rows.len(),
                    values.len()
                ),
            ));
        }
        self.columns.push(name.into());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(())
    }

    /// Split feature matrix and target column `y_name`.
    pub fn split_xy(&self, y_name: &str) -> Result<(FeatureFrame, Vec<f64>), AppError> {
        let y = self.column_values(y_name)?;
        let x = self.drop_columns(&[y_name]);
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FeatureFrame {
        let mut f = FeatureFrame::new(vec!["a".into(), "b".into(), "y".into()]);
        f.push_row(vec![1.0, 10.0, 0.0]).unwrap();
        f.push_row(vec![2.0, 20.0, 1.0]).unwrap();
        f
    }

    #[test]
    fn select_reorders_columns() {
        let f = frame();
        let g = f.select(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(g.columns, vec!["b", "a"]);
        assert_eq!(g.rows[0], vec![10.0, 1.0]);
        assert!(f.select(&["missing".to_string()]).is_err());
    }

    #[test]
    fn drop_ignores_unknown_names() {
        let f = frame();
        let g = f.drop_columns(&["b", "nope"]);
        assert_eq!(g.columns, vec!["a", "y"]);
        assert_eq!(g.rows[1], vec![2.0, 1.0]);
    }

    #[test]
    fn split_xy_separates_target() {
        let f = frame();
        let (x, y) = f.split_xy("y").unwrap();
        assert_eq!(x.columns, vec!["a", "b"]);
        assert_eq!(y, vec![0.0, 1.0]);
    }

    #[test]
    fn push_row_checks_arity() {
        let mut f = frame();
        assert!(f.push_row(vec![1.0]).is_err());
    }
}
