//! Polynomial feature expansion.
//!
//! After standardization the lender-preparation stage appends elementwise
//! powers of the scaled columns (no cross terms): for order 3 and a column
//! `x`, the expanded block is `x, x^2, x^3` with the derived columns named
//! `x_2` and `x_3`.

/// Expand one row of scaled values to the given polynomial order.
///
/// Output layout: all first powers, then all second powers, and so on, which
/// matches the column naming produced by [`poly_column_names`].
pub fn expand_row(values: &[f64], order: u32) -> Vec<f64> {
    let order = order.max(1);
    let mut out = Vec::with_capacity(values.len() * order as usize);
    out.extend_from_slice(values);
    for o in 2..=order {
        out.extend(values.iter().map(|v| v.powi(o as i32)));
    }
    out
}

/// Column names for the expanded block: `x`, then `x_2`, `x_3`, ...
pub fn poly_column_names(columns: &[String], order: u32) -> Vec<String> {
    let order = order.max(1);
    let mut out: Vec<String> = columns.to_vec();
    for o in 2..=order {
        out.extend(columns.iter().map(|c| format!("{c}_{o}")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_layout_matches_names() {
        let cols = vec!["a".to_string(), "b".to_string()];
        let names = poly_column_names(&cols, 3);
        assert_eq!(names, vec!["a", "b", "a_2", "b_2", "a_3", "b_3"]);

        let row = expand_row(&[2.0, -1.0], 3);
        assert_eq!(row, vec![2.0, -1.0, 4.0, 1.0, 8.0, -1.0]);
    }

    #[test]
    fn order_one_is_identity() {
        assert_eq!(expand_row(&[1.5], 1), vec![1.5]);
        assert_eq!(poly_column_names(&["x".to_string()], 1), vec!["x"]);
    }
}
