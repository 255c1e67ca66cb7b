//! Stage 6: stratified train/test split.
//!
//! The split is stratified on the target column so both partitions keep the
//! class balance of the full frame, and seeded so a pipeline run is
//! reproducible end to end.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::FeatureFrame;
use crate::error::AppError;

/// Train and test partitions of a prepared frame.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub train: FeatureFrame,
    pub test: FeatureFrame,
}

/// Stratified split on `y_name`.
///
/// Within each class the rows are shuffled with a seeded RNG and
/// `round(n * test_ratio)` of them go to the test partition. A class with at
/// least two rows always contributes at least one row to each side; a
/// singleton class stays in the training partition.
pub fn stratified_split(
    frame: &FeatureFrame,
    y_name: &str,
    test_ratio: f64,
    seed: u64,
) -> Result<SplitOutput, AppError> {
    if frame.n_rows() == 0 {
        return Err(AppError::new(3, "Cannot split an empty frame.".to_string()));
    }
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(AppError::new(
            4,
            format!("Test ratio must be in [0, 1), got {test_ratio}."),
        ));
    }

    let y_idx = frame
        .column_index(y_name)
        .ok_or_else(|| AppError::new(2, format!("Missing target column `{y_name}`.")))?;

    // Group row indices by class, in first-seen class order.
    let mut classes: Vec<f64> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, row) in frame.rows.iter().enumerate() {
        let y = row[y_idx];
        match classes.iter().position(|c| *c == y) {
            Some(g) => groups[g].push(i),
            None => {
                classes.push(y);
                groups.push(vec![i]);
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = FeatureFrame::new(frame.columns.clone());
    let mut test = FeatureFrame::new(frame.columns.clone());

    for mut group in groups {
        group.shuffle(&mut rng);
        let n = group.len();
        let n_test = if n < 2 {
            0
        } else {
            (((n as f64) * test_ratio).round() as usize).clamp(1, n - 1)
        };
        for (k, idx) in group.into_iter().enumerate() {
            let row = frame.rows[idx].clone();
            if k < n_test {
                test.push_row(row)?;
            } else {
                train.push_row(row)?;
            }
        }
    }

    Ok(SplitOutput { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(labels: &[f64]) -> FeatureFrame {
        let mut f = FeatureFrame::new(vec!["x".to_string(), "y".to_string()]);
        for (i, y) in labels.iter().enumerate() {
            f.push_row(vec![i as f64, *y]).unwrap();
        }
        f
    }

    fn class_count(frame: &FeatureFrame, label: f64) -> usize {
        let y = frame.column_index("y").unwrap();
        frame.rows.iter().filter(|r| r[y] == label).count()
    }

    #[test]
    fn preserves_class_balance() {
        let mut labels = vec![1.0; 20];
        labels.extend(vec![0.0; 80]);
        let f = frame(&labels);

        let out = stratified_split(&f, "y", 0.25, 7).unwrap();
        assert_eq!(out.test.n_rows(), 25);
        assert_eq!(out.train.n_rows(), 75);
        assert_eq!(class_count(&out.test, 1.0), 5);
        assert_eq!(class_count(&out.train, 1.0), 15);
    }

    #[test]
    fn same_seed_same_split() {
        let labels = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let f = frame(&labels);
        let a = stratified_split(&f, "y", 0.3, 42).unwrap();
        let b = stratified_split(&f, "y", 0.3, 42).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn small_classes_reach_both_sides() {
        let f = frame(&[0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        let out = stratified_split(&f, "y", 0.2, 1).unwrap();
        assert_eq!(class_count(&out.test, 1.0), 1);
        assert_eq!(class_count(&out.train, 1.0), 1);
    }

    #[test]
    fn singleton_class_stays_in_train() {
        let f = frame(&[0.0, 0.0, 0.0, 1.0]);
        let out = stratified_split(&f, "y", 0.25, 1).unwrap();
        assert_eq!(class_count(&out.train, 1.0), 1);
        assert_eq!(class_count(&out.test, 1.0), 0);
    }

    #[test]
    fn rejects_bad_inputs() {
        let f = frame(&[0.0, 1.0]);
        assert!(stratified_split(&f, "missing", 0.2, 1).is_err());
        assert!(stratified_split(&f, "y", 1.0, 1).is_err());
        let empty = FeatureFrame::new(vec!["y".to_string()]);
        assert!(stratified_split(&empty, "y", 0.2, 1).is_err());
    }
}
