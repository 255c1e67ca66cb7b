//! NearMiss undersampling for the MLP training path.
//!
//! The approval data is heavily imbalanced and the network overfits the
//! majority class without help. NearMiss (version 1) keeps the majority rows
//! whose mean distance to their nearest minority neighbours is smallest, so
//! the retained majority examples sit close to the class boundary.

/// Neighbours considered per majority row.
const NEAR_MISS_K: usize = 3;

/// Undersample the majority class down to the minority count.
///
/// Returns the balanced matrix and targets; order is minority rows first in
/// their original order, then the selected majority rows. When the classes
/// are already balanced the input is returned unchanged.
pub fn near_miss(rows: &[Vec<f64>], y: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let pos: Vec<usize> = (0..rows.len()).filter(|&i| y[i] > 0.5).collect();
    let neg: Vec<usize> = (0..rows.len()).filter(|&i| y[i] <= 0.5).collect();
    if pos.is_empty() || neg.is_empty() || pos.len() == neg.len() {
        return (rows.to_vec(), y.to_vec());
    }

    let (minority, majority) = if pos.len() < neg.len() {
        (pos, neg)
    } else {
        (neg, pos)
    };

    // Mean distance from each majority row to its k nearest minority rows.
    let mut scored: Vec<(f64, usize)> = majority
        .iter()
        .map(|&i| {
            let mut dists: Vec<f64> = minority
                .iter()
                .map(|&j| squared_distance(&rows[i], &rows[j]))
                .collect();
            dists.sort_by(f64::total_cmp);
            let k = NEAR_MISS_K.min(dists.len());
            let mean: f64 = dists[..k].iter().sum::<f64>() / k as f64;
            (mean, i)
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut keep: Vec<usize> = minority;
    keep.extend(scored.iter().take(keep.len()).map(|(_, i)| *i));

    let out_rows = keep.iter().map(|&i| rows[i].clone()).collect();
    let out_y = keep.iter().map(|&i| y[i]).collect();
    (out_rows, out_y)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_to_minority_count() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        // Three positives at 0, 1, 2.
        let y: Vec<f64> = (0..20).map(|i| (i < 3) as u8 as f64).collect();

        let (bx, by) = near_miss(&rows, &y);
        assert_eq!(bx.len(), 6);
        assert_eq!(by.iter().filter(|&&v| v > 0.5).count(), 3);
        assert_eq!(by.iter().filter(|&&v| v <= 0.5).count(), 3);
    }

    #[test]
    fn keeps_boundary_majority_rows() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| (i < 3) as u8 as f64).collect();

        let (bx, by) = near_miss(&rows, &y);
        // The retained negatives are the ones closest to the positives.
        let negatives: Vec<f64> = bx
            .iter()
            .zip(&by)
            .filter(|&(_, &v)| v <= 0.5)
            .map(|(r, _)| r[0])
            .collect();
        assert_eq!(negatives, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn balanced_input_is_untouched() {
        let rows = vec![vec![0.0], vec![1.0]];
        let y = vec![0.0, 1.0];
        let (bx, by) = near_miss(&rows, &y);
        assert_eq!(bx, rows);
        assert_eq!(by, y);
    }

    #[test]
    fn degenerate_single_class_is_untouched() {
        let rows = vec![vec![0.0], vec![1.0]];
        let y = vec![1.0, 1.0];
        let (bx, _) = near_miss(&rows, &y);
        assert_eq!(bx.len(), 2);
    }
}
