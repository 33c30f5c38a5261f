//! Numeric summaries: descriptive statistics, ratios and least-squares
//! fitting for the regression charts.

use crate::Result;
use anyhow::bail;
use std::collections::BTreeMap;

/// Descriptive statistics of a series, in the shape the report sidecars
/// list: count, mean, sample standard deviation, min, quartiles, max.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    pub fn describe(values: &[f64]) -> Result<Summary> {
        if values.is_empty() {
            bail!("cannot describe an empty series");
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Ok(Summary {
            count: values.len(),
            mean: mean(values),
            std: std_dev(values),
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    /// Human-labeled mapping for artifact sidecars.
    pub fn labeled(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("Number of Samples".to_string(), self.count as f64),
            ("Mean".to_string(), self.mean),
            ("Standard Deviation".to_string(), self.std),
            ("Minimum".to_string(), self.min),
            ("25th Percentile".to_string(), self.q25),
            ("50th Percentile".to_string(), self.median),
            ("75th Percentile".to_string(), self.q75),
            ("Maximum".to_string(), self.max),
        ])
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Quantile with linear interpolation over an already-sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    assert!(!sorted.is_empty());
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// part/whole in percent; 0 when the denominator is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Ordinary least squares fit, returning (slope, intercept).
pub fn linear_fit(points: &[(f64, f64)]) -> Result<(f64, f64)> {
    if points.len() < 2 {
        bail!("need at least two points to fit a line");
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x) * (x - mean_x)).sum();
    if sxx == 0.0 {
        bail!("cannot fit a line through points with equal x");
    }
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();

    let slope = sxy / sxx;
    Ok((slope, mean_y - slope * mean_x))
}

/// Pearson correlation coefficient of two equal-length series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        bail!("correlation requires equal-length series");
    }
    if xs.len() < 2 {
        bail!("correlation requires at least two samples");
    }

    let mx = mean(xs);
    let my = mean(ys);
    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let vx: f64 = xs.iter().map(|x| (x - mx) * (x - mx)).sum();
    let vy: f64 = ys.iter().map(|y| (y - my) * (y - my)).sum();
    if vx == 0.0 || vy == 0.0 {
        bail!("correlation undefined for a constant series");
    }
    Ok(cov / (vx * vy).sqrt())
}

/// Pairwise Pearson correlations of named columns, as a square matrix in
/// column order.
pub fn correlation_matrix(columns: &[(String, Vec<f64>)]) -> Result<Vec<Vec<f64>>> {
    let mut matrix = vec![vec![0.0; columns.len()]; columns.len()];
    for (i, (_, xs)) in columns.iter().enumerate() {
        for (j, (_, ys)) in columns.iter().enumerate() {
            matrix[i][j] = if i == j { 1.0 } else { pearson(xs, ys)? };
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn describe_matches_hand_computed_values() {
        let s = Summary::describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q75, 3.25);
        assert_eq!(s.max, 4.0);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn describe_empty_errors() {
        assert!(Summary::describe(&[]).is_err());
    }

    #[test]
    fn labeled_uses_report_names() {
        let s = Summary::describe(&[1.0, 2.0]).unwrap();
        let labeled = s.labeled();
        assert_eq!(labeled["Number of Samples"], 2.0);
        assert_eq!(labeled["Mean"], 1.5);
        assert!(labeled.contains_key("75th Percentile"));
    }

    #[test]
    fn percentage_zero_denominator_is_zero() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }

    #[test]
    fn linear_fit_recovers_collinear_points() {
        let (slope, intercept) =
            linear_fit(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_fit_degenerate_errors() {
        assert!(linear_fit(&[(1.0, 1.0)]).is_err());
        assert!(linear_fit(&[(1.0, 1.0), (1.0, 2.0)]).is_err());
    }

    #[test]
    fn pearson_of_identical_series_is_one() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&xs, &xs).unwrap() - 1.0).abs() < 1e-12);
        let neg = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&xs, &neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let cols = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0]),
            ("b".to_string(), vec![2.0, 4.0, 5.0]),
        ];
        let m = correlation_matrix(&cols).unwrap();
        assert_eq!(m[0][0], 1.0);
        assert_eq!(m[1][1], 1.0);
        assert_eq!(m[0][1], m[1][0]);
    }
}
