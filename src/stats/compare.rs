//! Comparison Module
//! Welch's t-test on release speed between two pitcher selections, for the
//! comparison tab.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for the velocity t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Descriptive stats for one side of a comparison.
#[derive(Debug, Clone)]
pub struct CompareSide {
    pub label: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub max: Option<f64>,
}

impl CompareSide {
    pub fn from_values(label: &str, values: &[f64]) -> Self {
        let n = values.len();
        let mean = if n > 0 {
            Some(values.iter().sum::<f64>() / n as f64)
        } else {
            None
        };
        let std = match (mean, n) {
            (Some(m), n) if n > 1 => {
                let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
                Some(var.sqrt())
            }
            _ => None,
        };
        let max = values.iter().cloned().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        });
        Self {
            label: label.to_string(),
            count: n,
            mean,
            std,
            max,
        }
    }
}

/// Result of a two-sided velocity comparison.
#[derive(Debug, Clone)]
pub struct VeloComparison {
    pub left: CompareSide,
    pub right: CompareSide,
    /// Two-tailed Welch p-value; None when either side has fewer than two
    /// usable measurements.
    pub p_value: Option<f64>,
    pub is_significant: bool,
}

/// Perform Welch's t-test (independent samples, unequal variance).
pub fn welch_ttest(a: &[f64], b: &[f64]) -> Option<f64> {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    if n1 < 2.0 || n2 < 2.0 {
        return None;
    }

    let mean1 = a.iter().sum::<f64>() / n1;
    let mean2 = b.iter().sum::<f64>() / n2;
    let var1 = a.iter().map(|x| (x - mean1).powi(2)).sum::<f64>() / (n1 - 1.0);
    let var2 = b.iter().map(|x| (x - mean2).powi(2)).sum::<f64>() / (n2 - 1.0);

    let se = (var1 / n1 + var2 / n2).sqrt();
    if se == 0.0 {
        return Some(1.0); // No variance difference
    }
    let t = (mean1 - mean2) / se;

    // Welch-Satterthwaite degrees of freedom
    let df_num = (var1 / n1 + var2 / n2).powi(2);
    let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
    let df = df_num / df_denom;

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(2.0 * (1.0 - dist.cdf(t.abs())))
}

/// Compare two labeled measurement sets.
pub fn compare_velocities(
    left_label: &str,
    left: &[f64],
    right_label: &str,
    right: &[f64],
) -> VeloComparison {
    let p_value = welch_ttest(left, right);
    VeloComparison {
        left: CompareSide::from_values(left_label, left),
        right: CompareSide::from_values(right_label, right),
        p_value,
        is_significant: p_value.map(|p| p <= SIGNIFICANCE_THRESHOLD).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undersized_samples_give_no_p_value() {
        let cmp = compare_velocities("A", &[148.0], "B", &[140.0, 141.0]);
        assert_eq!(cmp.p_value, None);
        assert!(!cmp.is_significant);
        assert_eq!(cmp.left.count, 1);
        assert_eq!(cmp.left.std, None);
    }

    #[test]
    fn identical_samples_are_not_significant() {
        let values = [148.0, 149.0, 150.0, 151.0];
        let cmp = compare_velocities("A", &values, "B", &values);
        let p = cmp.p_value.unwrap();
        assert!(p > 0.9, "p = {p}");
        assert!(!cmp.is_significant);
    }

    #[test]
    fn separated_samples_are_significant() {
        let a = [150.0, 151.0, 149.5, 150.5, 150.2, 149.8];
        let b = [138.0, 139.0, 138.5, 137.5, 138.2, 138.8];
        let cmp = compare_velocities("A", &a, "B", &b);
        let p = cmp.p_value.unwrap();
        assert!(p < 0.001, "p = {p}");
        assert!(cmp.is_significant);
    }

    #[test]
    fn descriptive_side_stats() {
        let side = CompareSide::from_values("A", &[148.0, 152.0]);
        assert_eq!(side.mean, Some(150.0));
        assert_eq!(side.max, Some(152.0));
        assert!((side.std.unwrap() - 2.828_427).abs() < 1e-5);
    }
}
