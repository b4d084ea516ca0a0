//! Pearson correlation and simple linear regression.

use crate::error::{EdaError, Result};
use crate::types::RegressionSummary;
use anofox_statistics::StatError;
use anofox_statistics::correlation::{CorrelationResult, pearson as pearson_test};

struct Moments {
    n: usize,
    x_mean: f64,
    y_mean: f64,
    ss_x: f64,
    ss_y: f64,
    ss_xy: f64,
}

fn moments(x: &[f64], y: &[f64], context: &str) -> Result<Moments> {
    if x.len() != y.len() {
        return Err(EdaError::Internal(format!(
            "{}: paired samples differ in length ({} vs {})",
            context,
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(EdaError::insufficient(
            "linear regression",
            context,
            format!("need at least 2 paired observations, got {}", n),
        ));
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;
    let (mut ss_x, mut ss_y, mut ss_xy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ss_x += dx * dx;
        ss_y += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_x == 0.0 {
        return Err(EdaError::insufficient(
            "linear regression",
            context,
            "first variable is constant",
        ));
    }
    if ss_y == 0.0 {
        return Err(EdaError::insufficient(
            "linear regression",
            context,
            "second variable is constant",
        ));
    }

    Ok(Moments {
        n,
        x_mean,
        y_mean,
        ss_x,
        ss_y,
        ss_xy,
    })
}

fn stat_error(context: &str, err: StatError) -> EdaError {
    match err {
        StatError::InsufficientData { needed, got } => EdaError::insufficient(
            "correlation test",
            context,
            format!("need at least {} paired observations, got {}", needed, got),
        ),
        other => EdaError::Internal(format!("{}: {}", context, other)),
    }
}

fn correlation_test(x: &[f64], y: &[f64], context: &str) -> Result<CorrelationResult> {
    pearson_test(x, y, Some(0.95)).map_err(|e| stat_error(context, e))
}

/// Pearson correlation coefficient of paired samples.
pub fn pearson(x: &[f64], y: &[f64], context: &str) -> Result<f64> {
    let m = moments(x, y, context)?;
    if m.n == 2 {
        return Ok(m.ss_xy.signum());
    }
    Ok(correlation_test(x, y, context)?.estimate)
}

/// Least-squares fit of `y` on `x`.
///
/// The correlation and its two-sided p-value (t test with `n - 2` degrees of
/// freedom) come from `anofox_statistics`. With exactly two points the fit is
/// perfect: p-value and standard error are zero.
pub fn linear_regression(x: &[f64], y: &[f64], context: &str) -> Result<RegressionSummary> {
    let m = moments(x, y, context)?;
    let slope = m.ss_xy / m.ss_x;
    let intercept = m.y_mean - slope * m.x_mean;

    let (r, p_value, std_err) = if m.n == 2 {
        (m.ss_xy.signum(), 0.0, 0.0)
    } else {
        let test = correlation_test(x, y, context)?;
        let dof = (m.n - 2) as f64;
        let residual_ss = (m.ss_y - slope * m.ss_xy).max(0.0);
        let std_err = (residual_ss / dof / m.ss_x).sqrt();
        (test.estimate, test.p_value.min(1.0), std_err)
    };

    Ok(RegressionSummary {
        correlation: r,
        slope,
        intercept,
        r_squared: r * r,
        p_value,
        std_err,
        n: m.n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_perfect_linear_relationship() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let fit = linear_regression(&x, &y, "a vs b").unwrap();
        assert!((fit.correlation - 1.0).abs() < EPS);
        assert!((fit.r_squared - 1.0).abs() < EPS);
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!(fit.intercept.abs() < EPS);
        assert_eq!(fit.p_value, 0.0);
        assert!(fit.std_err.abs() < EPS);
        assert_eq!(fit.n, 5);
    }

    #[test]
    fn test_regression_matches_reference_values() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let fit = linear_regression(&x, &y, "x vs y").unwrap();
        assert!((fit.slope - 0.6).abs() < EPS);
        assert!((fit.intercept - 2.2).abs() < EPS);
        assert!((fit.correlation - 0.774_596_669_241_483_4).abs() < EPS);
        assert!((fit.r_squared - 0.6).abs() < EPS);
        assert!((fit.p_value - 0.124_027_062_657_554_6).abs() < 1e-6);
        assert!((fit.std_err - 0.282_842_712_474_619).abs() < EPS);
    }

    #[test]
    fn test_negative_correlation() {
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0], "x vs y").unwrap();
        assert!((r + 1.0).abs() < EPS);
    }

    #[test]
    fn test_correlation_is_symmetric() {
        let x = [1.0, 4.0, 2.0, 8.0, 5.0, 7.0];
        let y = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        let xy = linear_regression(&x, &y, "x vs y").unwrap();
        let yx = linear_regression(&y, &x, "y vs x").unwrap();
        assert!((xy.correlation - yx.correlation).abs() < EPS);
        assert!((xy.r_squared - yx.r_squared).abs() < EPS);
        assert!((xy.p_value - yx.p_value).abs() < 1e-9);
    }

    #[test]
    fn test_two_points() {
        let fit = linear_regression(&[0.0, 1.0], &[1.0, 3.0], "pair").unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert_eq!(fit.p_value, 0.0);
        assert_eq!(fit.std_err, 0.0);
    }

    #[test]
    fn test_constant_input_is_insufficient() {
        let err = linear_regression(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], "x vs y").unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
        let err = linear_regression(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0], "x vs y").unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_pearson_matches_regression_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let r = pearson(&x, &y, "x vs y").unwrap();
        assert!((r - 0.774_596_669_241_483_4).abs() < EPS);
        assert_eq!(pearson(&[0.0, 1.0], &[4.0, 2.0], "pair").unwrap(), -1.0);
    }

    #[test]
    fn test_non_finite_value_is_internal_error() {
        let err = linear_regression(&[1.0, 2.0, f64::NAN], &[1.0, 3.0, 2.0], "x vs y").unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_single_point_is_insufficient() {
        assert!(matches!(
            linear_regression(&[1.0], &[2.0], "x vs y"),
            Err(EdaError::InsufficientData { .. })
        ));
    }
}
