use super::{PairStrategy, clean_subset, ensure_rows, hue_labels};
use crate::error::Result;
use crate::stats::linear_regression;
use crate::types::{FitLine, PairSummary, PlotSpec, ResultKind, ScatterPoint};
use crate::utils::{column_series, numeric_values};
use polars::prelude::*;

/// Correlation and linear regression of two numerical columns.
#[derive(Debug, Clone)]
pub struct NumNumAnalyser {
    x: String,
    y: String,
    hue: Option<String>,
    frame: DataFrame,
}

impl NumNumAnalyser {
    pub fn new(df: &DataFrame, x: &str, y: &str, hue: Option<&str>) -> Result<Self> {
        let mut columns = vec![x, y];
        columns.extend(hue);
        Ok(Self {
            x: x.to_string(),
            y: y.to_string(),
            hue: hue.map(str::to_string),
            frame: clean_subset(df, &columns)?,
        })
    }

    fn values(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        ensure_rows(&self.frame, &self.x, &self.y)?;
        let x = numeric_values(column_series(&self.frame, &self.x)?)?;
        let y = numeric_values(column_series(&self.frame, &self.y)?)?;
        Ok((x.into_iter().flatten().collect(), y.into_iter().flatten().collect()))
    }

    fn context(&self) -> String {
        format!("'{}' vs '{}'", self.x, self.y)
    }
}

impl PairStrategy for NumNumAnalyser {
    fn result_kind(&self) -> ResultKind {
        ResultKind::LinearRegression
    }

    fn validate(&self) -> bool {
        true
    }

    fn summarize(&self) -> Result<PairSummary> {
        let (x, y) = self.values()?;
        Ok(PairSummary::Regression(linear_regression(
            &x,
            &y,
            &self.context(),
        )?))
    }

    fn visualize(&self) -> Result<Option<PlotSpec>> {
        let (x, y) = self.values()?;
        let hues = hue_labels(&self.frame, self.hue.as_deref())?;
        let fit = linear_regression(&x, &y, &self.context())
            .ok()
            .map(|r| FitLine {
                slope: r.slope,
                intercept: r.intercept,
            });

        let points = x
            .iter()
            .zip(&y)
            .enumerate()
            .map(|(i, (x, y))| ScatterPoint {
                x: *x,
                y: *y,
                hue: hues.as_ref().and_then(|h| h.get(i).cloned()),
            })
            .collect();

        Ok(Some(PlotSpec::Scatter {
            x: self.x.clone(),
            y: self.y.clone(),
            hue: self.hue.clone(),
            points,
            fit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdaError;

    #[test]
    fn test_doubled_column_is_perfectly_correlated() {
        let df = df! {
            "a" => &[1.0f64, 2.0, 3.0, 4.0, 5.0],
            "b" => &[2.0f64, 4.0, 6.0, 8.0, 10.0],
        }
        .unwrap();
        let result = NumNumAnalyser::new(&df, "a", "b", None).unwrap().analyse().unwrap();
        assert_eq!(result.kind, ResultKind::LinearRegression);
        let Some(PairSummary::Regression(fit)) = result.summary else {
            panic!("expected regression summary");
        };
        assert!((fit.correlation - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_rows_are_dropped() {
        let df = df! {
            "a" => &[Some(1.0f64), Some(2.0), None, Some(4.0)],
            "b" => &[Some(1.0f64), Some(f64::NAN), Some(3.0), Some(4.0)],
        }
        .unwrap();
        let analyser = NumNumAnalyser::new(&df, "a", "b", None).unwrap();
        let Ok(PairSummary::Regression(fit)) = analyser.summarize() else {
            panic!("expected regression summary");
        };
        assert_eq!(fit.n, 2);
    }

    #[test]
    fn test_scatter_carries_hue() {
        let df = df! {
            "a" => &[1.0f64, 2.0, 3.0],
            "b" => &[3.0f64, 1.0, 2.0],
            "g" => &["p", "q", "p"],
        }
        .unwrap();
        let plot = NumNumAnalyser::new(&df, "a", "b", Some("g"))
            .unwrap()
            .visualize()
            .unwrap();
        let Some(PlotSpec::Scatter { points, fit, hue, .. }) = plot else {
            panic!("expected scatter");
        };
        assert_eq!(hue.as_deref(), Some("g"));
        assert_eq!(points[1].hue.as_deref(), Some("q"));
        assert!(fit.is_some());
    }

    #[test]
    fn test_all_rows_missing_is_empty_input() {
        let df = df! {
            "a" => &[Some(1.0f64), None],
            "b" => &[None, Some(2.0f64)],
        }
        .unwrap();
        let analyser = NumNumAnalyser::new(&df, "a", "b", None).unwrap();
        assert!(matches!(analyser.analyse(), Err(EdaError::EmptyInput(_))));
    }
}
