use super::{PairStrategy, as_options, clean_subset, ensure_rows, hue_labels, labels};
use crate::config::EdaConfig;
use crate::error::Result;
use crate::profiler::{compress_categories, is_high_cardinality, mean, sample_std};
use crate::types::{GroupStats, PairSummary, PlotSpec, PointGroup, ResultKind};
use crate::utils::{column_series, numeric_values};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Per-category aggregates of a numerical column.
#[derive(Debug, Clone)]
pub struct NumCatAnalyser {
    num: String,
    cat: String,
    hue: Option<String>,
    frame: DataFrame,
    top_k: usize,
    high_cardinality_threshold: f64,
}

struct Group {
    category: String,
    values: Vec<f64>,
    hues: Vec<String>,
}

impl NumCatAnalyser {
    pub fn new(
        df: &DataFrame,
        num: &str,
        cat: &str,
        hue: Option<&str>,
        config: &EdaConfig,
    ) -> Result<Self> {
        let mut columns = vec![num, cat];
        columns.extend(hue);
        Ok(Self {
            num: num.to_string(),
            cat: cat.to_string(),
            hue: hue.map(str::to_string),
            frame: clean_subset(df, &columns)?,
            top_k: config.top_k,
            high_cardinality_threshold: config.high_cardinality_threshold,
        })
    }

    pub fn numeric_column(&self) -> &str {
        &self.num
    }

    pub fn categorical_column(&self) -> &str {
        &self.cat
    }

    /// Rows grouped by compressed category, largest group first, ties by label.
    fn groups(&self) -> Result<Vec<Group>> {
        ensure_rows(&self.frame, &self.num, &self.cat)?;
        let values: Vec<f64> = numeric_values(column_series(&self.frame, &self.num)?)?
            .into_iter()
            .flatten()
            .collect();
        let categories =
            compress_categories(&as_options(&labels(&self.frame, &self.cat)?), self.top_k);
        let hues = hue_labels(&self.frame, self.hue.as_deref())?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        for (i, (value, category)) in values.iter().zip(categories.into_iter().flatten()).enumerate() {
            let slot = *index.entry(category.clone()).or_insert_with(|| {
                groups.push(Group {
                    category,
                    values: Vec::new(),
                    hues: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].values.push(*value);
            if let Some(h) = hues.as_ref().and_then(|h| h.get(i)) {
                groups[slot].hues.push(h.clone());
            }
        }

        groups.sort_by(|a, b| {
            b.values
                .len()
                .cmp(&a.values.len())
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(groups)
    }
}

impl PairStrategy for NumCatAnalyser {
    fn result_kind(&self) -> ResultKind {
        ResultKind::GroupBy
    }

    fn validate(&self) -> bool {
        let Ok(categories) = labels(&self.frame, &self.cat) else {
            return false;
        };
        let high = is_high_cardinality(&as_options(&categories), self.high_cardinality_threshold);
        if high {
            debug!("'{}' is high-cardinality, skipping group-by", self.cat);
        }
        !high
    }

    fn summarize(&self) -> Result<PairSummary> {
        let groups = self
            .groups()?
            .into_iter()
            .map(|g| {
                let min = g.values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = g.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                GroupStats {
                    count: g.values.len(),
                    mean: mean(&g.values).unwrap_or(f64::NAN),
                    std: sample_std(&g.values),
                    min,
                    max,
                    category: g.category,
                }
            })
            .collect();
        Ok(PairSummary::Grouped { groups })
    }

    fn visualize(&self) -> Result<Option<PlotSpec>> {
        let has_hue = self.hue.is_some();
        let groups = self
            .groups()?
            .into_iter()
            .map(|g| PointGroup {
                category: g.category,
                values: g.values,
                hues: has_hue.then_some(g.hues),
            })
            .collect();
        Ok(Some(PlotSpec::GroupedPoints {
            category: self.cat.clone(),
            value: self.num.clone(),
            hue: self.hue.clone(),
            groups,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        df! {
            "score" => &[Some(1.0f64), Some(3.0), Some(10.0), Some(20.0), Some(30.0), None, Some(5.0)],
            "team" => &[Some("a"), Some("a"), Some("b"), Some("b"), Some("b"), Some("a"), None],
        }
        .unwrap()
    }

    #[test]
    fn test_group_stats() {
        let analyser =
            NumCatAnalyser::new(&frame(), "score", "team", None, &EdaConfig::default()).unwrap();
        assert!(analyser.validate());
        let Ok(PairSummary::Grouped { groups }) = analyser.summarize() else {
            panic!("expected grouped summary");
        };
        assert_eq!(
            groups,
            vec![
                GroupStats {
                    category: "b".into(),
                    count: 3,
                    mean: 20.0,
                    std: Some(10.0),
                    min: 10.0,
                    max: 30.0,
                },
                GroupStats {
                    category: "a".into(),
                    count: 2,
                    mean: 2.0,
                    std: Some(2f64.sqrt()),
                    min: 1.0,
                    max: 3.0,
                },
            ]
        );
    }

    #[test]
    fn test_singleton_group_has_no_std() {
        let df = df! {
            "v" => &[1.0f64, 2.0, 3.0, 4.0],
            "c" => &["x", "x", "x", "y"],
        }
        .unwrap();
        let analyser = NumCatAnalyser::new(&df, "v", "c", None, &EdaConfig::default()).unwrap();
        let Ok(PairSummary::Grouped { groups }) = analyser.summarize() else {
            panic!("expected grouped summary");
        };
        assert_eq!(groups[1].category, "y");
        assert_eq!(groups[1].std, None);
    }

    #[test]
    fn test_high_cardinality_returns_status() {
        let df = df! {
            "v" => &[1.0f64, 2.0, 3.0, 4.0],
            "c" => &["p", "q", "r", "s"],
        }
        .unwrap();
        let result = NumCatAnalyser::new(&df, "v", "c", None, &EdaConfig::default())
            .unwrap()
            .analyse()
            .unwrap();
        assert_eq!(result.kind, ResultKind::HighCardinality);
        assert!(result.summary.is_none());
        assert!(result.plot.is_none());
    }

    #[test]
    fn test_groups_are_compressed() {
        let cats: Vec<String> = (0..40).map(|i| format!("c{}", i % 8)).collect();
        let df = df! {
            "v" => (0..40).map(|i| i as f64).collect::<Vec<_>>(),
            "c" => cats,
        }
        .unwrap();
        let config = EdaConfig::builder().top_k(2).build().unwrap();
        let analyser = NumCatAnalyser::new(&df, "v", "c", None, &config).unwrap();
        let Ok(PairSummary::Grouped { groups }) = analyser.summarize() else {
            panic!("expected grouped summary");
        };
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].category, "Others");
        assert_eq!(groups[0].count, 30);
    }

    #[test]
    fn test_strip_plot_with_hue() {
        let df = df! {
            "v" => &[1.0f64, 2.0, 3.0, 4.0],
            "c" => &["x", "x", "y", "y"],
            "h" => &["m", "f", "m", "f"],
        }
        .unwrap();
        let plot = NumCatAnalyser::new(&df, "v", "c", Some("h"), &EdaConfig::default())
            .unwrap()
            .visualize()
            .unwrap();
        let Some(PlotSpec::GroupedPoints { groups, .. }) = plot else {
            panic!("expected grouped points");
        };
        assert_eq!(groups[0].category, "x");
        assert_eq!(groups[0].hues, Some(vec!["m".to_string(), "f".to_string()]));
    }
}
