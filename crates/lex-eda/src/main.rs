//! CLI entry point for type classification and analysis dispatch.

use anyhow::{Result, anyhow};
use clap::Parser;
use lex_eda::cleaner::coerce_dataframe;
use lex_eda::types::{PeriodResult, RegressionSummary, SeasonalityRow, TimeComponent};
use lex_eda::{
    AnalyserCache, AnalyserFactory, AnalysisResult, CoercionReport, DataProfiler,
    DatasetOverview, EdaConfig, PairAnalyserFactory, PairAnalysis, PairSummary, PlotSpec,
    SemanticType, UnivariateResult,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Exploratory analysis of a CSV dataset",
    long_about = "Classifies the columns of a CSV file and runs the analysis that fits \
                  their types.\n\n\
                  EXAMPLES:\n  \
                  # Dataset overview and column types\n  \
                  lex-eda -i data.csv\n\n  \
                  # Analyse one column\n  \
                  lex-eda -i data.csv --column age\n\n  \
                  # Analyse a column pair, coloured by a third column\n  \
                  lex-eda -i data.csv --column age --with fare --hue sex\n\n  \
                  # Counts of a datetime column by month, as JSON\n  \
                  lex-eda -i data.csv --column date --period month --json"
)]
struct Args {
    /// Path to the CSV file to analyse
    #[arg(short, long)]
    input: String,

    /// Column to analyse
    #[arg(short, long)]
    column: Option<String>,

    /// Second column, for a pair analysis
    #[arg(short, long = "with", requires = "column")]
    with_column: Option<String>,

    /// Grouping column used to colour pair plots
    #[arg(long, requires = "with_column")]
    hue: Option<String>,

    /// Calendar period (second, minute, hour, dayofweek, day, month, year)
    ///
    /// For a datetime column, counts values per period. For a
    /// categorical-datetime pair, restricts the analysis to that period. For a
    /// numerical-datetime pair, lists the mean value per period.
    #[arg(short, long, requires = "column")]
    period: Option<String>,

    /// Numeric columns with fewer distinct values are categorical
    #[arg(long, default_value = "20")]
    cat_threshold: usize,

    /// Categories kept before the rest fold into "Others"
    #[arg(long, default_value = "10")]
    top_k: usize,

    /// Distinct/total ratio above which a categorical is too sparse to group
    #[arg(long, default_value = "0.5")]
    high_cardinality_threshold: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so the output can be piped: `... --json | jq .overview`
    #[arg(long)]
    json: bool,

    /// Keep text columns as loaded instead of coercing them to numbers,
    /// booleans or dates
    #[arg(long)]
    no_coerce: bool,
}

/// Everything the CLI computed, in the shape written by `--json`.
#[derive(Debug, Serialize)]
struct CliReport {
    input: String,
    overview: DatasetOverview,
    coercion: Option<CoercionReport>,
    column_types: Vec<ColumnType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<UnivariateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pair: Option<PairAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period_plot: Option<PlotSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seasonality: Option<Vec<SeasonalityRow>>,
}

#[derive(Debug, Serialize)]
struct ColumnType {
    name: String,
    /// `None` when the column has no values.
    dtype: Option<SemanticType>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so that stdout only
/// contains the JSON report.
fn init_logging(level: &str, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json);

    if !std::path::Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = EdaConfig::builder()
        .cat_threshold(args.cat_threshold)
        .top_k(args.top_k)
        .high_cardinality_threshold(args.high_cardinality_threshold)
        .build()?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let (data, coercion) = if args.no_coerce {
        (data, None)
    } else {
        let (data, report) = coerce_dataframe(data)?;
        (data, Some(report))
    };

    let report = run_analysis(&args, &data, config, coercion)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&report);
    }
    Ok(())
}

fn run_analysis(
    args: &Args,
    data: &DataFrame,
    config: EdaConfig,
    coercion: Option<CoercionReport>,
) -> Result<CliReport> {
    let overview = DatasetOverview::from_dataframe(data)?;
    let column_types = DataProfiler::classify_columns(data, config.cat_threshold)?
        .into_iter()
        .map(|(name, dtype)| ColumnType { name, dtype })
        .collect();

    let mut report = CliReport {
        input: args.input.clone(),
        overview,
        coercion,
        column_types,
        column: None,
        pair: None,
        period_plot: None,
        seasonality: None,
    };

    let Some(column) = args.column.as_deref() else {
        return Ok(report);
    };

    let cache = Arc::new(AnalyserCache::new(config));

    if let Some(second) = args.with_column.as_deref() {
        let pairs = PairAnalyserFactory::new(Arc::clone(&cache));
        let analyser = pairs.create(data, column, second, args.hue.as_deref())?;
        debug!("Selected {} analyser", analyser.variant());

        let analysis = match (args.period.as_deref(), analyser.as_cat_time()) {
            (Some(period), Some(cat_time)) => {
                let result = cat_time.analyse_period_named(period)?;
                PairAnalysis::PerPeriod(vec![PeriodResult {
                    period: period.parse()?,
                    result,
                }])
            }
            (Some(period), None) => {
                let num_time = analyser.as_num_time().ok_or_else(|| {
                    anyhow!(
                        "--period applies only to a pair with a datetime column, not {}",
                        analyser.variant()
                    )
                })?;
                let component: TimeComponent = period.parse()?;
                if !num_time.granularity().contains(&component) {
                    return Err(anyhow!(
                        "'{}' does not vary by {} in this dataset",
                        second,
                        component.axis_label()
                    ));
                }
                let rows = num_time
                    .seasonality()?
                    .into_iter()
                    .filter(|row| row.granularity == component)
                    .collect();
                report.seasonality = Some(rows);
                analyser.analyse()?
            }
            (None, _) => analyser.analyse()?,
        };
        report.pair = Some(analysis);
        return Ok(report);
    }

    let columns = AnalyserFactory::new(cache);
    let analyser = columns.create(data, column)?;
    report.column = Some(analyser.analyse(&report.overview)?);

    if let Some(period) = args.period.as_deref() {
        let datetime = analyser
            .as_datetime()
            .ok_or_else(|| anyhow!("--period needs a datetime column, '{}' is {}", column, analyser.dtype()))?;
        report.period_plot = Some(datetime.plot_by_period(period)?);
    }

    Ok(report)
}

fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| anyhow!("Failed to read {}: {}", path, e))
}

fn print_human_readable_summary(report: &CliReport) {
    let overview = &report.overview;

    println!();
    println!("{}", "=".repeat(80));
    println!("DATASET OVERVIEW");
    println!("{}", "=".repeat(80));
    println!(
        "Input: {} ({} rows x {} columns, {} missing values)",
        report.input, overview.row_count, overview.column_count, overview.total_missing
    );
    println!();

    if let Some(coercion) = &report.coercion {
        for converted in &coercion.converted {
            println!("  Converted '{}' to {}", converted.column, converted.target);
        }
        for failure in &coercion.failed {
            println!("  Kept '{}' as text: {}", failure.column, failure.reason);
        }
        if !coercion.converted.is_empty() || coercion.has_failures() {
            println!();
        }
    }

    println!("{:<24} {:<12} {:<10}", "Column", "Type", "Missing %");
    println!("{}", "-".repeat(48));
    for column in &report.column_types {
        let dtype = column
            .dtype
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let missing = overview
            .missing_ratio(&column.name)
            .map(|r| r * 100.0)
            .unwrap_or(0.0);
        println!(
            "{:<24} {:<12} {:<10.1}",
            truncate_str(&column.name, 23),
            dtype,
            missing
        );
    }
    println!();

    if let Some(result) = &report.column {
        print_univariate(result);
    }
    if let Some(plot) = &report.period_plot {
        print_period_counts(plot);
    }
    if let Some(rows) = &report.seasonality {
        print_seasonality(rows);
    }
    if let Some(pair) = &report.pair {
        match pair {
            PairAnalysis::Single(result) => print_pair_result(result),
            PairAnalysis::PerPeriod(results) => {
                if results.is_empty() {
                    println!("The datetime column does not vary; no periods to analyse.");
                }
                for period in results {
                    println!("Period: {}", period.period.axis_label());
                    print_pair_result(&period.result);
                }
            }
        }
    }
}

fn print_univariate(result: &UnivariateResult) {
    println!("COLUMN '{}' ({})", result.column, result.dtype);
    println!("{}", "-".repeat(40));
    println!("  Missing: {:.1}%", result.missing_ratio * 100.0);
    if let Some(summary) = &result.summary {
        println!("  Mean: {:.4}", summary.mean);
        if let Some(std) = summary.std {
            println!("  Std: {:.4}", std);
        }
        println!("  Min / Max: {} / {}", summary.min, summary.max);
        println!(
            "  Q1 / Q3 (IQR): {} / {} ({})",
            summary.q1, summary.q3, summary.iqr
        );
        if let Some(skew) = summary.skewness {
            println!("  Skewness: {:.4}", skew);
        }
    }
    match &result.plot {
        Some(PlotSpec::CategoryCounts { counts, .. }) => {
            for count in counts {
                println!("  {:<24} {}", truncate_str(&count.value, 23), count.count);
            }
        }
        None if result.dtype.is_categorical() => {
            println!("  Too many distinct values to summarize");
        }
        _ => {}
    }
    println!();
}

fn print_period_counts(plot: &PlotSpec) {
    if let PlotSpec::PeriodCounts { x_label, counts, .. } = plot {
        println!("COUNTS BY {}", x_label.to_uppercase());
        println!("{}", "-".repeat(40));
        for count in counts {
            println!("  {:<12} {}", count.value, count.count);
        }
        println!();
    }
}

fn print_seasonality(rows: &[SeasonalityRow]) {
    if let Some(first) = rows.first() {
        println!("MEAN BY {}", first.granularity.axis_label().to_uppercase());
        println!("{}", "-".repeat(40));
    }
    for row in rows {
        println!("  {:<12} {:.4}", row.time, row.mean_value);
    }
    println!();
}

fn print_regression(regression: &RegressionSummary) {
    println!(
        "  r = {:.4}, R² = {:.4}, p = {:.4}",
        regression.correlation, regression.r_squared, regression.p_value
    );
    println!(
        "  slope = {:.4} (std err {:.4}), intercept = {:.4}, n = {}",
        regression.slope, regression.std_err, regression.intercept, regression.n
    );
}

fn print_pair_result(result: &AnalysisResult) {
    if result.is_skipped() {
        println!("  Skipped: a categorical column has too many distinct values");
        println!();
        return;
    }
    println!("{}", result.kind.display_name());
    println!("{}", "-".repeat(40));
    match &result.summary {
        Some(PairSummary::Regression(regression)) => print_regression(regression),
        Some(PairSummary::Trend {
            regression,
            seasonality,
        }) => {
            print_regression(regression);
            println!("  {} seasonality rows", seasonality.len());
        }
        Some(PairSummary::Grouped { groups }) => {
            for group in groups {
                println!(
                    "  {:<24} n = {:<6} mean = {:.4}",
                    truncate_str(&group.category, 23),
                    group.count,
                    group.mean
                );
            }
        }
        Some(PairSummary::Contingency { table, test }) => {
            println!(
                "  {} x {} table, chi² = {:.4}, p = {:.4}, dof = {}",
                table.row_labels.len(),
                table.column_labels.len(),
                test.statistic,
                test.p_value,
                test.dof
            );
        }
        None => {}
    }
    println!();
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
