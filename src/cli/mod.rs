//! Kolosal Robust CLI Module
//!
//! Command-line interface for robustness certification and pattern search.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::{CsvDataSource, DataSource, Dataset};
use crate::fairness::FairnessMetric;
use crate::patterns::{PatternSensitivityScanner, SensitivityConfig, SensitivityRanking};
use crate::robustness::{RadiusSpec, RobustnessCertifier, RobustnessConfig, RobustnessReport, UncertainTarget};
use crate::training::LogisticRegression;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }

fn kv(key: &str, val: &str) {
    println!("  {:<20} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn ratio_colored(ratio: f64) -> ColoredString {
    let text = format!("{:.4}", ratio);
    if ratio >= 0.999_999 {
        ok(&text).bold()
    } else {
        warn(&text).bold()
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "kolosal-robust")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Robustness certification and fairness sensitivity search")]
#[command(long_about = None)]
pub struct Cli {
    /// Print machine-readable JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Input CSV file
    #[arg(short, long)]
    pub data: PathBuf,

    /// Label column name
    #[arg(short, long)]
    pub target: String,

    /// Fraction of rows held out for testing
    #[arg(long, default_value = "0.2")]
    pub test_size: f64,

    /// Seed for the split and random row selection
    #[arg(long, default_value = "42")]
    pub seed: u64,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct RadiusArgs {
    /// Absolute perturbation radius
    #[arg(long)]
    pub radius: Option<f64>,

    /// Perturbation radius as a fraction of the observed range
    #[arg(long = "radius-pct")]
    pub radius_pct: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct UncertaintyArgs {
    #[command(flatten)]
    pub radius: RadiusArgs,

    /// Maximum tolerated prediction radius
    #[arg(long, default_value = "1.0")]
    pub robustness_radius: f64,

    /// Perturb this feature instead of the label
    #[arg(long)]
    pub feature: Option<String>,

    /// Keep raw symbolic parameters instead of collapsing to intervals
    #[arg(long)]
    pub no_interval: bool,

    /// Perturb the most metric-sensitive rows (0 SPD, 1 TPR parity,
    /// 2 predictive parity) instead of random rows
    #[arg(long)]
    pub boundary_metric: Option<i64>,

    /// Minimum sensitivity for a row to enter the boundary ranking
    #[arg(long, default_value = "0.05", requires = "boundary_metric")]
    pub boundary_threshold: f64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Certify the robust fraction of test predictions
    Certify {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        uncertainty: UncertaintyArgs,

        /// Number of training rows to perturb
        #[arg(short, long, default_value = "0")]
        num: usize,
    },

    /// Rank training rows by fairness sensitivity
    Patterns {
        #[command(flatten)]
        data: DataArgs,

        /// Metric selector: 0 SPD, 1 TPR parity, 2 predictive parity
        #[arg(short, long, default_value = "0")]
        metric: i64,

        /// Minimum metric change for a pattern to count
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Evaluate patterns in parallel
        #[arg(long)]
        parallel: bool,

        /// Binarise probabilities at this cut-off before scoring
        #[arg(long)]
        decision_threshold: Option<f64>,

        /// Number of ranked rows to print
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Robust fraction across several perturbation counts
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        uncertainty: UncertaintyArgs,

        /// Comma-separated perturbation counts
        #[arg(long, value_delimiter = ',', default_value = "0,1,2,4,8")]
        nums: Vec<usize>,
    },
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn load_dataset(args: &DataArgs, json: bool) -> anyhow::Result<Dataset> {
    if !json {
        step_run("Loading data");
    }
    let start = Instant::now();
    let dataset = CsvDataSource::new(&args.data, &args.target)
        .with_test_size(args.test_size)
        .with_seed(args.seed)
        .load()
        .with_context(|| format!("failed to load {}", args.data.display()))?;
    if !json {
        step_done(&format!(
            "{} train / {} test rows in {:?}",
            dataset.x_train.n_rows(),
            dataset.x_test.n_rows(),
            start.elapsed()
        ));
    }
    Ok(dataset)
}

fn fit_classifier(dataset: &Dataset) -> anyhow::Result<LogisticRegression> {
    let x = dataset
        .x_train
        .to_matrix()
        .context("the logistic classifier needs numeric features")?;
    let mut clf = LogisticRegression::new();
    clf.fit(&x, &dataset.y_train)?;
    Ok(clf)
}

fn rank_rows(dataset: &Dataset, config: SensitivityConfig) -> anyhow::Result<SensitivityRanking> {
    let clf = fit_classifier(dataset)?;
    let ranking = PatternSensitivityScanner::new(&clf, config).scan(&dataset.x_train, &dataset.y_train)?;
    Ok(ranking)
}

fn robustness_config(
    args: &UncertaintyArgs,
    num: usize,
    seed: u64,
    dataset: &Dataset,
) -> anyhow::Result<RobustnessConfig> {
    let radius = match (args.radius.radius, args.radius.radius_pct) {
        (Some(r), None) => RadiusSpec::Absolute(r),
        (None, Some(p)) => RadiusSpec::RangeFraction(p),
        _ => anyhow::bail!("exactly one of --radius and --radius-pct is required"),
    };
    let target = match &args.feature {
        Some(name) => UncertainTarget::Feature(name.clone()),
        None => UncertainTarget::Label,
    };

    let mut config = RobustnessConfig::new()
        .with_target(target)
        .with_uncertain_num(num)
        .with_radius(radius)
        .with_seed(seed)
        .with_interval(!args.no_interval)
        .with_robustness_radius(args.robustness_radius);

    if let Some(selector) = args.boundary_metric {
        let metric = FairnessMetric::from_selector(selector)?;
        let sensitivity = SensitivityConfig::new(metric).with_threshold(args.boundary_threshold);
        let ranking = rank_rows(dataset, sensitivity)?;
        config = config.with_ranked_rows(ranking.indices);
    }
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CertifyOutput<'a> {
    config: &'a RobustnessConfig,
    report: &'a RobustnessReport,
}

pub fn cmd_certify(data: &DataArgs, uncertainty: &UncertaintyArgs, num: usize, json: bool) -> anyhow::Result<()> {
    if !json {
        section("Certify");
    }
    let dataset = load_dataset(data, json)?;
    let config = robustness_config(uncertainty, num, data.seed, &dataset)?;

    let start = Instant::now();
    let report = RobustnessCertifier::new(config.clone()).certify(&dataset.x_train, &dataset.y_train, &dataset.x_test)?;

    if json {
        let output = CertifyOutput { config: &config, report: &report };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    kv("Perturbed rows", &report.perturbed_rows.len().to_string());
    kv("Uncertain radius", &format!("{:.4}", report.uncertain_radius));
    kv("Mode", if report.interval { "interval" } else { "symbolic" });
    kv("Test points", &report.predictions.len().to_string());
    kv("Time", &format!("{:?}", start.elapsed()));
    println!("  {:<20} {}", muted("Robust ratio"), ratio_colored(report.robust_ratio));
    println!();
    Ok(())
}

pub fn cmd_patterns(
    data: &DataArgs,
    metric: i64,
    threshold: f64,
    parallel: bool,
    decision_threshold: Option<f64>,
    top: usize,
    json: bool,
) -> anyhow::Result<()> {
    let metric = FairnessMetric::from_selector(metric)?;
    if !json {
        section("Patterns");
    }
    let dataset = load_dataset(data, json)?;

    let mut config = SensitivityConfig::new(metric)
        .with_threshold(threshold)
        .with_parallel(parallel);
    if let Some(cutoff) = decision_threshold {
        config = config.with_decision_threshold(cutoff);
    }

    let start = Instant::now();
    let ranking = rank_rows(&dataset, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranking)?);
        return Ok(());
    }

    println!();
    kv("Metric", &metric.to_string());
    kv("Patterns evaluated", &ranking.pattern_scores.len().to_string());
    kv("Ranked rows", &ranking.len().to_string());
    kv("Time", &format!("{:?}", start.elapsed()));

    if ranking.is_empty() {
        println!();
        println!("  {}", warn("No pattern exceeded the threshold"));
    } else {
        section("Most sensitive rows");
        for (id, score) in ranking.indices.iter().zip(&ranking.scores).take(top) {
            println!("  {:>8}  {}", accent(&id.to_string()), format!("{:.4}", score).white());
        }
    }
    println!();
    Ok(())
}

#[derive(Debug, Serialize)]
struct SweepPoint {
    uncertain_num: usize,
    robust_ratio: f64,
}

pub fn cmd_sweep(data: &DataArgs, uncertainty: &UncertaintyArgs, nums: &[usize], json: bool) -> anyhow::Result<()> {
    if !json {
        section("Sweep");
    }
    let dataset = load_dataset(data, json)?;
    let base = robustness_config(uncertainty, 0, data.seed, &dataset)?;

    let points = nums
        .iter()
        .map(|&num| {
            let config = base.clone().with_uncertain_num(num);
            let report = RobustnessCertifier::new(config).certify(&dataset.x_train, &dataset.y_train, &dataset.x_test)?;
            Ok(SweepPoint {
                uncertain_num: num,
                robust_ratio: report.robust_ratio,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    println!();
    println!("  {:>10}  {}", muted("rows"), muted("robust ratio"));
    for p in &points {
        println!("  {:>10}  {}", p.uncertain_num.to_string().white(), ratio_colored(p.robust_ratio));
    }
    println!();
    Ok(())
}
