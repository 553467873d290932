use super::CliError;
use anyhow::Context;
use exodiff_core::compare::report::{render_human_summary as render_diff_summary, verdict_line};
use exodiff_core::compare::{CompareError, DiffReport, compare_files};
use exodiff_core::dataset::Dataset;
use exodiff_core::netcdf::{self, AttributeValue};
use exodiff_core::policy::{ComparisonOptions, ComparisonPolicy};
use exodiff_core::regression::{RegressionRunnerConfig, render_human_summary, run_regression};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub(super) struct CompareArgs {
    /// File under test
    file1: PathBuf,

    /// Reference file
    file2: PathBuf,

    /// Relative tolerance (overrides the policy file)
    #[arg(long)]
    rtol: Option<f64>,

    /// Absolute tolerance (overrides the policy file)
    #[arg(long)]
    atol: Option<f64>,

    /// Stop at the first difference and report it as an error
    #[arg(long)]
    strict: bool,

    /// Only print the final verdict line
    #[arg(short, long)]
    quiet: bool,

    /// Comparison policy path
    #[arg(long)]
    policy: Option<PathBuf>,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl CompareArgs {
    fn options(&self) -> Result<ComparisonOptions, CliError> {
        let mut policy = match &self.policy {
            Some(path) => ComparisonPolicy::from_path(path)?,
            None => ComparisonPolicy::default(),
        };
        policy.rtol = self.rtol.or(policy.rtol);
        policy.atol = self.atol.or(policy.atol);

        let options = policy.compile()?;
        Ok(if self.strict {
            options.fail_fast()
        } else {
            options
        })
    }
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// File to describe
    file: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct RegressionArgs {
    /// Regression manifest path
    #[arg(long, default_value = "tests/regression-manifest.json")]
    manifest: PathBuf,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl RegressionArgs {
    fn into_config(self) -> RegressionRunnerConfig {
        RegressionRunnerConfig {
            manifest_path: self.manifest,
            report_path: self.report,
        }
    }
}

pub(super) fn run_compare_command(args: CompareArgs) -> Result<i32, CliError> {
    let options = args.options()?;

    let report = match compare_files(&args.file1, &args.file2, &options) {
        Ok(report) => report,
        Err(error @ CompareError::Difference(_)) => {
            println!("exodiff-rs: files are different");
            return Err(error.into());
        }
        Err(error) => return Err(error.into()),
    };

    if !args.quiet && !report.is_identical() {
        println!("{}", render_diff_summary(&report));
        println!();
    }
    if let Some(report_path) = &args.report {
        write_json_report(report_path, &report)?;
    }
    println!("{}", verdict_line(&report));

    if report.is_identical() { Ok(0) } else { Ok(1) }
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let file = netcdf::open(&args.file)?;
    let attributes = file.attributes()?;

    println!("file: {}", args.file.display());

    println!("dimensions:");
    for dimension in file.dimensions() {
        if dimension.is_unlimited {
            println!(
                "    {} = UNLIMITED ({} currently)",
                dimension.name, dimension.size
            );
        } else {
            println!("    {} = {}", dimension.name, dimension.size);
        }
    }

    println!("variables:");
    for variable in file.variables() {
        let type_name = file.variable_type(&variable.name).unwrap_or("?");
        println!("    {} {}{:?}", type_name, variable.name, variable.shape);
    }

    if !attributes.is_empty() {
        println!("global attributes:");
        for attribute in &attributes {
            println!(
                "    {} = {}",
                attribute.name,
                render_attribute(&attribute.value)
            );
        }
    }
    Ok(0)
}

pub(super) fn run_regression_command(args: RegressionArgs) -> Result<i32, CliError> {
    let config = args.into_config();
    let report = run_regression(&config).map_err(CliError::Compute)?;
    println!("{}", render_human_summary(&report));
    if let Some(report_path) = &config.report_path {
        println!("JSON report: {}", report_path.display());
    }

    if report.passed { Ok(0) } else { Ok(1) }
}

fn render_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Text(text) => format!("{text:?}"),
        AttributeValue::Numbers(numbers) => numbers
            .iter()
            .map(|number| number.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn write_json_report(path: &Path, report: &DiffReport) -> anyhow::Result<()> {
    if let Some(parent_dir) = path.parent() {
        fs::create_dir_all(parent_dir).with_context(|| {
            format!("failed to create report directory '{}'", parent_dir.display())
        })?;
    }
    let json = serde_json::to_string_pretty(report).context("failed to serialize diff report")?;
    fs::write(path, json).with_context(|| format!("failed to write report '{}'", path.display()))
}
