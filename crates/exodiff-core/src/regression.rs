use crate::compare::report::{render_human_summary as render_diff_summary, verdict_line};
use crate::compare::{DiffReport, Tolerance, compare_files};
use crate::domain::{ExodiffError, ExodiffResult};
use crate::policy::ComparisonOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RegressionRunnerConfig {
    pub manifest_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

impl Default for RegressionRunnerConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("tests/regression-manifest.json"),
            report_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
}

impl CaseStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionRunReport {
    pub generated_at_unix_seconds: u64,
    pub passed: bool,
    pub manifest_path: String,
    pub case_count: usize,
    pub passed_case_count: usize,
    pub failed_case_count: usize,
    pub skipped_case_count: usize,
    pub cases: Vec<CaseRegressionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseRegressionReport {
    pub case_id: String,
    pub status: CaseStatus,
    pub file1: Option<String>,
    pub file2: Option<String>,
    pub expected_error: Option<String>,
    pub reason: Option<String>,
    pub comparison: Option<DiffReport>,
}

pub fn run_regression(config: &RegressionRunnerConfig) -> ExodiffResult<RegressionRunReport> {
    let manifest = load_manifest(&config.manifest_path).map_err(ExodiffError::from)?;
    let base_dir = config
        .manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    info!(
        manifest = %config.manifest_path.display(),
        cases = manifest.cases.len(),
        "running regression manifest"
    );

    let cases: Vec<CaseRegressionReport> = manifest
        .cases
        .iter()
        .map(|case| run_case(&base_dir, case))
        .collect();

    let count = |status: CaseStatus| cases.iter().filter(|case| case.status == status).count();
    let passed_case_count = count(CaseStatus::Passed);
    let failed_case_count = count(CaseStatus::Failed);
    let skipped_case_count = count(CaseStatus::Skipped);

    let report = RegressionRunReport {
        generated_at_unix_seconds: current_unix_timestamp_seconds(),
        passed: failed_case_count == 0,
        manifest_path: normalize_path(&config.manifest_path),
        case_count: cases.len(),
        passed_case_count,
        failed_case_count,
        skipped_case_count,
        cases,
    };

    if let Some(report_path) = &config.report_path {
        write_report_file(report_path, &report).map_err(ExodiffError::from)?;
    }
    Ok(report)
}

pub fn render_human_summary(report: &RegressionRunReport) -> String {
    let mut lines = Vec::new();
    let status = if report.passed { "PASS" } else { "FAIL" };
    lines.push(format!("Regression status: {}", status));
    lines.push(format!(
        "Cases: {} total ({} passed, {} failed, {} skipped)",
        report.case_count,
        report.passed_case_count,
        report.failed_case_count,
        report.skipped_case_count
    ));

    for case in &report.cases {
        match &case.reason {
            Some(reason) if case.status != CaseStatus::Passed => lines.push(format!(
                "Case {}: {} ({})",
                case.case_id,
                case.status.as_str(),
                reason
            )),
            _ => lines.push(format!("Case {}: {}", case.case_id, case.status.as_str())),
        }
    }

    lines.join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum RegressionError {
    #[error("failed to read manifest '{}': {source}", path.display())]
    ReadManifest {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest '{}': {source}", path.display())]
    ParseManifest {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to create report directory '{}': {source}", path.display())]
    ReportDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize report '{}': {source}", path.display())]
    SerializeReport {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write report '{}': {source}", path.display())]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<RegressionError> for ExodiffError {
    fn from(error: RegressionError) -> Self {
        let message = error.to_string();
        match error {
            RegressionError::ReadManifest { .. } => {
                ExodiffError::io_system("IO.REGRESSION_MANIFEST", message)
            }
            RegressionError::ParseManifest { .. } => {
                ExodiffError::input_validation("INPUT.REGRESSION_MANIFEST", message)
            }
            RegressionError::ReportDirectory { .. } | RegressionError::WriteReport { .. } => {
                ExodiffError::io_system("IO.REGRESSION_FILESYSTEM", message)
            }
            RegressionError::SerializeReport { .. } => {
                ExodiffError::internal("INTERNAL.REGRESSION_REPORT", message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegressionManifest {
    #[serde(default)]
    cases: Vec<ManifestCase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ManifestCase {
    id: String,
    #[serde(default)]
    file1: Option<PathBuf>,
    #[serde(default)]
    file2: Option<PathBuf>,
    #[serde(default)]
    rtol: Option<f64>,
    #[serde(default)]
    atol: Option<f64>,
    #[serde(default)]
    expected_error: Option<String>,
}

fn load_manifest(manifest_path: &Path) -> Result<RegressionManifest, RegressionError> {
    let content =
        fs::read_to_string(manifest_path).map_err(|source| RegressionError::ReadManifest {
            path: manifest_path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| RegressionError::ParseManifest {
        path: manifest_path.to_path_buf(),
        source,
    })
}

fn run_case(base_dir: &Path, case: &ManifestCase) -> CaseRegressionReport {
    let mut report = CaseRegressionReport {
        case_id: case.id.clone(),
        status: CaseStatus::Skipped,
        file1: case.file1.as_deref().map(normalize_path),
        file2: case.file2.as_deref().map(normalize_path),
        expected_error: case.expected_error.clone(),
        reason: None,
        comparison: None,
    };

    let (Some(file1), Some(file2)) = (&case.file1, &case.file2) else {
        let missing = if case.file1.is_none() { "file1" } else { "file2" };
        debug!(case = %case.id, missing, "skipping case");
        report.reason = Some(format!("{missing} not specified"));
        return report;
    };

    let tolerance = match Tolerance::new(
        case.rtol.unwrap_or(Tolerance::DEFAULT.rtol),
        case.atol.unwrap_or(Tolerance::DEFAULT.atol),
    ) {
        Ok(tolerance) => tolerance,
        Err(error) => return failed(report, error.to_string()),
    };
    let options = ComparisonOptions::with_tolerance(tolerance);

    let diff = match compare_files(base_dir.join(file1), base_dir.join(file2), &options) {
        Ok(diff) => diff,
        Err(error) => {
            warn!(case = %case.id, %error, "comparison failed to run");
            return failed(report, format!("comparison failed to run: {error}"));
        }
    };

    let output = format!("{}\n{}", render_diff_summary(&diff), verdict_line(&diff));
    let outcome = match &case.expected_error {
        None if diff.is_identical() => Ok(()),
        None => Err("expected identical files".to_string()),
        Some(_) if diff.is_identical() => Err("expected different files".to_string()),
        Some(expected) if output.contains(expected.as_str()) => Ok(()),
        Some(expected) => Err(format!("summary does not mention '{expected}'")),
    };
    report.comparison = Some(diff);

    match outcome {
        Ok(()) => {
            debug!(case = %case.id, "case passed");
            report.status = CaseStatus::Passed;
            report
        }
        Err(reason) => failed(report, reason),
    }
}

fn failed(mut report: CaseRegressionReport, reason: String) -> CaseRegressionReport {
    info!(case = %report.case_id, %reason, "case failed");
    report.status = CaseStatus::Failed;
    report.reason = Some(reason);
    report
}

fn write_report_file(
    report_path: &Path,
    report: &RegressionRunReport,
) -> Result<(), RegressionError> {
    if let Some(parent_dir) = report_path.parent() {
        fs::create_dir_all(parent_dir).map_err(|source| RegressionError::ReportDirectory {
            path: parent_dir.to_path_buf(),
            source,
        })?;
    }

    let report_json =
        serde_json::to_string_pretty(report).map_err(|source| RegressionError::SerializeReport {
            path: report_path.to_path_buf(),
            source,
        })?;
    fs::write(report_path, report_json).map_err(|source| RegressionError::WriteReport {
        path: report_path.to_path_buf(),
        source,
    })
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::{CaseStatus, RegressionRunnerConfig, render_human_summary, run_regression};
    use crate::domain::ExodiffErrorCategory;
    use serde_json::Value;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[cfg(feature = "netcdf")]
    fn write_coord_file(path: &Path, coord: &[f64]) {
        let mut file = ::netcdf::create(path).expect("file should be created");
        file.add_dimension("num_nodes", coord.len())
            .expect("dimension should be defined");
        file.add_variable::<f64>("coord", &["num_nodes"])
            .expect("coord should be defined")
            .put_values(coord, ..)
            .expect("coord should be written");
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn run_regression_evaluates_expectations_and_writes_report() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_coord_file(&temp.path().join("gold.exo"), &[1.0, 2.0, 3.0]);
        write_coord_file(&temp.path().join("same.exo"), &[1.0, 2.0, 3.0]);
        write_coord_file(&temp.path().join("moved.exo"), &[1.0, 2.0, 3.1]);
        let manifest_path = temp.path().join("manifest.json");
        let report_path = temp.path().join("reports/report.json");
        fs::write(
            &manifest_path,
            r#"
            {
              "cases": [
                { "id": "identical", "file1": "same.exo", "file2": "gold.exo" },
                { "id": "coord", "file1": "moved.exo", "file2": "gold.exo", "expectedError": "coord is different" },
                { "id": "loose", "file1": "moved.exo", "file2": "gold.exo", "atol": 0.2 },
                { "id": "wrong", "file1": "moved.exo", "file2": "gold.exo" },
                { "id": "pending", "file1": "moved.exo" }
              ]
            }
            "#,
        )
        .expect("manifest should be written");

        let report = run_regression(&RegressionRunnerConfig {
            manifest_path,
            report_path: Some(report_path.clone()),
        })
        .expect("regression should run");

        let statuses: Vec<_> = report.cases.iter().map(|case| case.status).collect();
        assert_eq!(
            statuses,
            [
                CaseStatus::Passed,
                CaseStatus::Passed,
                CaseStatus::Passed,
                CaseStatus::Failed,
                CaseStatus::Skipped,
            ]
        );
        assert!(!report.passed);
        assert_eq!(report.skipped_case_count, 1);

        let summary = render_human_summary(&report);
        assert!(summary.starts_with("Regression status: FAIL"));
        assert!(summary.contains("Case wrong: FAIL (expected identical files)"));
        assert!(summary.contains("Case pending: SKIP (file2 not specified)"));

        let written: Value = serde_json::from_str(
            &fs::read_to_string(&report_path).expect("report should be written"),
        )
        .expect("report should be valid json");
        assert_eq!(written["case_count"], 5);
        assert_eq!(written["cases"][1]["status"], "passed");
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn missing_input_file_fails_the_case_without_aborting_the_run() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_coord_file(&temp.path().join("gold.exo"), &[1.0]);
        let manifest_path = temp.path().join("manifest.json");
        fs::write(
            &manifest_path,
            r#"{ "cases": [ { "id": "absent", "file1": "absent.exo", "file2": "gold.exo" } ] }"#,
        )
        .expect("manifest should be written");

        let report = run_regression(&RegressionRunnerConfig {
            manifest_path,
            report_path: None,
        })
        .expect("regression should run");
        assert_eq!(report.cases[0].status, CaseStatus::Failed);
        let reason = report.cases[0].reason.as_deref().unwrap_or_default();
        assert!(reason.starts_with("comparison failed to run"), "{reason}");
    }

    #[test]
    fn malformed_manifest_is_an_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let manifest_path = temp.path().join("manifest.json");
        fs::write(&manifest_path, r#"{ "cases": [ { "file1": "a.exo" } ] }"#)
            .expect("manifest should be written");

        let error = run_regression(&RegressionRunnerConfig {
            manifest_path,
            report_path: None,
        })
        .expect_err("manifest should be rejected");
        assert_eq!(error.category(), ExodiffErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.REGRESSION_MANIFEST");

        let missing = run_regression(&RegressionRunnerConfig {
            manifest_path: temp.path().join("missing.json"),
            report_path: None,
        })
        .expect_err("missing manifest should fail");
        assert_eq!(missing.exit_code(), 3);
    }
}
