use netcdf::types::NcVariableType;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const NAME_WIDTH: usize = 33;

fn write_mesh(path: &Path, coordx: &[f64], names: &[&str]) {
    let mut file = netcdf::create(path).expect("mesh should be created");
    file.add_attribute("title", "cli fixture")
        .expect("title should be written");
    file.add_dimension("num_nodes", coordx.len())
        .expect("num_nodes should be defined");
    file.add_dimension("num_elem_var", names.len())
        .expect("num_elem_var should be defined");
    file.add_dimension("len_name", NAME_WIDTH)
        .expect("len_name should be defined");
    file.add_variable::<f64>("coordx", &["num_nodes"])
        .expect("coordx should be defined")
        .put_values(coordx, ..)
        .expect("coordx should be written");

    let mut bytes = vec![0u8; names.len() * NAME_WIDTH];
    for (row, name) in bytes.chunks_exact_mut(NAME_WIDTH).zip(names) {
        row[..name.len()].copy_from_slice(name.as_bytes());
    }
    file.add_variable_with_type(
        "name_elem_var",
        &["num_elem_var", "len_name"],
        &NcVariableType::Char,
    )
    .expect("name_elem_var should be defined")
    .put_raw_values(&bytes, ..)
    .expect("name_elem_var should be written");
}

fn exodiff(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_exodiff-rs"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("exodiff-rs should run")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path should be valid utf-8")
}

#[test]
fn identical_files_exit_zero() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("b.exo");
    write_mesh(&file1, &[1.0, 2.0, 3.0], &["Stress", "Strain"]);
    write_mesh(&file2, &[1.0, 2.0, 3.0], &["strain", "stress"]);

    let output = exodiff(&["compare", path_arg(&file1), path_arg(&file2)]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("exodiff-rs: files are identical"));
}

#[test]
fn different_files_print_summary_and_exit_one() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("b.exo");
    let report_path = temp.path().join("out/report.json");
    write_mesh(&file1, &[1.0, 2.0, 3.0], &["stress"]);
    write_mesh(&file2, &[1.0, 2.0, 3.1], &["stress"]);

    let output = exodiff(&[
        "compare",
        path_arg(&file1),
        path_arg(&file2),
        "--report",
        path_arg(&report_path),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coordx is different"), "stdout: {stdout}");
    assert!(stdout.contains("max absolute diff 1.0000e-1 at position (2)"));
    assert!(stdout.contains("exodiff-rs: files are different"));

    let report: Value = serde_json::from_str(
        &fs::read_to_string(&report_path).expect("report should be written"),
    )
    .expect("report should be valid json");
    assert_eq!(report["values"]["coordx"]["max_abs_diff_position"][0], 2);
    assert_eq!(report["names_short_circuited"], false);
}

#[test]
fn tolerance_flags_loosen_the_comparison() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("b.exo");
    write_mesh(&file1, &[1.0, 2.0, 3.0], &["stress"]);
    write_mesh(&file2, &[1.0, 2.0, 3.1], &["stress"]);

    let output = exodiff(&[
        "compare",
        "--atol",
        "0.2",
        "-q",
        path_arg(&file1),
        path_arg(&file2),
    ]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn strict_mode_reports_the_first_difference_as_an_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("b.exo");
    write_mesh(&file1, &[1.0, 2.0], &["stress", "foo"]);
    write_mesh(&file2, &[1.0, 2.0], &["stress", "strain"]);

    let output = exodiff(&["compare", "--strict", path_arg(&file1), path_arg(&file2)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR: [DIFF.NAMES] name_elem_var is different"),
        "stderr: {stderr}"
    );
    assert!(!stderr.contains("FATAL EXIT CODE"));
}

#[test]
fn policy_file_can_ignore_variables() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("b.exo");
    let policy = temp.path().join("policy.json");
    write_mesh(&file1, &[1.0, 2.0], &["stress"]);
    write_mesh(&file2, &[5.0, 2.0], &["stress"]);
    fs::write(&policy, r#"{ "ignoredVariables": ["coord*"] }"#).expect("policy should be written");

    let output = exodiff(&[
        "compare",
        "--policy",
        path_arg(&policy),
        path_arg(&file1),
        path_arg(&file2),
    ]);
    assert_eq!(output.status.code(), Some(0));

    fs::write(&policy, r#"{ "tolerance": 1 }"#).expect("policy should be written");
    let output = exodiff(&[
        "compare",
        "--policy",
        path_arg(&policy),
        path_arg(&file1),
        path_arg(&file2),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.POLICY]"), "stderr: {stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn unreadable_input_is_a_fatal_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("not-netcdf.txt");
    write_mesh(&file1, &[1.0], &["stress"]);
    fs::write(&file2, "plain text, not a dataset").expect("file should be written");

    let output = exodiff(&["compare", path_arg(&file1), path_arg(&file2)]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [IO.DATASET] file2"), "stderr: {stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 3"));
}

#[test]
fn corrupt_header_exits_with_the_io_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file1 = temp.path().join("a.exo");
    let file2 = temp.path().join("corrupt.exo");
    write_mesh(&file1, &[1.0], &["stress"]);
    let mut bytes = b"CDF\x01".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x7f, 0xff, 0xff, 0xff]);
    fs::write(&file2, bytes).expect("file should be written");

    for args in [
        vec!["compare", path_arg(&file1), path_arg(&file2)],
        vec!["inspect", path_arg(&file2)],
    ] {
        let output = exodiff(&args);
        assert_eq!(output.status.code(), Some(3), "args: {args:?}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("ERROR: [IO.DATASET]"), "stderr: {stderr}");
        assert!(!stderr.contains("panicked"), "stderr: {stderr}");
    }
}

#[test]
fn inspect_lists_dimensions_and_variables() {
    let temp = TempDir::new().expect("tempdir should be created");
    let file = temp.path().join("mesh.exo");
    write_mesh(&file, &[1.0, 2.0, 3.0], &["stress"]);

    let output = exodiff(&["inspect", path_arg(&file)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("num_nodes = 3"), "stdout: {stdout}");
    assert!(stdout.contains("double coordx[3]"));
    assert!(stdout.contains("char name_elem_var[1, 33]"));
    assert!(stdout.contains("title = \"cli fixture\""));
}

#[test]
fn regression_command_runs_manifest_cases() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_mesh(&temp.path().join("gold.exo"), &[1.0, 2.0, 3.0], &["stress"]);
    write_mesh(&temp.path().join("run.exo"), &[1.0, 2.0, 3.1], &["stress"]);
    let manifest = temp.path().join("manifest.json");
    let report_path = temp.path().join("reports/regression.json");
    fs::write(
        &manifest,
        r#"
        {
          "cases": [
            { "id": "same", "file1": "gold.exo", "file2": "gold.exo" },
            { "id": "shift", "file1": "run.exo", "file2": "gold.exo", "expectedError": "coordx" }
          ]
        }
        "#,
    )
    .expect("manifest should be written");

    let output = exodiff(&[
        "regression",
        "--manifest",
        path_arg(&manifest),
        "--report",
        path_arg(&report_path),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Regression status: PASS"), "stdout: {stdout}");
    assert!(report_path.exists(), "report file should be created");
}
