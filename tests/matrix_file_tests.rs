use matrix_core::{MatrixDriver, Outcome, StageTimeouts, ToolchainResolver};
use matrix_domain::ConfigurationTuple;
use matrixflow::{AppError, MatrixFile};
use serde_json::json;
use std::time::Duration;

fn matrix(extra: serde_json::Value) -> serde_json::Value {
    let mut base = json!({
        "configurations": [
            { "runtime_version": "2.7", "architecture": 32 },
            { "runtime_version": "3.4", "architecture": 64, "extra_flags": ["coverage"] }
        ],
        "dependencies": [
            { "name": "numpy", "requirement": ">=1.9" },
            { "name": "mock", "when": { "runtime_version": "2.7" } }
        ],
        "commands": {
            "install_runtime": ["sh", "-c", "echo runtime >> calls.log"],
            "install_package": ["sh", "-c", "echo '{spec}' >> calls.log"],
            "build": ["sh", "-c", "echo $MATRIX_TOOLCHAIN > {artifact}/toolchain.txt"],
            "test": ["sh", "-c", "test -f {artifact}/toolchain.txt && echo PASSED import"]
        }
    });
    if let (Some(obj), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
    }
    base
}

fn load(value: serde_json::Value) -> Result<MatrixFile, AppError> {
    MatrixFile::from_json(&value.to_string())
}

#[test]
fn full_matrix_file_is_loaded() {
    let file = load(matrix(json!({
        "test_summary": "summary.json",
        "timeouts": { "build_secs": 60 },
        "toolchains": [ { "runtime_version": "3.7", "architecture": 64, "toolchain": "msvc-14.1",
                          "variables": { "CC": "cl.exe" } } ]
    }))).unwrap();
    let descriptor = file.descriptor().unwrap();
    let ids: Vec<String> = descriptor.list_configurations().iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids, vec!["2.7-32", "3.4-64"]);
    assert!(descriptor.list_configurations()[1].has_flag("coverage"));

    let t = file.timeouts.apply(StageTimeouts::default());
    assert_eq!(t.build, Duration::from_secs(60));
    assert_eq!(t.test, Duration::from_secs(1800));

    let table = file.toolchain_table().unwrap();
    let resolver = matrix_adapters::TableToolchainResolver::new(table);
    let ctx = resolver.resolve(&ConfigurationTuple::parse("3.7", 64).unwrap()).unwrap();
    assert_eq!(ctx.toolchain(), "msvc-14.1");
    assert_eq!(ctx.get("CC"), Some("cl.exe"));
}

#[test]
fn duplicate_tuples_are_fatal() {
    let file = load(matrix(json!({
        "configurations": [ { "runtime_version": "2.7", "architecture": 32 },
                            { "runtime_version": "2.7", "architecture": 32 } ]
    }))).unwrap();
    assert!(matches!(file.descriptor(), Err(AppError::Domain(_))));
}

#[test]
fn malformed_files_are_parse_errors() {
    assert!(matches!(load(matrix(json!({ "retries": 3 }))), Err(AppError::Parse(_))));
    assert!(matches!(load(matrix(json!({ "configurations": [ { "runtime_version": "2.x", "architecture": 32 } ] }))),
                     Err(AppError::Parse(_))));
    assert!(matches!(load(matrix(json!({ "configurations": [ { "runtime_version": "2.7", "architecture": 16 } ] }))),
                     Err(AppError::Parse(_))));
    assert!(matches!(MatrixFile::from_json("{"), Err(AppError::Parse(_))));
}

#[test]
fn duplicate_toolchain_overrides_are_rejected() {
    let file = load(matrix(json!({
        "toolchains": [ { "runtime_version": "3.7", "architecture": 64, "toolchain": "a" },
                        { "runtime_version": "3.7", "architecture": 64, "toolchain": "b" } ]
    }))).unwrap();
    assert!(matches!(file.toolchain_table(), Err(AppError::Domain(_))));
}

#[test]
fn missing_file_is_reported() {
    let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
    assert!(matches!(MatrixFile::load(&path), Err(AppError::Config(_))));
}

#[cfg(unix)]
#[test]
fn matrix_file_drives_a_full_run() {
    let work_dir = std::env::temp_dir().join(format!("matrixflow-run-{}", uuid::Uuid::new_v4()));
    let file = load(matrix(json!({}))).unwrap();
    let stages = file.stage_set(&work_dir, StageTimeouts::default()).unwrap();
    let result = MatrixDriver::builder(file.descriptor().unwrap(), stages).build().run();

    assert!(result.is_success(), "{}", result.render_summary());
    assert_eq!(result.entries().iter().map(|e| e.outcome).collect::<Vec<_>>(),
               vec![Outcome::Success, Outcome::Success]);
    let toolchain = std::fs::read_to_string(work_dir.join("py3.4-x64/build/toolchain.txt")).unwrap();
    assert_eq!(toolchain.trim(), "msvc-10.0");
    let calls = std::fs::read_to_string(work_dir.join("py2.7-x86/calls.log")).unwrap();
    assert_eq!(calls, "runtime\nnumpy>=1.9\nmock\n");
}

#[cfg(unix)]
#[test]
fn build_and_test_run_inside_source_dir() {
    let root = std::env::temp_dir().join(format!("matrixflow-src-{}", uuid::Uuid::new_v4()));
    let source = root.join("checkout");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("setup.py"), "").unwrap();
    let file = load(matrix(json!({
        "configurations": [ { "runtime_version": "3.4", "architecture": 64 } ],
        "source_dir": source,
        "commands": {
            "install_runtime": ["true"],
            "install_package": ["true"],
            "build": ["sh", "-c", "test -f setup.py && pwd > {artifact}/cwd.txt"],
            "test": ["sh", "-c", "test -f setup.py && echo PASSED import"]
        }
    }))).unwrap();
    let stages = file.stage_set(&root.join("work"), StageTimeouts::default()).unwrap();
    let result = MatrixDriver::builder(file.descriptor().unwrap(), stages).build().run();

    assert!(result.is_success(), "{}", result.render_summary());
    let cwd = std::fs::read_to_string(root.join("work/py3.4-x64/build/cwd.txt")).unwrap();
    assert_eq!(std::path::Path::new(cwd.trim()).canonicalize().unwrap(), source.canonicalize().unwrap());
}

#[test]
fn missing_source_dir_is_a_config_error() {
    let work_dir = std::env::temp_dir().join(format!("matrixflow-run-{}", uuid::Uuid::new_v4()));
    let missing = work_dir.join("no-such-checkout");
    let file = load(matrix(json!({ "source_dir": missing }))).unwrap();
    assert!(matches!(file.stage_set(&work_dir, StageTimeouts::default()), Err(AppError::Config(_))));
}

#[cfg(unix)]
#[test]
fn failed_matrix_keeps_exit_code_when_report_cannot_be_written() {
    let work_dir = std::env::temp_dir().join(format!("matrixflow-run-{}", uuid::Uuid::new_v4()));
    let file = load(matrix(json!({
        "configurations": [ { "runtime_version": "3.4", "architecture": 64 } ],
        "commands": {
            "install_runtime": ["true"],
            "install_package": ["true"],
            "build": ["sh", "-c", "exit 2"],
            "test": ["true"]
        }
    }))).unwrap();
    let stages = file.stage_set(&work_dir, StageTimeouts::default()).unwrap();
    let result = MatrixDriver::builder(file.descriptor().unwrap(), stages).build().run();
    assert_eq!(result.entries()[0].outcome, Outcome::BuildFailed);

    let report = work_dir.join("missing-dir").join("report.json");
    assert!(matrixflow::run_report::write_report(&report, &result).is_err());
    assert_eq!(matrixflow::run_report::finish_run(&result, Some(&report)), 1);
}

#[cfg(unix)]
#[test]
fn interrupt_stops_the_driver_between_stages() {
    use matrixflow::interrupt::{on_interrupt, InterruptAction};

    let work_dir = std::env::temp_dir().join(format!("matrixflow-run-{}", uuid::Uuid::new_v4()));
    let file = load(matrix(json!({
        "configurations": [ { "runtime_version": "2.7", "architecture": 32 },
                            { "runtime_version": "3.4", "architecture": 64 } ],
        "commands": {
            "install_runtime": ["true"],
            "install_package": ["true"],
            "build": ["sh", "-c", "sleep 1"],
            "test": ["sh", "-c", "echo PASSED smoke"]
        }
    }))).unwrap();
    let stages = file.stage_set(&work_dir, StageTimeouts::default()).unwrap();
    let mut driver = MatrixDriver::builder(file.descriptor().unwrap(), stages).build();
    let token = driver.cancellation_token();
    let interrupter = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        on_interrupt(&token)
    });
    let result = driver.run();

    assert_eq!(interrupter.join().unwrap(), InterruptAction::Cancelled);
    // La primera tupla termina su build y se detiene antes de Testing.
    let outcomes: Vec<Outcome> = result.entries().iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Cancelled, Outcome::Cancelled]);
    assert_eq!(result.exit_code(), 1);
}
