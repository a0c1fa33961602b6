use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use daycast::model::{LinearModel, ModelFamily};
use daycast::{ArtifactPaths, TrainedModel};
use serde_json::Value;
use tempfile::tempdir;

const DAY: &str = r#"{
    "transaction_qty": 120,
    "unit_price": 3.5,
    "month": 6,
    "day": 14,
    "day_of_week": 4,
    "is_weekend": 0,
    "revenue_lag1": 410.0,
    "revenue_lag7": 395.5,
    "revenue_rolling3": 402.0,
    "revenue_rolling7": 399.0,
    "store_location_Lower_Manhattan": 1
}"#;

/// revenue = 50 + 4 * transaction_qty + 20 * store_location_Lower_Manhattan
fn write_artifacts(dir: &Path) -> ArtifactPaths {
    let paths = ArtifactPaths::in_dir(dir);
    TrainedModel {
        n_features: 2,
        family: ModelFamily::Linear(LinearModel {
            intercept: 50.0,
            coefficients: vec![4.0, 20.0],
        }),
    }
    .save(&paths.model)
    .expect("save model");
    fs::write(
        &paths.feature_info,
        r#"{"feature_names": ["transaction_qty", "store_location_Lower_Manhattan"],
            "model_name": "Linear Regression", "metrics": {"r2": 0.87, "rmse": 31.2}}"#,
    )
    .expect("write feature info");
    fs::write(&paths.training_stats, r#"{"residual_std": 10.0}"#).expect("write stats");
    paths
}

fn daycast(dir: &Path, paths: &ArtifactPaths, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_daycast"))
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .arg("--model")
        .arg(&paths.model)
        .arg("--feature-info")
        .arg(&paths.feature_info)
        .arg("--stats")
        .arg(&paths.training_stats)
        .args(args)
        .output()
        .expect("run daycast cli")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "CLI exited with status {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn predict_prints_a_forecast_with_a_95_percent_interval() {
    let tmp = tempdir().expect("temporary directory");
    let paths = write_artifacts(tmp.path());
    let input = tmp.path().join("day.json");
    fs::write(&input, DAY).expect("write input");

    let report = stdout_json(&daycast(
        tmp.path(),
        &paths,
        &["predict", "--input", input.to_str().expect("path str")],
    ));

    assert_eq!(report["success"], true);
    assert_eq!(report["predicted_revenue"], 550.0);
    assert_eq!(report["confidence_interval"]["confidence_level"], "95%");
    let lower = report["confidence_interval"]["lower"].as_f64().unwrap();
    let upper = report["confidence_interval"]["upper"].as_f64().unwrap();
    assert!((lower - (550.0 - 19.6)).abs() < 1e-9);
    assert!((upper - (550.0 + 19.6)).abs() < 1e-9);
    assert_eq!(report["model_name"], "Linear Regression");
}

#[test]
fn invalid_input_exits_with_an_error_document() {
    let tmp = tempdir().expect("temporary directory");
    let paths = write_artifacts(tmp.path());
    let input = tmp.path().join("day.json");
    fs::write(&input, DAY.replace("\"month\": 6", "\"month\": 13")).expect("write input");

    let output = daycast(
        tmp.path(),
        &paths,
        &["predict", "--input", input.to_str().expect("path str")],
    );
    assert_eq!(output.status.code(), Some(1));
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert!(error["error"].as_str().unwrap().contains("month"));
}

#[test]
fn health_reports_unloaded_model_without_failing() {
    let tmp = tempdir().expect("temporary directory");
    let paths = ArtifactPaths::in_dir(&tmp.path().join("missing"));

    let report = stdout_json(&daycast(tmp.path(), &paths, &["health"]));
    assert_eq!(report["model_loaded"], false);
    assert_eq!(report["status"], "unavailable");

    let loaded = write_artifacts(tmp.path());
    let report = stdout_json(&daycast(tmp.path(), &loaded, &["health"]));
    assert_eq!(report["model_loaded"], true);
    assert_eq!(report["status"], "healthy");
}

#[test]
fn info_fails_when_artifacts_are_missing() {
    let tmp = tempdir().expect("temporary directory");
    let paths = ArtifactPaths::in_dir(&tmp.path().join("missing"));

    let output = daycast(tmp.path(), &paths, &["info"]);
    assert_eq!(output.status.code(), Some(1));
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert!(error["error"].as_str().unwrap().contains("revenue_model.toml"));
}

#[test]
fn batch_writes_one_tsv_row_per_input() {
    let tmp = tempdir().expect("temporary directory");
    let paths = write_artifacts(tmp.path());
    let bad_day = DAY.replace("\"is_weekend\": 0", "\"is_weekend\": 2");
    let input = tmp.path().join("days.json");
    fs::write(&input, format!("{{\"predictions\": [{DAY}, {bad_day}, {DAY}]}}"))
        .expect("write input");
    let output_path = tmp.path().join("forecasts.tsv");

    let output = daycast(
        tmp.path(),
        &paths,
        &[
            "batch",
            "--input",
            input.to_str().expect("path str"),
            "--output",
            output_path.to_str().expect("path str"),
        ],
    );
    assert!(output.status.success(), "CLI exited with {:?}", output.status);

    let tsv = fs::read_to_string(&output_path).expect("read tsv");
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "index\tpredicted_revenue\tlower\tupper\terror");
    assert!(lines[1].starts_with("0\t550.000000\t530.400000\t569.600000"));
    assert!(lines[2].starts_with("1\t\t\t\t"));
    assert!(lines[2].contains("is_weekend"));
}

#[test]
fn raw_predict_skips_field_validation_and_ignores_unknown_keys() {
    let tmp = tempdir().expect("temporary directory");
    let paths = write_artifacts(tmp.path());
    let input = tmp.path().join("raw.json");
    fs::write(
        &input,
        r#"{"transaction_qty": 10, "store_location_Lower_Manhattan": 1, "month": 13, "foot_traffic": 9000}"#,
    )
    .expect("write input");

    let report = stdout_json(&daycast(
        tmp.path(),
        &paths,
        &["predict", "--raw", "--input", input.to_str().expect("path str")],
    ));
    assert_eq!(report["predicted_revenue"], 110.0);
    assert_eq!(report["confidence_interval"]["confidence_level"], "95%");
}

#[test]
fn batch_reads_csv_and_prints_a_json_report() {
    let tmp = tempdir().expect("temporary directory");
    let paths = write_artifacts(tmp.path());
    let input = tmp.path().join("days.csv");
    fs::write(
        &input,
        "transaction_qty,unit_price,month,day,day_of_week,is_weekend,revenue_lag1,revenue_lag7,revenue_rolling3,revenue_rolling7,store_location_Lower_Manhattan\n\
         100,3.0,6,14,4,0,410.0,395.5,402.0,399.0,1\n\
         25.0,3.0,6.0,15,5,1,400.0,390.0,401.0,398.0,0\n\
         7,3.0,6,16,9,1,380.0,385.0,395.0,396.0,0\n",
    )
    .expect("write input");

    let report = stdout_json(&daycast(
        tmp.path(),
        &paths,
        &["batch", "--input", input.to_str().expect("path str")],
    ));
    assert_eq!(report["total_predictions"], 3);
    assert_eq!(report["successful_predictions"], 2);
    assert_eq!(report["failed_predictions"], 1);
    assert_eq!(report["success"], false);
    assert_eq!(report["results"][0]["predicted_revenue"], 470.0);
    assert_eq!(report["results"][1]["predicted_revenue"], 150.0);
    assert_eq!(report["results"][2]["success"], false);
    assert!(
        report["results"][2]["error"]
            .as_str()
            .unwrap()
            .contains("day_of_week")
    );
}

#[test]
fn features_and_explain_list_the_schema() {
    let tmp = tempdir().expect("temporary directory");
    let paths = write_artifacts(tmp.path());

    let catalog = stdout_json(&daycast(tmp.path(), &paths, &["features"]));
    assert_eq!(catalog["total_features"], 2);
    assert_eq!(catalog["features"][1]["name"], "store_location_Lower_Manhattan");
    assert_eq!(catalog["features"][1]["type"], "binary");

    let explain = stdout_json(&daycast(tmp.path(), &paths, &["explain"]));
    assert!(explain["feature_explanations"]["revenue_lag1"].is_string());
}

#[test]
fn version_prints_the_package_version() {
    let tmp = tempdir().expect("temporary directory");
    let paths = ArtifactPaths::in_dir(tmp.path());
    let output = daycast(tmp.path(), &paths, &["version"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.starts_with(&format!("daycast {}", env!("CARGO_PKG_VERSION"))));
}
