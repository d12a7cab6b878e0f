use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}

#[test]
fn subject_prints_selected_metrics_in_order() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvbatch");
    cmd.args([
        "subject",
        "--input",
        &sample_path("test_data/cohort/S1/Final/IBI.csv"),
    ]);
    let stdout = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(stdout)?;
    let rmssd = text.find("\"RMSSD\"").expect("RMSSD");
    let pnn50 = text.find("\"pNN50\"").expect("pNN50");
    let ratio = text.find("\"LF_HF_Ratio\"").expect("LF_HF_Ratio");
    assert!(rmssd < pnn50 && pnn50 < ratio);

    let value: Value = serde_json::from_str(&text)?;
    assert!(value["RMSSD"].as_f64().unwrap_or(-1.0) > 0.0);
    // 0.1 Hz modulation
    assert!(value["LF_HF_Ratio"].as_f64().unwrap_or(0.0) > 1.0);
    Ok(())
}

#[test]
fn subject_fails_on_missing_file() {
    let temp = tempdir().expect("tempdir");
    let missing = temp.path().join("S1/Final/IBI.csv");
    let mut cmd = cargo_bin_cmd!("hrvbatch");
    cmd.args(["subject", "--input", missing.to_str().expect("utf8 path")]);
    cmd.assert().failure();
}

#[test]
fn features_reports_both_domains() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvbatch");
    cmd.args([
        "features",
        "--input",
        &sample_path("test_data/cohort/S3/Final/IBI.csv"),
    ]);
    let stdout = cmd.assert().success().get_output().stdout.clone();
    let value: Value = serde_json::from_slice(&stdout)?;
    assert!(value["time"]["sdnn"].as_f64().is_some());
    let hf = value["frequency"]["hf"].as_f64().expect("hf");
    let lf = value["frequency"]["lf"].as_f64().expect("lf");
    // 0.25 Hz modulation
    assert!(hf > lf);
    Ok(())
}

#[test]
fn metrics_lists_catalog() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvbatch");
    cmd.arg("metrics");
    let stdout = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(stdout)?;
    let keys: Vec<&str> = text.lines().collect();
    for key in ["HRV_RMSSD", "HRV_pNN50", "HRV_LFHF"] {
        assert!(keys.contains(&key), "{key} missing");
    }
    Ok(())
}

#[test]
fn init_config_round_trips_through_batch() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("hrvbatch.toml");
    let mut cmd = cargo_bin_cmd!("hrvbatch");
    cmd.args(["init-config", "--out", config.to_str().expect("utf8 path")]);
    cmd.assert().success();
    let text = fs::read_to_string(&config)?;
    assert!(text.contains("session_folder = \"Final\""));
    assert!(text.contains("HRV_LFHF"));

    let mut cmd = cargo_bin_cmd!("hrvbatch");
    cmd.args([
        "subject",
        "--config",
        config.to_str().expect("utf8 path"),
        "--input",
        &sample_path("test_data/cohort/S1/Final/IBI.csv"),
    ]);
    cmd.assert().success();
    Ok(())
}
