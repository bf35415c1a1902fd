use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const DARK: image::Rgba<u8> = image::Rgba([10, 10, 10, 255]);
const BRIGHT: image::Rgba<u8> = image::Rgba([240, 240, 240, 255]);

/// 240x160 plot with axes crossing near (30, 130).
fn write_plot_png(path: &Path) {
    let mut img = image::RgbaImage::from_pixel(240, 160, DARK);
    for y in 129..132 {
        for x in 0..240 {
            img.put_pixel(x, y, BRIGHT);
        }
    }
    for y in 0..160 {
        for x in 29..32 {
            img.put_pixel(x, y, BRIGHT);
        }
    }
    img.save(path).unwrap();
}

const TUNED_CONFIG: &str = r#"{ "hough": { "vote_threshold": 120, "max_lines": 50 } }"#;

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn detect_prints_axis_suggestion() {
    let dir = tempdir().unwrap();
    let png = dir.path().join("plot.png");
    let config = dir.path().join("params.json");
    write_plot_png(&png);
    std::fs::write(&config, TUNED_CONFIG).unwrap();

    let json = stdout_json(
        Command::cargo_bin("chart-calib")
            .unwrap()
            .arg("detect")
            .arg(&png)
            .arg("--config")
            .arg(&config),
    );
    assert_eq!(json["width"], 240);
    assert_eq!(json["height"], 160);
    assert!(json["edge_pixels"].as_u64().unwrap() > 0);
    assert_eq!(json["suggestion"]["x_axis"]["orientation"], "horizontal");
    assert_eq!(json["suggestion"]["y_axis"]["orientation"], "vertical");
}

#[test]
fn calibrate_replays_explicit_axes_ticks_and_slope() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    std::fs::write(
        &script,
        r#"{
            "size": [300, 200],
            "axes": { "x": [[10, 190], [290, 190]], "y": [[10, 195], [10, 10]] },
            "ticks": [
                { "pixel": [110, 189], "value": 10 },
                { "pixel": [150, 191], "value": 99 },
                { "pixel": [11, 90], "value": 20 }
            ],
            "queries": [[60, 140]],
            "slope": [[10, 190], [110, 90]]
        }"#,
    )
    .unwrap();

    let json = stdout_json(Command::cargo_bin("chart-calib").unwrap().arg("calibrate").arg(&script));
    assert_eq!(json["phase"], "done");
    assert_eq!(json["markers"].as_array().unwrap().len(), 2);
    assert_eq!(json["rejected"].as_array().unwrap().len(), 1);

    let ax = json["mappings"]["x"]["a"].as_f64().unwrap();
    let ay = json["mappings"]["y"]["a"].as_f64().unwrap();
    assert!((ax - 0.1).abs() < 1e-12);
    assert!((ay - 0.2).abs() < 1e-12);

    let q = &json["queries"][0];
    assert!((q["x"].as_f64().unwrap() - 5.0).abs() < 1e-9);
    assert!((q["y"].as_f64().unwrap() - 10.0).abs() < 1e-9);

    assert!((json["slope"]["slope"].as_f64().unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(json["slope"]["calibrated"], true);
    assert!(json["summary"].as_str().unwrap().contains("Slope: 2"));
}

#[test]
fn vertical_slope_is_reported_as_infinite() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    std::fs::write(
        &script,
        r#"{
            "size": [300, 200],
            "axes": { "x": [[10, 190], [290, 190]], "y": [[10, 195], [10, 10]] },
            "slope": [[50, 190], [50, 90]]
        }"#,
    )
    .unwrap();

    let json = stdout_json(Command::cargo_bin("chart-calib").unwrap().arg("calibrate").arg(&script));
    assert_eq!(json["slope"]["slope"], "inf");
    assert_eq!(json["slope"]["dx"].as_f64(), Some(0.0));
    assert_eq!(json["slope"]["calibrated"], false);
}

#[test]
fn ticks_after_completion_are_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    std::fs::write(
        &script,
        r#"{
            "size": [300, 200],
            "axes": { "x": [[10, 190], [290, 190]], "y": [[10, 195], [10, 10]] },
            "ticks": [
                { "pixel": [110, 189], "value": 10 },
                { "pixel": [11, 90], "value": 20 },
                { "pixel": [210, 190], "value": 20 }
            ]
        }"#,
    )
    .unwrap();

    let json = stdout_json(Command::cargo_bin("chart-calib").unwrap().arg("calibrate").arg(&script));
    assert_eq!(json["phase"], "done");
    assert_eq!(json["markers"].as_array().unwrap().len(), 2);
    let rejected = json["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0], "calibration already complete");
}

#[test]
fn calibrate_with_auto_axes_and_direct_markers() {
    let dir = tempdir().unwrap();
    write_plot_png(&dir.path().join("plot.png"));
    let script = dir.path().join("script.json");
    std::fs::write(
        &script,
        format!(
            r#"{{
                "image": "plot.png",
                "params": {{ "detector": {TUNED_CONFIG} }},
                "axes": "auto",
                "ticks": [
                    {{ "pixel": [130, 130], "value": 1, "axis": "x" }},
                    {{ "pixel": [30, 30], "value": 1, "axis": "y" }}
                ]
            }}"#
        ),
    )
    .unwrap();

    let json = stdout_json(Command::cargo_bin("chart-calib").unwrap().arg("calibrate").arg(&script));
    assert_eq!(json["phase"], "done");
    let origin = &json["origin"];
    assert!((origin[0].as_f64().unwrap() - 30.0).abs() <= 4.0);
    assert!((origin[1].as_f64().unwrap() - 130.0).abs() <= 4.0);
}

#[test]
fn calibrate_writes_to_out_file() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    let out = dir.path().join("result.json");
    std::fs::write(
        &script,
        r#"{ "size": [50, 50], "axes": { "x": [[0, 49], [49, 49]], "y": [[0, 49], [0, 0]] } }"#,
    )
    .unwrap();

    Command::cargo_bin("chart-calib")
        .unwrap()
        .arg("calibrate")
        .arg(&script)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["phase"], "await-points");
    assert!(json["mappings"]["x"].is_null());
}

#[test]
fn script_without_canvas_is_rejected() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    std::fs::write(&script, r#"{ "axes": "auto" }"#).unwrap();

    Command::cargo_bin("chart-calib")
        .unwrap()
        .arg("calibrate")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("either \"image\" or \"size\""));
}

#[test]
fn missing_image_fails() {
    Command::cargo_bin("chart-calib")
        .unwrap()
        .args(["detect", "does-not-exist.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
