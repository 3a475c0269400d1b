//! Before/after RunQA comparison mode

use predicates::prelude::*;
use runqa::energy::{Energy, RunRange};
use runqa::profile::{ProfileBin, RunProfile};
use runqa::store::ProfileStore;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn profile(name: &str, range: RunRange, skip: &[i64], outlier: Option<i64>) -> RunProfile {
    let entries = (range.low..range.low + 80)
        .filter(|run| !skip.contains(run))
        .map(|run| {
            let content = if Some(run) == outlier { 300.0 } else { 20.0 + (run % 3) as f64 };
            (run, ProfileBin::new(content, 0.4))
        });
    RunProfile::from_entries(name, range, entries)
        .unwrap()
        .with_title("Profile of refMult")
}

fn write_store(dir: &TempDir, file: &str, profiles: Vec<RunProfile>) -> PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, ProfileStore::from_profiles(profiles).to_json().unwrap()).unwrap();
    path
}

#[test]
fn test_comparison_writes_svg_per_profile() {
    let dir = TempDir::new().unwrap();
    let range = Energy::Gev14.run_range();
    let bad = range.low + 12;
    let before = write_store(
        &dir,
        "before.json",
        vec![
            profile("hEventProfile_0", range, &[], Some(bad)),
            profile("hTrackProfile_1", range, &[], None),
        ],
    );
    let after = write_store(
        &dir,
        "after.json",
        vec![
            profile("hEventProfile_0", range, &[bad], None),
            profile("hTrackProfile_1", range, &[bad], None),
        ],
    );
    let pics = dir.path().join("pics");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("runqa");
    cmd.arg(&before)
        .arg("--after-qa")
        .arg(&after)
        .arg("--pics-dir")
        .arg(&pics)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let svg = fs::read_to_string(pics.join("hEventProfile_0.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Profile of refMult (before RunQA)"));
    assert!(svg.contains("Mean = "));
    assert!(svg.contains(&format!("data-run=\"{}\"", bad)));
    assert!(pics.join("hTrackProfile_1.svg").exists());
    assert!(!pics.join("hSinPhi1.svg").exists());
}

#[test]
fn test_comparison_html_format() {
    let dir = TempDir::new().unwrap();
    let range = Energy::Gev11.run_range();
    let bad = range.low + 5;
    let before = write_store(
        &dir,
        "before.json",
        vec![profile("hCosPhi3", range, &[], Some(bad))],
    );
    let after = write_store(
        &dir,
        "after.json",
        vec![profile("hCosPhi3", range, &[bad], None)],
    );
    let pics = dir.path().join("out");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("runqa");
    cmd.arg(&before)
        .arg("-a")
        .arg(&after)
        .arg("-e")
        .arg("11GeV")
        .arg("-o")
        .arg(&pics)
        .arg("--plot-format")
        .arg("html")
        .assert()
        .success();

    let html = fs::read_to_string(pics.join("hCosPhi3.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(&format!("<li>{}: content", bad)));
}

#[test]
fn test_profile_missing_after_qa_is_skipped() {
    let dir = TempDir::new().unwrap();
    let range = Energy::Gev14.run_range();
    let before = write_store(
        &dir,
        "before.json",
        vec![
            profile("hEventProfile_0", range, &[], None),
            profile("hEventProfile_1", range, &[], None),
        ],
    );
    let after = write_store(
        &dir,
        "after.json",
        vec![profile("hEventProfile_1", range, &[], None)],
    );
    let pics = dir.path().join("pics");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("runqa");
    cmd.arg(&before)
        .arg("--after-qa")
        .arg(&after)
        .arg("--pics-dir")
        .arg(&pics)
        .assert()
        .success()
        .stderr(predicate::str::contains("no comparison plot"));

    assert!(!pics.join("hEventProfile_0.svg").exists());
    assert!(pics.join("hEventProfile_1.svg").exists());
}
