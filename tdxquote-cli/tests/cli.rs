//! End-to-end tests driving the `tdxquote` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn tdxquote(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tdxquote"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn daily_bytes(dates: &[u32]) -> Vec<u8> {
    let mut buf = Vec::new();
    for &date in dates {
        for v in [date, 1000, 1020, 990, 1010] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&5.0e5f32.to_le_bytes());
        buf.extend_from_slice(&5_000u32.to_le_bytes());
        buf.extend_from_slice(&1003u32.to_le_bytes());
    }
    buf
}

fn vendor_file(root: &Path, exchange: &str, code: &str, bytes: &[u8]) -> PathBuf {
    let dir = root.join(exchange).join("lday");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{exchange}{code}.day"));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn decode_prints_exact_prices() {
    let tmp = TempDir::new().unwrap();
    let path = vendor_file(tmp.path(), "sh", "600000", &daily_bytes(&[20200102, 20200103]));

    let out = tdxquote(&["decode", path.to_str().unwrap()]);
    assert!(out.status.success());
    let text = stdout(&out);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("2020-01-02"));
    assert!(lines[0].contains("10.00"));
    assert!(lines[0].contains("10.20"));
}

#[test]
fn decode_json_with_limit_and_date_filter() {
    let tmp = TempDir::new().unwrap();
    let path = vendor_file(
        tmp.path(),
        "sz",
        "000001",
        &daily_bytes(&[20200102, 20200103, 20200106, 20200107]),
    );

    let out = tdxquote(&[
        "decode",
        path.to_str().unwrap(),
        "--json",
        "--from",
        "2020-01-03",
        "--limit",
        "2",
    ]);
    assert!(out.status.success());
    let rows: Vec<serde_json::Value> = stdout(&out)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2020-01-03");
    assert_eq!(rows[0]["open"], "10.00");
}

#[test]
fn decode_fails_on_bad_record_unless_skipping() {
    let tmp = TempDir::new().unwrap();
    let path = vendor_file(tmp.path(), "sh", "600001", &daily_bytes(&[20200102, 20201301, 20200106]));

    let out = tdxquote(&["decode", path.to_str().unwrap()]);
    assert!(!out.status.success());

    let out = tdxquote(&["decode", path.to_str().unwrap(), "--skip-bad-records"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).lines().count(), 2);
}

#[test]
fn decode_rejects_truncated_file() {
    let tmp = TempDir::new().unwrap();
    let path = vendor_file(tmp.path(), "sh", "600002", &[0u8; 48]);
    let out = tdxquote(&["decode", path.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a multiple"));
}

#[test]
fn raw_shows_trailing_field() {
    let tmp = TempDir::new().unwrap();
    let path = vendor_file(tmp.path(), "sh", "600000", &daily_bytes(&[20200102]));

    let out = tdxquote(&["raw", path.to_str().unwrap()]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("prev_close"));
    assert!(text.contains("1003"));

    let out = tdxquote(&["raw", path.to_str().unwrap(), "--json"]);
    let row: serde_json::Value = serde_json::from_str(stdout(&out).trim()).unwrap();
    assert_eq!(row["prev_close_cents"], 1003);
}

#[test]
fn scan_lists_files() {
    let tmp = TempDir::new().unwrap();
    vendor_file(tmp.path(), "sh", "600000", &daily_bytes(&[20200102]));
    vendor_file(tmp.path(), "sz", "000001", &daily_bytes(&[20200102, 20200103]));

    let out = tdxquote(&["scan", "--root", tmp.path().to_str().unwrap()]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("sh600000"));
    assert!(text.contains("sz000001"));
    assert!(text.contains("2 file(s)"));
}

#[test]
fn batch_exports_and_reports_failures() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("vipdoc");
    vendor_file(&root, "sh", "600000", &daily_bytes(&[20200102]));
    vendor_file(&root, "sh", "600003", &[0u8; 10]);
    let out_dir = tmp.path().join("out");
    let config = tmp.path().join("job.toml");
    std::fs::write(
        &config,
        format!(
            "vendor_root = {:?}\nexchanges = [\"sh\"]\non_error = \"skip_file\"\n[output]\ndir = {:?}\nformat = \"csv\"\n",
            root.display().to_string(),
            out_dir.display().to_string(),
        ),
    )
    .unwrap();

    let out = tdxquote(&["batch", "--config", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out_dir.join("sh600000_day.csv").exists());
    assert!(out_dir.join("sh600000_day.meta.json").exists());
    assert!(!out_dir.join("sh600003_day.csv").exists());
}
