//! Command-line behaviour over plain-text transcripts.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ORDER: &str = "\
PURCHASE ORDER 4471
Line Vendor Product Number Description EAN No Qty Unit Cost Line Cost
1 AA-100 EA 1 2 5.00 10.00
Red Widget
EAN: 5000000000001
2 BB-200 EA 1 3 4.00 12.00
Green Widget
Total 22.00
";

/// Command isolated from any user configuration file.
fn poconv(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("poconv").unwrap();
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn convert_prints_csv() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", ORDER);

    poconv(dir.path())
        .args(["convert", &input])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Line,Vendor Product Number,Description,EAN No,Qty,Unit Cost,Line Cost\n",
        ))
        .stdout(predicate::str::contains("1,AA-100,Red Widget,5000000000001,2,5.00,10.00"))
        .stdout(predicate::str::contains("2,BB-200,Green Widget,,3,4.00,12.00"));
}

#[test]
fn convert_writes_json_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", ORDER);
    let output = dir.path().join("items.json");

    poconv(dir.path())
        .args(["convert", &input, "-f", "json", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 items"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["sku"], "AA-100");
    assert_eq!(items[1]["line_cost"], "12.00");
}

#[test]
fn convert_text_table_has_total() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", ORDER);

    poconv(dir.path())
        .args(["convert", &input, "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Items: 2"))
        .stdout(predicate::str::contains("Total line cost: 22.00"));
}

#[test]
fn ocr_text_flag_corrects_confusions() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "scan.txt", "7 SKU-123 EA 1 24 l8.44 442.56\nBlue Widget\n");

    poconv(dir.path())
        .args(["convert", &input])
        .assert()
        .failure();

    poconv(dir.path())
        .args(["convert", &input, "--ocr-text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7,SKU-123,Blue Widget,,24,18.44,442.56"));
}

#[test]
fn no_items_reports_transcript() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "note.txt", "Delivery note\nTotal 442.56\n");

    poconv(dir.path())
        .args(["convert", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Delivery note"))
        .stderr(predicate::str::contains("no line items matched in 2 extracted lines"));
}

#[test]
fn empty_text_is_no_content() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "blank.txt", "\n\n");

    poconv(dir.path())
        .args(["convert", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no content extracted").or(predicate::str::contains("No text")));
}

#[test]
fn unsupported_extension_fails() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.docx", ORDER);

    poconv(dir.path())
        .args(["convert", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn lines_marks_anchors() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "rows.txt",
        "1 AA-100 2 5.00 10.00\n1A B-2 3.00 6.00\n2 BB-200 3 4.00 12.00\n",
    );

    poconv(dir.path())
        .args(["lines", &input])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\*\s+0\s+1 AA-100").unwrap())
        .stdout(predicate::str::is_match(r"x\s+1\s+1A B-2").unwrap())
        .stdout(predicate::str::contains("2 item rows, 1 dropped"));
}

#[test]
fn config_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("poconv.json");
    let config = config.to_str().unwrap();

    poconv(dir.path())
        .args(["-c", config, "config", "init"])
        .assert()
        .success();

    poconv(dir.path())
        .args(["-c", config, "config", "set", "reconstruct.lookahead_window", "1"])
        .assert()
        .success();

    poconv(dir.path())
        .args(["-c", config, "config", "get", "reconstruct.lookahead_window"])
        .assert()
        .success()
        .stdout("1\n");

    poconv(dir.path())
        .args(["-c", config, "config", "set", "reconstruct.lookahead_window", "99"])
        .assert()
        .failure();

    poconv(dir.path())
        .args(["-c", config, "config", "set", "reconstruct.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));

    // A one-line window no longer reaches the EAN two lines below the row
    let input = write(dir.path(), "order.txt", ORDER);
    poconv(dir.path())
        .args(["-c", config, "convert", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,AA-100,Red Widget,,2,5.00,10.00"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).unwrap();
    write(&inputs, "a.txt", ORDER);
    write(&inputs, "b.txt", "Delivery note\n");
    write(&inputs, "c.docx", ORDER);
    let out = dir.path().join("out");
    let pattern = format!("{}/*", inputs.display());

    poconv(dir.path())
        .args(["batch", &pattern, "--summary", "--continue-on-error", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let csv = fs::read_to_string(out.join("a.csv")).unwrap();
    assert!(csv.contains("1,AA-100,Red Widget,5000000000001,2,5.00,10.00"));
    assert!(!out.join("b.csv").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,items,line_cost_total"));
    assert!(summary.contains("a.txt,ok,2,22.00"));
    assert!(summary.contains("b.txt,no_items,0,0"));
}

#[test]
fn batch_stops_on_first_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.txt", "Delivery note\n");
    let pattern = format!("{}/*.txt", dir.path().display());

    poconv(dir.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}
