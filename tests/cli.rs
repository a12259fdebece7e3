use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn stockwise() -> Command {
    let mut cmd = Command::cargo_bin("stockwise").unwrap();
    cmd.env_remove("STOCKWISE_CONFIG");
    cmd
}

#[test]
fn products_lists_catalog() {
    stockwise()
        .arg("products")
        .assert()
        .success()
        .stdout(predicate::str::contains("milk").and(predicate::str::contains("detergent")));
}

#[test]
fn forecast_prints_advice() {
    let mut csv = NamedTempFile::new().unwrap();
    writeln!(csv, "Store,Date,Weekly_Sales,Holiday_Flag").unwrap();
    for week in 0..12 {
        writeln!(csv, "5,2010-{:02}-{:02},{},0", 1 + week / 4, 1 + 7 * (week % 4), 700 + 10 * week)
            .unwrap();
    }
    let out = tempdir().unwrap();

    stockwise()
        .args(["forecast", "--product", "Detergent", "--days", "10", "--stock", "0"])
        .arg("--input")
        .arg(csv.path())
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Inventory Advice: You need to reorder"))
        .stdout(predicate::str::contains("ACCURACY:"));

    assert!(out.path().join("forecast_with_history.svg").exists());
}

#[test]
fn unknown_product_fails() {
    let mut csv = NamedTempFile::new().unwrap();
    writeln!(csv, "Store,Date,Weekly_Sales\n1,05-02-2010,10.0").unwrap();

    stockwise()
        .args(["forecast", "--product", "soap"])
        .arg("--input")
        .arg(csv.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown product 'soap'"));
}

#[test]
fn bad_config_fails() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[plot]\nwidth = 0").unwrap();

    stockwise()
        .args(["forecast", "--input", "unused.csv", "--product", "milk"])
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}
