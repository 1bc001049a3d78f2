use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn deposit_csv() -> tempfile::NamedTempFile {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "op, user, target, amount, detail").unwrap();
    writeln!(csv, "signup, 1, , , student").unwrap();
    writeln!(csv, "deposit, 1, , 100.0,").unwrap();
    csv
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let csv = deposit_csv();

    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg(csv.path()).arg("--db-path").arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "'storage-rocksdb' feature is not enabled. Falling back to in-memory storage.",
        ))
        .stdout(predicate::str::contains("1,100.00,0.00"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let csv = deposit_csv();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg(csv.path()).arg("--db-path").arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
