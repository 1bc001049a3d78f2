use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg("tests/fixtures/commands.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("user,balance_local,balance_z"))
        // Student 1 converted 20000 and spent the 20 Z
        .stdout(predicate::str::contains("1,10000.00,0.00"))
        // Teacher paid the 10 Z fee once, earned 18 and withdrew 5
        .stdout(predicate::str::contains("2,4750.00,13.00"))
        // Student 3 could not afford the part after two top-ups
        .stdout(predicate::str::contains("3,12000.00,0.00"))
        // The overflowing deposit was skipped, not fatal
        .stdout(predicate::str::contains("4,50000000000000000000000000000"))
        .stdout(predicate::str::contains("\n9,").not());

    Ok(())
}

#[test]
fn test_cli_rejected_rows_are_logged() {
    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg("tests/fixtures/commands.csv");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("command rejected"))
        .stderr(predicate::str::contains("before paying the enrollment fee"))
        .stderr(predicate::str::contains("User 2 is already enrolled"))
        .stderr(predicate::str::contains("more than 2 decimal places"))
        .stderr(predicate::str::contains("balance is out of range"))
        .stderr(predicate::str::contains("Insufficient local funds"))
        .stderr(predicate::str::contains("User 9 not found"));
}

#[test]
fn test_cli_ledger_output() {
    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg("tests/fixtures/commands.csv").arg("--ledger");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "id,user,type,amount_local,amount_z,description",
        ))
        .stdout(predicate::str::contains(
            "4,1,deposit,30000.00,,Manual deposit (simulation)",
        ))
        .stdout(predicate::str::contains(
            "5,1,convert_to_z,-20000.00,20.00,Converted to Z coins",
        ))
        .stdout(predicate::str::contains("Top up via Payme"))
        .stdout(predicate::str::contains(
            "3,2,teacher_enrollment_fee,,-10.00,",
        ))
        .stdout(predicate::str::contains("teacher_enrollment_fee").count(1));
}

#[test]
fn test_cli_config_file_overrides_rate() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[ledger]").unwrap();
    writeln!(config, "exchange_rate = \"500\"").unwrap();

    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "op, user, target, amount, detail").unwrap();
    writeln!(csv, "signup, 1, , , student").unwrap();
    writeln!(csv, "deposit, 1, , 1000,").unwrap();
    writeln!(csv, "convert, 1, , 1000,").unwrap();

    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg(csv.path()).arg("--config").arg(config.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,0.00,2.00"));
}

#[test]
fn test_cli_invalid_config_fails() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[ledger]").unwrap();
    writeln!(config, "commission_rate = \"1.5\"").unwrap();

    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg("tests/fixtures/commands.csv")
        .arg("--config")
        .arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("commission_rate"));
}

#[test]
fn test_cli_json_logs() {
    let mut cmd = Command::new(cargo_bin!("nok-wallet"));
    cmd.arg("tests/fixtures/commands.csv")
        .arg("--log-format")
        .arg("json");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"WARN\""));
}
