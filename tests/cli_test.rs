//! Integration tests for the interactive CLI.
//!
//! These run the actual binary against a temporary data directory, drive it
//! through stdin and check both the console output and the ledger files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn seed(dir: &Path, inventory: &str) {
    fs::write(dir.join("inventory.txt"), inventory).unwrap();
}

/// Run the binary on `dir` with `script` as stdin
fn run_pos(dir: &Path, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("pos-ledger").unwrap();
    cmd.arg(dir).write_stdin(script).assert()
}

#[test]
fn test_exit_from_main_menu() {
    let dir = tempfile::tempdir().unwrap();
    run_pos(dir.path(), "4\n")
        .success()
        .stdout(predicate::str::contains("Main Menu"))
        .stdout(predicate::str::contains("Exiting system. Goodbye!"));
}

#[test]
fn test_end_of_input_is_a_clean_exit() {
    let dir = tempfile::tempdir().unwrap();
    run_pos(dir.path(), "").success();
}

#[test]
fn test_invalid_menu_choice() {
    let dir = tempfile::tempdir().unwrap();
    run_pos(dir.path(), "9\nx\n4\n")
        .success()
        .stdout(predicate::str::contains(
            "Invalid choice. Please enter a number between 1 and 4.",
        ))
        .stdout(predicate::str::contains("Invalid input. Please enter a number."));
}

#[test]
fn test_add_product_writes_inventory() {
    let dir = tempfile::tempdir().unwrap();
    run_pos(dir.path(), "2\n1\nOat Milk\n12\n3.49\n6\n4\n")
        .success()
        .stdout(predicate::str::contains("Product added successfully."));

    let inventory = fs::read_to_string(dir.path().join("inventory.txt")).unwrap();
    let line = inventory.lines().next().unwrap();
    let (id, rest) = line.split_once(' ').unwrap();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(rest, "Oat Milk|12 3.49");
}

#[test]
fn test_view_inventory_shows_status() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100001 Milk|0 2.00\n200002 Eggs|5 3.00\n300003 Rice|150 1.00\n");
    run_pos(dir.path(), "2\n2\n6\n4\n")
        .success()
        .stdout(predicate::str::contains("Out of Stock"))
        .stdout(predicate::str::contains("Low Stock"))
        .stdout(predicate::str::contains("Full"));
}

#[test]
fn test_complete_sale() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100001 Apple Juice 1L|50 10.00\n");

    run_pos(dir.path(), "1\n1\n1\n100001\n5\n3\nAda\n50\n4\n")
        .success()
        .stdout(predicate::str::contains("FINAL RECEIPT"))
        .stdout(predicate::str::contains("Transaction completed. Receipt saved."));

    assert_eq!(
        fs::read_to_string(dir.path().join("inventory.txt")).unwrap(),
        "100001 Apple Juice 1L|45 10.00\n"
    );
    let history = fs::read_to_string(dir.path().join("sales_history.txt")).unwrap();
    assert!(history.contains("Customer Name: Ada"));
    assert!(history.contains("100001|Apple Juice 1L x5 @ $10.00 = $50.00"));
    assert!(history.contains("Total Amount: $50.00"));
    assert!(history.contains("Change: $0.00"));
}

#[test]
fn test_interrupted_sale_restores_stock() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100001 Milk|10 2.00\n");

    run_pos(dir.path(), "1\n1\n1\n100001\n4\n").success();

    assert_eq!(
        fs::read_to_string(dir.path().join("inventory.txt")).unwrap(),
        "100001 Milk|10 2.00\n"
    );
    assert!(!dir.path().join("sales_history.txt").exists());
}

#[test]
fn test_admin_requires_key() {
    let dir = tempfile::tempdir().unwrap();
    run_pos(dir.path(), "3\nletmein\n4\n")
        .success()
        .stdout(predicate::str::contains("Invalid Admin Key."))
        .stdout(predicate::str::contains("Admin Menu").not());
}

#[test]
fn test_admin_report_after_sales() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100001 Milk|50 10.00\n");

    let script = "1\n1\n1\n100001\n2\n3\nAda\n20\n\
                  1\n1\n1\n100001\n3\n3\nBob\n30\n\
                  3\nadmin123\n1\n4\n4\n";
    run_pos(dir.path(), script)
        .success()
        .stdout(predicate::str::contains("Aggregated Sales Report"))
        .stdout(predicate::str::contains("Grand Total Revenue: $50.00"));
}

#[test]
fn test_admin_exports_report_csv() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100001 Milk|50 10.00\n200002 Eggs|20 2.50\n");

    let script = "1\n1\n1\n200002\n4\n1\n1\n100001\n1\n3\nAda\n20\n\
                  3\nadmin123\n2\n4\n4\n";
    run_pos(dir.path(), script)
        .success()
        .stdout(predicate::str::contains("Sales report exported to"));

    assert_eq!(
        fs::read_to_string(dir.path().join("sales_report.csv")).unwrap(),
        "product_id,name,quantity_sold,unit_price,subtotal\n\
         100001,Milk,1,10.00,10.00\n\
         200002,Eggs,4,2.50,10.00\n"
    );
}

#[test]
fn test_non_utf8_input_does_not_end_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("pos-ledger").unwrap();
    cmd.arg(dir.path())
        .write_stdin(&b"9\n\xff\xfe\n4\n"[..])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid input. Please enter a number."))
        .stdout(predicate::str::contains("Exiting system. Goodbye!"));
}

#[test]
fn test_malformed_lines_are_logged_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100001 Milk|10 2.00\n100002 Broken\n");

    let mut cmd = Command::cargo_bin("pos-ledger").unwrap();
    cmd.arg(dir.path())
        .env("RUST_LOG", "warn")
        .write_stdin("2\n2\n6\n4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Milk"))
        .stderr(predicate::str::contains("dropped 1 malformed line(s)"));
}

#[test]
fn test_malformed_lines_are_silent_by_default() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "100002 Broken\n");

    let mut cmd = Command::cargo_bin("pos-ledger").unwrap();
    cmd.arg(dir.path())
        .env_remove("RUST_LOG")
        .write_stdin("4\n")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_unreadable_data_dir_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the inventory file should be cannot be read.
    fs::create_dir(dir.path().join("inventory.txt")).unwrap();

    run_pos(dir.path(), "4\n")
        .failure()
        .stderr(predicate::str::contains("Error"));
}
