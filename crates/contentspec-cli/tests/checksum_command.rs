use std::fs;

use assert_cmd::Command;
use contentspec::generate_checksum;
use predicates::str::contains;
use tempfile::TempDir;

const BODY: &str = "Title = Tea\nChapter: Tea\n  Tea [N, Concept]\n";

fn signed(id: i32, body: &str) -> String {
    format!("CHECKSUM = {}\nID = {id}\n{body}", generate_checksum(id, body))
}

#[test]
fn verify_walks_directories_and_flags_mismatches() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    fs::create_dir(dir.path().join("books"))?;
    fs::write(dir.path().join("books/good.contentspec"), signed(7, BODY))?;
    fs::write(
        dir.path().join("books/bad.contentspec"),
        signed(7, BODY).replace("Tea [N", "Coffee [N"),
    )?;
    fs::write(dir.path().join("books/notes.txt"), "not a spec")?;

    cli()
        .args(["checksum", "verify"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(65)
        .stdout(contains("Checksums: FAIL (2 files)"))
        .stdout(contains("[MISMATCH]"))
        .stdout(contains("bad.contentspec"))
        .stdout(contains("[OK]"));
    Ok(())
}

#[test]
fn verify_reports_missing_checksums_as_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let file = dir.path().join("plain.contentspec");
    fs::write(&file, BODY)?;

    cli()
        .args(["--json", "checksum", "verify"])
        .arg(&file)
        .assert()
        .failure()
        .code(65)
        .stdout(contains("\"status\":\"missing\""))
        .stdout(contains("\"healthy\":false"));
    Ok(())
}

#[test]
fn strip_removes_checksum_and_id_lines() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let file = dir.path().join("tea.contentspec");
    fs::write(&file, signed(42, BODY))?;

    cli()
        .args(["checksum", "strip"])
        .arg(&file)
        .assert()
        .success()
        .stdout(BODY);
    Ok(())
}

#[test]
fn unknown_subcommand_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    cli().args(["checksum", "sign"]).assert().failure().code(64);
    Ok(())
}

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_contentspec"))
}
