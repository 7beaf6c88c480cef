//! Integration tests for the `pic14` CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use ihex as _;
use pic14_core as _;
use pic14_tools::read_hex;
use thiserror as _;
use tracing as _;

const COUNTDOWN: &str = "\
; sixteen trips round a decrement loop
COUNT   EQU     0x20
        movlw   H'10'
        movwf   COUNT
loop    decfsz  COUNT, F
        bra     loop
        sleep
";

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("pic14")
}

fn create_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn pic14(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .output()
        .expect("failed to run pic14")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn asm_writes_a_hex_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "count.asm", COUNTDOWN);
    let output = temp_dir.path().join("count.hex");

    let result = pic14(&["asm", source.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    assert!(result.status.success());

    let image = read_hex(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(image.len(), 5);
    assert_eq!(image.get(0), Some(0x3010));
    assert_eq!(image.get(4), Some(0x0063));
}

#[test]
fn asm_defaults_output_next_to_source() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "nop.asm", "  nop\n");

    let result = pic14(&["asm", source.to_str().unwrap()]);
    assert!(result.status.success());
    assert!(temp_dir.path().join("nop.hex").exists());
}

#[test]
fn asm_uses_include_names() {
    let temp_dir = tempfile::tempdir().unwrap();
    let include = create_temp_file(temp_dir.path(), "dev.inc", "LATA EQU H'010C'\n");
    let source = create_temp_file(temp_dir.path(), "lat.asm", "  movwf LATA\n");
    let output = temp_dir.path().join("lat.hex");

    let result = pic14(&[
        "asm",
        source.to_str().unwrap(),
        "--inc",
        include.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(result.status.success());
    let image = read_hex(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(image.get(0), Some(0x008C));
}

#[test]
fn asm_reports_the_failing_line() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "bad.asm", "  nop\n  goto nowhere\n");

    let result = pic14(&["asm", source.to_str().unwrap()]);
    assert_eq!(result.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("line 2"));
    assert!(stderr.contains("NOWHERE"));
}

#[test]
fn dis_lists_each_word() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "count.asm", COUNTDOWN);
    let image = temp_dir.path().join("count.hex");
    assert!(pic14(&["asm", source.to_str().unwrap(), "-o", image.to_str().unwrap()])
        .status
        .success());

    let result = pic14(&["dis", image.to_str().unwrap()]);
    assert!(result.status.success());
    let listing = stdout(&result);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(
        lines,
        vec![
            "0000: 3010  MOVLW 0x10",
            "0001: 00A0  MOVWF 0x20",
            "0002: 0BA0  DECFSZ 0x20, F",
            "0003: 33FE  BRA 0x002",
            "0004: 0063  SLEEP",
        ]
    );
}

#[test]
fn run_source_until_sleep() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "count.asm", COUNTDOWN);

    let result = pic14(&["run", source.to_str().unwrap()]);
    assert!(result.status.success());
    let text = stdout(&result);
    assert!(text.contains("Stopped at sleep after 34 steps (50 cycles)"));
    assert!(text.contains("PC=0005"));
}

#[test]
fn run_trace_prints_retired_instructions() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "count.asm", COUNTDOWN);

    let result = pic14(&["run", source.to_str().unwrap(), "--trace", "--steps", "3"]);
    assert!(result.status.success());
    let text = stdout(&result);
    assert!(text.contains("0000  MOVLW   1cy"));
    assert!(text.contains("0002  DECFSZ  1cy"));
    assert!(text.contains("Stopped at step limit after 3 steps"));
}

#[test]
fn run_reports_faults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "bad.asm", "  nop\n  dw 0x0005\n");

    let result = pic14(&["run", source.to_str().unwrap()]);
    assert_eq!(result.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&result.stderr).contains("0x0005"));
}

#[test]
fn unknown_command_is_a_usage_error() {
    let result = pic14(&["frobnicate"]);
    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn missing_input_file_is_an_io_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("absent.asm");
    let result = pic14(&["asm", missing.to_str().unwrap()]);
    assert_eq!(result.status.code(), Some(3));
}
