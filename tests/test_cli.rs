mod fixtures;

use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn write_request(dir: &Path, name: &str, raw: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, raw).unwrap();
    path
}

#[test]
fn it_prints_a_decoded_request_as_json() {
    let d = tempdir().unwrap();
    let input = write_request(d.path(), "get_class.http", &sample_get_class_request());

    let mut cmd = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    cmd.arg(input.to_str().unwrap());

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["header"]["message_id"], "1001");
    assert_eq!(json["operation"]["operation"], "GetClass");
    assert_eq!(json["operation"]["class_name"], "CIM_Foo");
}

#[test]
fn it_prints_the_rejection_and_fails() {
    let d = tempdir().unwrap();
    let raw = post(
        &operation_headers("GetInstance", "root/cimv2"),
        &intrinsic_body("GetClass", &iparam("ClassName", &class_name("CIM_Foo"))),
    );
    let input = write_request(d.path(), "mismatch.http", &raw);

    let mut cmd = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    cmd.arg(input.to_str().unwrap());

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("400 Bad Request"))
        .stdout(predicate::str::contains("CIMError: header-mismatch"));
}

#[test]
fn it_honours_max_elements() {
    let d = tempdir().unwrap();
    let input = write_request(d.path(), "get_class.http", &sample_get_class_request());

    let mut cmd = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    cmd.args(["--max-elements", "2", input.to_str().unwrap()]);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("request-with-too-many-elements"));
}

#[test]
fn it_supports_stdin_input_with_dash() {
    let d = tempdir().unwrap();
    let input = write_request(d.path(), "get_class.http", &sample_get_class_request());

    let mut from_file = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    from_file.args(["-o", "debug", input.to_str().unwrap()]);
    let out_file = from_file.output().unwrap();

    let mut from_stdin = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    from_stdin.args(["-o", "debug", "-"]);
    from_stdin.stdin(File::open(&input).unwrap());
    let out_stdin = from_stdin.output().unwrap();

    assert!(out_stdin.status.success(), "expected stdin-input run to succeed");
    assert_eq!(
        out_stdin.stdout, out_file.stdout,
        "stdin and file input should produce identical output"
    );
    assert!(String::from_utf8_lossy(&out_stdin.stdout).contains("GetClass"));
}

#[test]
fn it_respects_file_output() {
    let d = tempdir().unwrap();
    let input = write_request(d.path(), "get_class.http", &sample_get_class_request());
    let f = d.path().join("decoded.json");

    let mut cmd = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    cmd.args(["-f", &f.to_string_lossy(), input.to_str().unwrap()]);

    assert!(
        cmd.output().unwrap().stdout.is_empty(),
        "Expected output to be printed to file, but was printed to stdout"
    );
    assert!(fs::read_to_string(&f).unwrap().contains("CIM_Foo"));
}

#[test]
fn test_it_refuses_to_overwrite_directory() {
    let d = tempdir().unwrap();
    let input = write_request(d.path(), "get_class.http", &sample_get_class_request());

    let mut cmd = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    cmd.args(["-f", &d.path().to_string_lossy(), input.to_str().unwrap()]);

    cmd.assert().failure().code(1);
}

#[test]
fn test_expired_password_flag() {
    let d = tempdir().unwrap();
    let input = write_request(d.path(), "get_class.http", &sample_get_class_request());

    let mut cmd = Command::new(assert_cmd::cargo_bin!("cimxml_dump"));
    cmd.args(["--user", "alice", "--expired-password", input.to_str().unwrap()]);

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains(r#"<ERROR CODE="2""#));
}
