use assert_cmd::Command;

#[test]
fn help_lists_client_commands() {
    let output = Command::cargo_bin("catalog")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "list", "add", "update"] {
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
}

#[test]
fn malformed_base_url_fails_before_any_request() {
    Command::cargo_bin("catalog")
        .unwrap()
        .args(["--base-url", "localhost8800", "list"])
        .assert()
        .failure();
}

#[test]
fn add_without_title_against_dead_server_fails() {
    Command::cargo_bin("catalog")
        .unwrap()
        .args(["--base-url", "http://127.0.0.1:1", "add", "--cover", "x.jpg"])
        .assert()
        .failure();
}
