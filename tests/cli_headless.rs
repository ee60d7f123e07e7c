use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn write_list(dir: &Path, name: &str, lines: &[&str]) -> String {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path.to_string_lossy().into_owned()
}

fn sharepick(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sharepick"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

const STREAM: &[&str] = &["a/x.txt", "a/y.txt", "b/z.txt"];

#[test]
fn checked_folder_and_file_become_directives() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(dir.path(), "paths.txt", STREAM);

    let output = sharepick(&["--paths", &list, "--headless", "--select", "a", "--select", "b/z.txt"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output), vec!["share a/...", "share b/z.txt"]);
}

#[test]
fn selecting_the_root_shares_everything() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(dir.path(), "paths.txt", STREAM);

    let output = sharepick(&["--paths", &list, "--headless", "--select", "."]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["share ..."]);
}

#[test]
fn targets_with_spaces_are_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(dir.path(), "paths.txt", &["Ambient Music/a b.wav", "Ambient Music/c.wav", "DCC/x"]);

    let output = sharepick(&["--paths", &list, "--headless", "--select", "Ambient Music"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["share \"Ambient Music/...\""]);
}

#[test]
fn unknown_select_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(dir.path(), "paths.txt", STREAM);

    let output = sharepick(&["--paths", &list, "--headless", "--select", "c"]);
    assert!(!output.status.success());
    assert!(stdout_lines(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown path 'c'"));
}

#[test]
fn malformed_path_list_fails() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(dir.path(), "paths.txt", &["a", "a/b.txt"]);

    let output = sharepick(&["--paths", &list, "--headless"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed path"));
}

#[test]
fn existing_directives_seed_and_can_be_narrowed() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(dir.path(), "paths.txt", STREAM);
    let existing = write_list(dir.path(), "existing.txt", &["share a/...", "share gone/..."]);

    let output = sharepick(&["--paths", &list, "--existing", &existing, "--headless"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["share a/..."]);

    let output = sharepick(&[
        "--paths", &list, "--existing", &existing, "--headless", "--select", "b/z.txt",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["share a/...", "share b/z.txt"]);
}

#[test]
fn depot_prefix_is_stripped() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list(
        dir.path(),
        "paths.txt",
        &["//Game/main/a/x.txt", "//Game/main/a/y.txt", "//Game/dev/b.txt"],
    );

    let output = sharepick(&[
        "--paths", &list, "--strip-prefix", "//Game/main", "--headless", "--select", "a/x.txt",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["share a/x.txt"]);
}

#[test]
fn scanning_a_directory_feeds_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.rs"), "").unwrap();
    fs::write(dir.path().join("README"), "").unwrap();
    let root = dir.path().to_string_lossy().into_owned();

    let output = sharepick(&["--scan", &root, "--headless", "--select", "src"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["share src/..."]);
}
