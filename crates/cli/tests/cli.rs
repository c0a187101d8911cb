use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf-cli").unwrap();
    cmd.env("BOOKSHELF_DATABASE__URL", "sqlite::memory:")
        .env("BOOKSHELF_TELEMETRY__FILTER", "off")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = cli().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in ["serve", "migrate", "routes"] {
        assert!(stdout.contains(name), "missing {name} in help");
    }
}

#[test]
fn routes_prints_book_endpoints() {
    let output = cli().arg("routes").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("/api/books"));
    assert!(stdout.contains("/api/books/{id}"));
    assert!(stdout.contains("DELETE"));
}

#[test]
fn migrate_reports_applied_count() {
    let output = cli().arg("migrate").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("applied 2 migration(s)"));
}

#[test]
fn unknown_environment_fails() {
    let output = cli()
        .arg("routes")
        .env("BOOKSHELF_ENV", "moon")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
