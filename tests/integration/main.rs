//! Integration tests for podpatch

mod cli_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn podpatch() -> Command {
        Command::cargo_bin("podpatch").unwrap()
    }

    #[test]
    fn help_displays() {
        podpatch()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("patch and update container images"));
    }

    #[test]
    fn version_displays() {
        podpatch()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("podpatch"));
    }

    #[test]
    fn cache_path_resolves_under_xdg_cache_home() {
        let dir = TempDir::new().unwrap();
        podpatch()
            .args(["cache", "path"])
            .env("XDG_CACHE_HOME", dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("podpatch.json"));
    }

    #[test]
    fn cache_show_prints_json() {
        let dir = TempDir::new().unwrap();
        podpatch()
            .args(["cache", "show"])
            .env("XDG_CACHE_HOME", dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\"ids\""));
    }

    #[test]
    fn cache_reset_runs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("podpatch.json"),
            r#"{"ids":{"apt":["1"]},"outdated":["1"]}"#,
        )
        .unwrap();

        podpatch()
            .args(["cache", "reset"])
            .env("XDG_CACHE_HOME", dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("cache emptied"));

        let raw = std::fs::read_to_string(dir.path().join("podpatch.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["ids"].as_object().unwrap().is_empty());
    }

    #[test]
    fn ps_reports_empty_cache() {
        let dir = TempDir::new().unwrap();
        podpatch()
            .arg("ps")
            .env("XDG_CACHE_HOME", dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No images"));
    }

    #[test]
    fn update_fails_cleanly_without_an_image() {
        // Either podman is missing or the image lookup fails; both must
        // exit with a styled error rather than panic.
        podpatch()
            .args(["update", "podpatch-no-such-image:1.0", "new@sha256:abcd"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }
}
