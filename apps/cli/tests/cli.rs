//! CLI integration tests, driving the `sitebuild` binary over a fixture
//! project in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Lay out a small sample project.
fn sample_project() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let write = |rel: &str, content: &str| {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    };

    write(
        "sitebuild.toml",
        r#"
[site]
name = "sample-site"
title = "Sample Site"
version = "3.1.4"
author = "Sample Author"
license = "MIT"
homepage = "https://sample.example"

[[vendor]]
source = "node_modules/lib/dist"
dest = "vendor/lib"
exclude = ["core.js"]
"#,
    );
    write(
        "src/scss/site.scss",
        "$fg: #222222;\nbody {\n  color: $fg;\n  margin: 0;\n}\n",
    );
    write("src/js/site.js", "function ready() { return true; }\nready();\n");
    write("src/img/logo.png", "png-bytes");
    write("src/index.html", "<html><body><h1>Sample</h1></body></html>");
    write("node_modules/lib/dist/lib.min.js", "var lib={};");
    write("node_modules/lib/dist/core.js", "ignore me");

    tmp
}

fn sitebuild() -> Command {
    Command::cargo_bin("sitebuild").unwrap()
}

#[test]
fn build_produces_the_expected_tree() {
    let project = sample_project();

    sitebuild()
        .current_dir(project.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build complete!"));

    let out = project.path().join("docs");
    assert!(out.join("vendor/lib/lib.min.js").exists());
    assert!(!out.join("vendor/lib/core.js").exists());
    assert!(out.join("css/site.min.css").exists());
    assert!(out.join("js/site.min.js").exists());
    assert!(out.join("img/logo.png").exists());
    assert!(out.join("index.html").exists());

    let css = std::fs::read_to_string(out.join("css/site.min.css")).unwrap();
    assert!(css.starts_with("/*!"));
    assert!(css.contains("Sample Site v3.1.4 (https://sample.example)"));
    assert!(css.contains("Sample Author"));
}

#[test]
fn default_command_is_build() {
    let project = sample_project();

    sitebuild()
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Build complete!"));

    assert!(project.path().join("docs/index.html").exists());
}

#[test]
fn rebuild_is_idempotent() {
    let project = sample_project();

    sitebuild().current_dir(project.path()).arg("build").assert().success();
    let css1 = std::fs::read(project.path().join("docs/css/site.min.css")).unwrap();
    let js1 = std::fs::read(project.path().join("docs/js/site.min.js")).unwrap();

    sitebuild().current_dir(project.path()).arg("build").assert().success();
    let css2 = std::fs::read(project.path().join("docs/css/site.min.css")).unwrap();
    let js2 = std::fs::read(project.path().join("docs/js/site.min.js")).unwrap();

    assert_eq!(css1, css2);
    assert_eq!(js1, js2);
}

#[test]
fn clean_removes_the_output_tree() {
    let project = sample_project();

    sitebuild().current_dir(project.path()).arg("build").assert().success();
    assert!(project.path().join("docs").exists());

    sitebuild()
        .current_dir(project.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    assert!(!project.path().join("docs").exists());
    assert!(project.path().join("src/scss/site.scss").exists());
}

#[test]
fn vendor_subcommand_cleans_then_copies() {
    let project = sample_project();

    sitebuild().current_dir(project.path()).arg("build").assert().success();
    assert!(project.path().join("docs/index.html").exists());

    sitebuild()
        .current_dir(project.path())
        .arg("vendor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 1 vendor files"));

    // Vendor implies a clean first, so other outputs are gone.
    assert!(project.path().join("docs/vendor/lib/lib.min.js").exists());
    assert!(!project.path().join("docs/index.html").exists());
}

#[test]
fn styles_subcommand_touches_only_styles() {
    let project = sample_project();

    sitebuild()
        .current_dir(project.path())
        .arg("styles")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 1 stylesheet(s)"));

    assert!(project.path().join("docs/css/site.min.css").exists());
    assert!(!project.path().join("docs/js").exists());
    assert!(!project.path().join("docs/index.html").exists());
}

#[test]
fn broken_stylesheet_fails_the_build() {
    let project = sample_project();
    std::fs::write(
        project.path().join("src/scss/site.scss"),
        "body { color: $undefined; }",
    )
    .unwrap();

    sitebuild()
        .current_dir(project.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("site.scss"));
}

#[test]
fn missing_vendor_source_fails_the_build() {
    let project = sample_project();
    std::fs::remove_dir_all(project.path().join("node_modules")).unwrap();

    sitebuild()
        .current_dir(project.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("vendor source not found"));
}

#[test]
fn config_show_prints_resolved_config() {
    let project = sample_project();

    sitebuild()
        .current_dir(project.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Site"))
        .stdout(predicate::str::contains("port = 3000"));
}

#[test]
fn config_init_writes_a_starter_file() {
    let tmp = tempfile::tempdir().unwrap();

    sitebuild()
        .current_dir(tmp.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config initialized"));

    let content = std::fs::read_to_string(tmp.path().join("sitebuild.toml")).unwrap();
    assert!(content.contains("vendor/bootstrap"));

    // A second init refuses to overwrite.
    sitebuild()
        .current_dir(tmp.path())
        .args(["config", "init"])
        .assert()
        .failure();
}
