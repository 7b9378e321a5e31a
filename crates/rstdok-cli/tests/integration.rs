//! Integration tests for rstdok CLI
//!
//! These tests drive the build and check commands over source trees in
//! temporary directories.

use std::fs;
use std::path::Path;

use rstdok_cli::{build_command, check_command, load_settings, BuildArgs, OutputFormat, SourceFormat};
use tempfile::TempDir;

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
}

fn create_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "index.rst",
        "Project\n=======\n\n.. toctree::\n\n   intro\n",
    );
    write(
        dir.path(),
        "intro.rst",
        "Intro\n=====\n\n.. note::\n\n   Read this first.\n\n.. code-block:: rust\n\n   fn main() {}\n",
    );
    write(
        dir.path(),
        "rstdok.toml",
        "[project]\ntitle = \"Sample\"\nversion = \"0.3\"\n",
    );
    dir
}

#[test]
fn test_build_writes_html() {
    let source = create_project();
    let output = TempDir::new().unwrap();

    let outcome = build_command(&BuildArgs::new(source.path(), output.path())).unwrap();
    assert_eq!(outcome.written, vec!["index.html", "intro.html"]);
    assert_eq!(outcome.problems, 0);

    let intro = fs::read_to_string(output.path().join("intro.html")).unwrap();
    assert!(intro.contains("<title>Intro - Sample</title>"));
    assert!(intro.contains("Read this first."));
    assert!(intro.contains("fn main() {}"));
    let index = fs::read_to_string(output.path().join("index.html")).unwrap();
    assert!(index.contains("href=\"intro.html\""));
}

#[test]
fn test_build_sequential_markdown() {
    let source = TempDir::new().unwrap();
    write(source.path(), "index.md", "# Home\n\nSee [the guide](guide.md).\n");
    write(source.path(), "guide.md", "# Guide\n\nText.\n");
    let output = TempDir::new().unwrap();

    let mut args = BuildArgs::new(source.path(), output.path());
    args.input_format = Some(SourceFormat::Md);
    args.sequential = true;
    let outcome = build_command(&args).unwrap();
    assert_eq!(outcome.documents.len(), 2);

    let index = fs::read_to_string(output.path().join("index.html")).unwrap();
    assert!(index.contains("href=\"guide.html\""));
}

#[test]
fn test_fail_on_log_fails_the_build() {
    let source = TempDir::new().unwrap();
    write(source.path(), "index.rst", "Home\n====\n\nSee :ref:`missing`.\n");
    let output = TempDir::new().unwrap();

    let mut args = BuildArgs::new(source.path(), output.path());
    assert!(build_command(&args).is_ok());

    args.fail_on_log = true;
    let err = build_command(&args).unwrap_err();
    assert!(format!("{:#}", err).contains("problem(s) were logged"));
}

#[test]
fn test_check_reports_diagnostics() {
    let source = create_project();
    write(source.path(), "lost.rst", "Lost\n====\n\n.. frobnicate::\n");

    let diagnostics =
        check_command(source.path(), None, None, OutputFormat::Json).unwrap();
    let codes: Vec<&str> = diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
    assert!(codes.contains(&"RST001"));
    assert!(codes.contains(&"RST008"));

    let json = serde_json::to_value(&diagnostics).unwrap();
    assert!(json.as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn test_settings_lookup() {
    let source = create_project();
    let settings = load_settings(source.path(), None).unwrap();
    assert_eq!(settings.project.title.as_deref(), Some("Sample"));

    let missing = source.path().join("nope.toml");
    assert!(load_settings(source.path(), Some(missing.as_path())).is_err());

    let empty = TempDir::new().unwrap();
    let defaults = load_settings(empty.path(), None).unwrap();
    assert_eq!(defaults.build.output_extension, "html");
}

#[test]
fn test_missing_source_directory() {
    let output = TempDir::new().unwrap();
    let missing = output.path().join("does-not-exist");
    assert!(build_command(&BuildArgs::new(&missing, output.path())).is_err());
}
