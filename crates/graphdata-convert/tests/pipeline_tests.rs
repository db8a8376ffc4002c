//! End-to-end conversion runs over temporary directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use graphdata_convert::{
    output_path, run, ConvertConfig, MemoryReporter, RunSummary, WalkError,
};
use rstest::rstest;
use tempfile::TempDir;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }
    dir
}

fn convert(root: &Path) -> (RunSummary, MemoryReporter) {
    let mut reporter = MemoryReporter::new();
    let summary = run(&ConvertConfig::new(root), &mut reporter).unwrap();
    (summary, reporter)
}

/// Every `.json` file below `root`, relative and sorted.
fn json_files(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "json") {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                found.push(rel);
            }
        }
    }
    found.sort();
    found
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join(name)).unwrap()
}

// ══════════════════════════════════════════════════════════════════════════════
// Runs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mixed_tree() {
    let dir = tree(&[
        ("a.js", "var graphData = [[new Date(2004,7,1), 0.02]];"),
        ("b.js", "var other = 1;"),
        ("c.txt", "var graphData = 1;"),
        ("sub/d.js", "var graphData = {\"k\": 2};"),
    ]);
    let root = dir.path();
    let (summary, reporter) = convert(root);

    assert_eq!(json_files(root), vec!["a.json", "sub/d.json"]);
    assert_eq!(
        read(root, "a.json"),
        "[\n    [\n        \"2004-08-01T00:00:00.000Z\",\n        0.02\n    ]\n]"
    );
    assert_eq!(read(root, "sub/d.json"), "{\n    \"k\": 2\n}");
    assert_eq!(read(root, "c.txt"), "var graphData = 1;");

    assert_eq!(
        summary,
        RunSummary { scripts: 3, written: 2, absent: 1, failed_writes: 0 }
    );
    assert_eq!(
        reporter.warnings(),
        vec![format!("No graphData found in {}", root.join("b.js").display())]
    );
    assert!(reporter.errors().is_empty());
    let infos = reporter.infos();
    assert_eq!(infos.len(), 3);
    assert_eq!(infos[0], format!("Successfully saved {}", root.join("a.json").display()));
    assert!(infos[2].starts_with("Processing complete"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let source = concat!(
        "var graphData = { series: [1.5, -0, 1e21, NaN], ",
        "when: new Date(Date.UTC(2020, 0, 1)) };",
    );
    let dir = tree(&[("chart.js", source)]);
    let root = dir.path();
    convert(root);
    let first = fs::read(root.join("chart.json")).unwrap();
    convert(root);
    let second = fs::read(root.join("chart.json")).unwrap();
    assert_eq!(first, second);
    assert!(!first.ends_with(b"\n"));
}

#[test]
fn test_output_parses_back() {
    let dir = tree(&[("data.js", r#"graphData = {"a": 1, "b": [1, 2, 3], c: {d: null}};"#)]);
    let root = dir.path();
    convert(root);
    let parsed: serde_json::Value = serde_json::from_str(&read(root, "data.json")).unwrap();
    assert_eq!(parsed, serde_json::json!({"a": 1, "b": [1, 2, 3], "c": {"d": null}}));
}

#[test]
fn test_existing_output_is_overwritten() {
    let dir = tree(&[("data.js", "var graphData = 1;"), ("data.json", "stale")]);
    let root = dir.path();
    convert(root);
    assert_eq!(read(root, "data.json"), "1");
}

#[test]
fn test_falsy_values_are_written() {
    let dir = tree(&[
        ("zero.js", "var graphData = 0;"),
        ("null.js", "var graphData = null;"),
        ("empty.js", "var graphData = {};"),
        ("blank.js", "var graphData = '';"),
    ]);
    let root = dir.path();
    let (summary, _) = convert(root);
    assert_eq!(summary.written, 4);
    assert_eq!(read(root, "zero.json"), "0");
    assert_eq!(read(root, "null.json"), "null");
    assert_eq!(read(root, "empty.json"), "{}");
    assert_eq!(read(root, "blank.json"), "\"\"");
}

#[test]
fn test_directory_named_like_a_script() {
    let dir = tree(&[("js.js/widget.js", "var graphData = [1];")]);
    let root = dir.path();
    fs::create_dir(root.join("js.json")).unwrap();
    let (summary, reporter) = convert(root);

    assert_eq!(summary.written, 1);
    assert_eq!(read(root, "js.json/widget.js"), "[\n    1\n]");
    assert!(!root.join("js.js/widget.json").exists());
    assert_eq!(
        reporter.infos()[0],
        format!("Successfully saved {}", root.join("js.json/widget.js").display())
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Per-file failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_syntax_error_does_not_stop_the_run() {
    let dir = tree(&[
        ("a.js", "var graphData = [1, 2"),
        ("b.js", "var graphData = 'ok';"),
    ]);
    let root = dir.path();
    let (summary, reporter) = convert(root);

    assert_eq!(json_files(root), vec!["b.json"]);
    assert_eq!(summary.absent, 1);
    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    let path = root.join("a.js");
    assert!(errors[0].starts_with(&format!("Error evaluating {}: SyntaxError", path.display())));
}

#[test]
fn test_runtime_error_writes_nothing() {
    let dir = tree(&[("a.js", "var graphData = 1; null.x = 2;")]);
    let root = dir.path();
    let (summary, reporter) = convert(root);
    assert!(json_files(root).is_empty());
    assert_eq!(summary.absent, 1);
    let expected = "TypeError: Cannot set properties of null (setting 'x')";
    assert!(reporter.errors()[0].contains(expected));
}

#[test]
fn test_data_built_through_aliases() {
    let source = concat!(
        "var graphData = {};\n",
        "var series = [];\n",
        "graphData.series = series;\n",
        "series[0] = [new Date(2004, 7, 1), 0.2817];\n",
    );
    let dir = tree(&[("chart.js", source)]);
    let root = dir.path();
    convert(root);
    assert_eq!(
        read(root, "chart.json"),
        "{\n    \"series\": [\n        [\n            \"2004-08-01T00:00:00.000Z\",\n            \
         0.2817\n        ]\n    ]\n}"
    );
}

#[test]
fn test_lexical_binding_is_not_extracted() {
    let dir = tree(&[("a.js", "const graphData = [1];"), ("b.js", "var graphData = [2];")]);
    let root = dir.path();
    let (summary, reporter) = convert(root);
    assert_eq!(json_files(root), vec!["b.json"]);
    assert_eq!(summary.absent, 1);
    assert_eq!(
        reporter.warnings(),
        vec![format!("No graphData found in {}", root.join("a.js").display())]
    );
}

#[test]
fn test_long_concatenation_chain() {
    let source = format!("var graphData = 'ab'{};", " + 'ab'".repeat(199));
    let dir = tree(&[("chain.js", source.as_str())]);
    let root = dir.path();
    convert(root);
    assert_eq!(read(root, "chain.json"), format!("\"{}\"", "ab".repeat(200)));
}

#[test]
fn test_circular_value_fails_to_save() {
    let dir = tree(&[("a.js", "var graphData = {}; graphData.self = graphData;")]);
    let root = dir.path();
    let (summary, reporter) = convert(root);
    assert!(json_files(root).is_empty());
    assert_eq!(summary.failed_writes, 1);
    assert!(reporter.errors()[0].ends_with(": Converting circular structure to JSON"));
}

#[test]
fn test_invalid_utf8_is_a_read_error() {
    let dir = tree(&[("good.js", "var graphData = 1;")]);
    let root = dir.path();
    fs::write(root.join("bad.js"), b"var graphData = '\xff';").unwrap();
    let (summary, reporter) = convert(root);

    assert_eq!(json_files(root), vec!["good.json"]);
    assert_eq!(summary.absent, 1);
    let expected = format!("Error reading {}", root.join("bad.js").display());
    assert!(reporter.errors()[0].starts_with(&expected));
}

#[test]
fn test_undefined_binding_fails_to_save() {
    let dir = tree(&[("a.js", "var graphData;")]);
    let root = dir.path();
    let (summary, reporter) = convert(root);

    assert!(json_files(root).is_empty());
    assert_eq!(summary.failed_writes, 1);
    let expected = format!("Error saving {}", root.join("a.json").display());
    assert!(reporter.errors()[0].starts_with(&expected));
    assert!(reporter.warnings().is_empty());
}

#[test]
fn test_scripts_are_isolated() {
    let dir = tree(&[
        ("a.js", "var shared = 41; var graphData = shared;"),
        ("b.js", "var graphData = shared;"),
    ]);
    let root = dir.path();
    let (_, reporter) = convert(root);
    assert_eq!(read(root, "a.json"), "41");
    assert!(!root.join("b.json").exists());
    assert!(reporter.errors()[0].contains("ReferenceError: shared is not defined"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Fatal failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut reporter = MemoryReporter::new();
    let err = run(&ConvertConfig::new(dir.path().join("missing")), &mut reporter).unwrap_err();
    assert!(matches!(err, WalkError::Root { .. }));
    assert!(reporter.entries().is_empty());
}

#[test]
fn test_file_root_is_fatal() {
    let dir = tree(&[("a.js", "var graphData = 1;")]);
    let root = dir.path().join("a.js");
    let err = run(&ConvertConfig::new(&root), &mut MemoryReporter::new()).unwrap_err();
    assert!(matches!(err, WalkError::NotADirectory { .. }));
    assert!(json_files(dir.path()).is_empty());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_aborts_before_writing() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tree(&[("a.js", "var graphData = 1;"), ("locked/b.js", "var graphData = 2;")]);
    let root = dir.path();
    let locked = root.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // Permission bits do not restrict root.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = run(&ConvertConfig::new(root), &mut MemoryReporter::new());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    assert!(matches!(result, Err(WalkError::Walk(_))));
    assert!(json_files(root).is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Output paths
// ══════════════════════════════════════════════════════════════════════════════

#[rstest]
#[case("data/chart.js", "data/chart.json")]
#[case("js.js/widget.js", "js.json/widget.js")]
#[case("a.jsx/b.js", "a.jsonx/b.js")]
#[case("x.min.js", "x.min.json")]
#[case(".hidden/a.js", ".hidden/a.json")]
fn test_output_path(#[case] source: &str, #[case] expected: &str) {
    let config = ConvertConfig::new(".");
    assert_eq!(output_path(Path::new(source), &config).unwrap(), PathBuf::from(expected));
}
