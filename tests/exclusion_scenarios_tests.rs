//! Integration tests for content-based exclusion
//!
//! These tests drive whole runs from a `formatgate.yaml` project file and verify:
//! - Files containing a marker are left byte-for-byte untouched
//! - Every other matched file goes through the step chain
//! - `|`-delimited markers are OR-ed
//! - Check mode never writes

use camino::Utf8PathBuf;
use formatgate::{
    ConfigManager, FormatRequest, RunMode, Summary, format_target, summarize_run,
};
use std::fs;
use tempfile::TempDir;
use tokio::sync::watch;

fn create_project(config: &str, files: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    fs::write(root.join("formatgate.yaml"), config).unwrap();
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    (temp_dir, root)
}

fn request(root: &Utf8PathBuf, format: &str) -> FormatRequest {
    let project = ConfigManager::new(root).load_project_config().unwrap();
    FormatRequest::from_config(root, project.format(format).unwrap()).unwrap()
}

fn read(root: &Utf8PathBuf, name: &str) -> String {
    fs::read_to_string(root.join(name)).unwrap()
}

const ONE_MARKER: &str = r#"formats:
  toLower:
    target: ["**/*.md"]
    exclude_if_content_contains: "// Generated by Mr. Roboto"
    steps:
      - type: lowercase
"#;

#[tokio::test]
async fn test_exclude_with_one_marker() {
    let generated = "// Generated by Mr. Roboto, do not edit.\nA B C\nD E F\nG H I";
    let (_temp_dir, root) = create_project(
        ONE_MARKER,
        &[
            ("test_generated.md", generated),
            ("test_manual.md", "A B C\nD E F\nG H I"),
        ],
    );

    let summary = format_target(request(&root, "toLower")).await.unwrap();

    assert_eq!(read(&root, "test_generated.md"), generated);
    assert_eq!(read(&root, "test_manual.md"), "a b c\nd e f\ng h i");
    assert_eq!(
        summary,
        Summary {
            changed_count: 1,
            excluded_count: 1,
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_exclude_with_multiple_steps() {
    let config = r#"formats:
  toLower:
    target: ["**/*.md"]
    exclude_if_content_contains: "// Generated by Mr. Roboto"
    steps:
      - type: lowercase
      - type: license_header
        header: "// My CopyRights header"
        delimiter: "--"
"#;
    let generated = "// Generated by Mr. Roboto, do not edit.\n--\npublic final   class MyMessage {}\n";
    let (_temp_dir, root) = create_project(
        config,
        &[
            ("test_generated.md", generated),
            (
                "test_manual.md",
                "// Typo in License\n--\npublic final class MyMessage {\n}",
            ),
        ],
    );

    format_target(request(&root, "toLower")).await.unwrap();

    // Excluded before any step ran, header included
    assert_eq!(read(&root, "test_generated.md"), generated);
    // Header inserted after lowercasing keeps its case
    assert_eq!(
        read(&root, "test_manual.md"),
        "// My CopyRights header\n--\npublic final class mymessage {\n}"
    );
}

#[tokio::test]
async fn test_exclude_with_multiple_markers() {
    let config = r#"formats:
  toLower:
    target: ["**/*.md"]
    exclude_if_content_contains: "// Generated by Mr. Roboto|// Generated by Mrs. Call"
    steps:
      - type: lowercase
"#;
    let roboto = "A B C\n// Generated by Mr. Roboto, do not edit.\nD E F\nG H I";
    let call = "A B C\nD E F\n// Generated by Mrs. Call, do not edit.\nG H I";
    let collaboration = "A B C\n// Generated by Mr. Roboto, do not edit.\nD E F\n// Generated by Mrs. Call, do not edit.\nG H I";
    let intruder = "A B C\n// Generated by K2000, do not edit.\nD E F\nG H I";
    let (_temp_dir, root) = create_project(
        config,
        &[
            ("test_generated_roboto.md", roboto),
            ("test_generated_call.md", call),
            ("test_generated_collaboration.md", collaboration),
            ("test_generated_intruder.md", intruder),
            ("test_manual.md", "A B C\nD E F\nG H I"),
        ],
    );

    let summary = format_target(request(&root, "toLower")).await.unwrap();

    assert_eq!(read(&root, "test_generated_roboto.md"), roboto);
    assert_eq!(read(&root, "test_generated_call.md"), call);
    assert_eq!(read(&root, "test_generated_collaboration.md"), collaboration);
    assert_eq!(
        read(&root, "test_generated_intruder.md"),
        "a b c\n// generated by k2000, do not edit.\nd e f\ng h i"
    );
    assert_eq!(read(&root, "test_manual.md"), "a b c\nd e f\ng h i");
    assert_eq!(summary.excluded_count, 3);
    assert_eq!(summary.changed_count, 2);
}

#[tokio::test]
async fn test_markers_as_yaml_list() {
    let config = r#"formats:
  toLower:
    target: ["**/*.md"]
    exclude_if_content_contains:
      - "// Generated by Mr. Roboto"
      - "// Generated by Mrs. Call"
    steps:
      - type: lowercase
"#;
    let call = "X\n// Generated by Mrs. Call\n";
    let (_temp_dir, root) =
        create_project(config, &[("call.md", call), ("manual.md", "X\n")]);

    format_target(request(&root, "toLower")).await.unwrap();

    assert_eq!(read(&root, "call.md"), call);
    assert_eq!(read(&root, "manual.md"), "x\n");
}

#[tokio::test]
async fn test_regex_marker() {
    let config = r#"formats:
  toLower:
    target: ["**/*.md"]
    exclude_if_content_matches: ["@generated\\s+by\\s+\\w+"]
    steps:
      - type: lowercase
"#;
    let generated = "HEADER\n@generated   by   Tool\n";
    let (_temp_dir, root) = create_project(
        config,
        &[("gen.md", generated), ("hand.md", "@Generated By Hand\n")],
    );

    format_target(request(&root, "toLower")).await.unwrap();

    assert_eq!(read(&root, "gen.md"), generated);
    // Literal and regex markers are case-sensitive
    assert_eq!(read(&root, "hand.md"), "@generated by hand\n");
}

#[tokio::test]
async fn test_no_markers_includes_everything() {
    let config = r#"formats:
  toLower:
    target: ["docs/**/*.md"]
    target_exclude: ["docs/vendor/**"]
    steps:
      - type: lowercase
"#;
    let (_temp_dir, root) = create_project(
        config,
        &[
            ("docs/a.md", "// Generated by Mr. Roboto\nA"),
            ("docs/vendor/b.md", "B"),
            ("README.md", "C"),
        ],
    );

    let summary = format_target(request(&root, "toLower")).await.unwrap();

    assert_eq!(read(&root, "docs/a.md"), "// generated by mr. roboto\na");
    // Path excludes and non-matching paths are never candidates
    assert_eq!(read(&root, "docs/vendor/b.md"), "B");
    assert_eq!(read(&root, "README.md"), "C");
    assert_eq!(summary.total(), 1);
}

#[tokio::test]
async fn test_check_mode_never_writes() {
    let generated = "// Generated by Mr. Roboto, do not edit.\nA B C";
    let (_temp_dir, root) = create_project(
        ONE_MARKER,
        &[
            ("test_generated.md", generated),
            ("test_manual.md", "A B C"),
            ("done.md", "already lower"),
        ],
    );

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let result = request(&root, "toLower")
        .mode(RunMode::Check)
        .run(None, cancel_rx, None, None)
        .await
        .unwrap();
    let summary = summarize_run(&result);

    assert_eq!(read(&root, "test_generated.md"), generated);
    assert_eq!(read(&root, "test_manual.md"), "A B C");
    assert_eq!(summary.changed_count, 1);
    assert_eq!(summary.unchanged_count, 1);
    assert!(summary.is_failure(RunMode::Check));

    let manual = result
        .reports
        .iter()
        .find(|r| r.path.ends_with("test_manual.md"))
        .unwrap();
    let diff = manual.diff.as_deref().unwrap();
    assert!(diff.contains("-A B C"));
    assert!(diff.contains("+a b c"));
}

#[tokio::test]
async fn test_step_failure_is_isolated() {
    let config = r#"formats:
  license:
    target: ["*.java"]
    steps:
      - type: license_header
        header: "// Header"
        delimiter: "package "
"#;
    let no_delimiter = "class Orphan {}\n";
    let (_temp_dir, root) = create_project(
        config,
        &[
            ("Good.java", "// old\npackage a;\n"),
            ("Orphan.java", no_delimiter),
        ],
    );

    let summary = format_target(request(&root, "license")).await.unwrap();

    assert_eq!(read(&root, "Good.java"), "// Header\npackage a;\n");
    assert_eq!(read(&root, "Orphan.java"), no_delimiter);
    assert_eq!(summary.failed_count, 1);
    assert!(summary.failures[0].0.ends_with("Orphan.java"));
    assert!(summary.failures[0].1.contains("license_header"));
    assert!(summary.is_failure(RunMode::Apply));
}

#[tokio::test]
async fn test_rerun_is_unchanged() {
    let (_temp_dir, root) = create_project(ONE_MARKER, &[("a.md", "A"), ("b.md", "B")]);

    let first = format_target(request(&root, "toLower")).await.unwrap();
    let second = format_target(request(&root, "toLower")).await.unwrap();

    assert_eq!(first.changed_count, 2);
    assert_eq!(second.changed_count, 0);
    assert_eq!(second.unchanged_count, 2);
}
