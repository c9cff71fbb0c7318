//! Tests for `qodana.yaml` loading.

use super::*;
use rstest::rstest;

const FULL_CONFIG: &str = r#"
version: "1.0"
linter: jetbrains/qodana-dotnet:2024.1
profile:
  name: qodana.recommended
properties:
  idea.log.level: 2
  -Xmx: 4g
  rider.quiet: true
  empty.value:
plugins:
  - id: org.intellij.scala
  - id: com.example.checks
    version: 1.2.0
dotnet:
  solution: App.sln
  configuration: Release
exclude:
  - name: All
    paths: [vendor]
"#;

fn write_config(dir: &Utf8Path, name: &str, text: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("write qodana.yaml");
    path
}

fn temp_project() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
    (temp, root)
}

#[test]
fn parses_used_sections_and_ignores_the_rest() {
    let config = ProjectConfig::parse(FULL_CONFIG).expect("valid configuration");

    assert_eq!(config.product().as_deref(), Some("QDNET"));
    assert_eq!(config.properties.get("idea.log.level").map(String::as_str), Some("2"));
    assert_eq!(config.properties.get("-Xmx").map(String::as_str), Some("4g"));
    assert_eq!(config.properties.get("rider.quiet").map(String::as_str), Some("true"));
    assert_eq!(config.properties.get("empty.value").map(String::as_str), Some(""));
    assert_eq!(config.plugin_ids(), ["org.intellij.scala", "com.example.checks"]);
    assert_eq!(
        config.plugins.get(1).and_then(|plugin| plugin.version.as_deref()),
        Some("1.2.0")
    );

    let dotnet = config.dotnet_settings();
    assert_eq!(dotnet.solution.as_deref(), Some("App.sln"));
    assert_eq!(dotnet.configuration.as_deref(), Some("Release"));
    assert!(dotnet.project.is_none());
}

#[rstest]
#[case::empty("")]
#[case::whitespace("  \n")]
fn blank_documents_give_defaults(#[case] text: &str) {
    let config = ProjectConfig::parse(text).expect("blank configuration");
    assert_eq!(config, ProjectConfig::default());
}

#[test]
fn nested_property_values_are_rejected() {
    let err = ProjectConfig::parse("properties:\n  bad:\n    nested: 1\n")
        .expect_err("mapping values are not properties");
    assert!(err.to_string().contains("property bad"));
}

#[test]
fn ide_wins_over_linter() {
    let config = ProjectConfig::parse("ide: QDPY-EAP\nlinter: jetbrains/qodana-jvm:latest\n")
        .expect("valid configuration");
    assert_eq!(config.product().as_deref(), Some("QDPY-EAP"));
}

#[test]
fn blank_ide_falls_back_to_linter() {
    let config = ProjectConfig::parse("ide: ' '\nlinter: jetbrains/qodana-go:2024.1\n")
        .expect("valid configuration");
    assert_eq!(config.product().as_deref(), Some("QDGO"));
}

#[rstest]
#[case::plain("qodana-js", Some("QDJS"))]
#[case::tagged("jetbrains/qodana-php:2023.3-eap", Some("QDPHP"))]
#[case::registry("registry.example:5000/jetbrains/qodana-python-community:latest", Some("QDPYC"))]
#[case::community("jetbrains/qodana-python-community", Some("QDPYC"))]
#[case::android("jetbrains/qodana-jvm-android:2024.1", Some("QDAND"))]
#[case::unknown("jetbrains/qodana-cdnet:2024.1", None)]
fn maps_linter_images_to_products(#[case] image: &str, #[case] expected: Option<&str>) {
    assert_eq!(product_for_linter(image), expected);
}

#[test]
fn discover_prefers_yaml_over_yml() {
    let (_temp, root) = temp_project();
    write_config(&root, "qodana.yml", "ide: QDGO\n");
    write_config(&root, "qodana.yaml", "ide: QDJVM\n");

    let config = ProjectConfig::discover(&root, None).expect("configuration loads");
    assert_eq!(config.ide.as_deref(), Some("QDJVM"));
}

#[test]
fn discover_without_a_file_gives_defaults() {
    let (_temp, root) = temp_project();
    let config = ProjectConfig::discover(&root, None).expect("defaults");
    assert_eq!(config, ProjectConfig::default());
}

#[test]
fn explicit_missing_file_is_an_error() {
    let (_temp, root) = temp_project();
    let missing = root.join("custom.yaml");

    let err = ProjectConfig::discover(&root, Some(&missing)).expect_err("missing file");
    assert!(matches!(err, ConfigError::Read { ref path, .. } if *path == missing));
}

#[test]
fn parse_errors_name_the_file() {
    let (_temp, root) = temp_project();
    let path = write_config(&root, "qodana.yaml", "plugins: [unterminated\n");

    let err = ProjectConfig::discover(&root, None).expect_err("invalid YAML");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(path.as_str()));
}
