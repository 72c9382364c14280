//! Tests for the module declaration grammar.

use super::*;
use anyhow::{Context, Result, bail, ensure};
use rstest::rstest;

fn manifest_with(modules: &str) -> String {
    format!("kumiki_version: \"1.0.0\"\nmodules:\n{modules}")
}

fn format_location(yaml: &str) -> Result<String> {
    match from_str(yaml) {
        Err(ManifestError::Format { location, .. }) => Ok(location),
        Err(other) => bail!("expected a format error, got {other}"),
        Ok(manifest) => bail!("expected a format error, parsed {manifest:?}"),
    }
}

#[rstest]
fn parses_declarations_in_order() -> Result<()> {
    let yaml = manifest_with(
        "  - name: Core\n    dependencies: []\n  - name: App\n    dependencies: [\"Core\", \"Util\"]\n",
    );
    let manifest = from_str(&yaml)?;
    let names: Vec<_> = manifest.modules.iter().map(|m| m.name.as_str()).collect();
    ensure!(names == ["Core", "App"], "unexpected order {names:?}");
    let app = manifest.modules.get(1).context("App declaration")?;
    ensure!(
        app.dependencies == ["Core", "Util"],
        "unexpected dependencies {:?}",
        app.dependencies
    );
    Ok(())
}

#[rstest]
fn reads_optional_lists() -> Result<()> {
    let yaml = manifest_with(
        "  - name: App\n    dependencies: []\n    link_libraries: [m, pthread]\n    flags: [\"-DAPP\"]\n",
    );
    let manifest = from_str(&yaml)?;
    let app = manifest.modules.first().context("App declaration")?;
    ensure!(app.link_libraries == ["m", "pthread"], "{:?}", app.link_libraries);
    ensure!(app.flags == ["-DAPP"], "{:?}", app.flags);
    Ok(())
}

#[rstest]
fn empty_module_list_is_allowed() -> Result<()> {
    let manifest = from_str("kumiki_version: \"1.2.0\"\nmodules: []\n")?;
    ensure!(manifest.modules.is_empty(), "expected no modules");
    let bare = from_str("kumiki_version: \"1.0.0\"\n")?;
    ensure!(bare.modules.is_empty(), "modules should default to empty");
    Ok(())
}

#[rstest]
#[case::scalar_dependencies(
    "  - name: App\n    dependencies: Core\n",
    "modules[0].dependencies"
)]
#[case::number_item(
    "  - name: App\n    dependencies: [\"Core\", 3]\n",
    "modules[0].dependencies[1]"
)]
#[case::nested_list(
    "  - name: App\n    dependencies: [[\"Core\"]]\n",
    "modules[0].dependencies[0]"
)]
#[case::mapping_item(
    "  - name: App\n    dependencies:\n      - import: os\n",
    "modules[0].dependencies[0]"
)]
#[case::missing_dependencies("  - name: App\n", "modules[0]")]
#[case::missing_name("  - dependencies: []\n", "modules[0]")]
#[case::unknown_field(
    "  - name: App\n    dependencies: []\n    eval: \"__import__('os')\"\n",
    "modules[0]"
)]
#[case::name_with_space("  - name: My App\n    dependencies: []\n", "modules[0].name")]
#[case::empty_dependency("  - name: App\n    dependencies: [\"\"]\n", "modules[0].dependencies[0]")]
#[case::flags_scalar(
    "  - name: App\n    dependencies: []\n    flags: \"-O\"\n",
    "modules[0].flags"
)]
#[case::declaration_not_mapping("  - App\n", "modules[0]")]
#[case::name_with_hyphen("  - name: App-link\n    dependencies: []\n", "modules[0].name")]
#[case::dependency_with_slash(
    "  - name: App\n    dependencies: [\"Core\", \"../../../home/x\"]\n",
    "modules[0].dependencies[1]"
)]
#[case::dependency_with_angle_bracket(
    "  - name: App\n    dependencies: [\"<Core>\"]\n",
    "modules[0].dependencies[0]"
)]
#[case::dependency_parent_dir(
    "  - name: App\n    dependencies: [\"..\"]\n",
    "modules[0].dependencies[0]"
)]
#[case::dependency_with_hyphen(
    "  - name: App\n    dependencies: [\"Core-link\"]\n",
    "modules[0].dependencies[0]"
)]
fn rejects_malformed_declarations(#[case] modules: &str, #[case] expected: &str) -> Result<()> {
    let location = format_location(&manifest_with(modules))?;
    ensure!(location == expected, "expected {expected}, got {location}");
    Ok(())
}

#[rstest]
fn rejects_modules_that_are_not_a_list() -> Result<()> {
    let location = format_location("kumiki_version: \"1.0.0\"\nmodules: App\n")?;
    ensure!(location == "modules", "unexpected location {location}");
    Ok(())
}

#[rstest]
fn rejects_missing_version() -> Result<()> {
    let location = format_location("modules: []\n")?;
    ensure!(location == "document", "unexpected location {location}");
    Ok(())
}

#[rstest]
fn rejects_unsupported_version() -> Result<()> {
    match from_str("kumiki_version: \"2.0.0\"\nmodules: []\n") {
        Err(ManifestError::Version { found, .. }) => {
            ensure!(found.major == 2, "unexpected version {found}");
            Ok(())
        }
        other => bail!("expected a version error, got {other:?}"),
    }
}

#[rstest]
fn invalid_yaml_is_a_parse_error() -> Result<()> {
    match from_str("kumiki_version: \"1.0.0\"\nmodules: [\n") {
        Err(ManifestError::Parse { name, .. }) => {
            ensure!(name.as_str() == "Kumikifile", "unexpected name {name}");
            Ok(())
        }
        other => bail!("expected a parse error, got {other:?}"),
    }
}

#[rstest]
fn missing_file_is_a_read_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("Kumikifile"))
        .map_err(|p| anyhow::anyhow!("non UTF-8 temp path {}", p.display()))?;
    match from_path(&path) {
        Err(ManifestError::Read { path: reported, .. }) => {
            ensure!(reported == path, "unexpected path {reported}");
            Ok(())
        }
        other => bail!("expected a read error, got {other:?}"),
    }
}
