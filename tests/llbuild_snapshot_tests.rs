//! Snapshot of the rendered build description for a small project.

use anyhow::Result;
use insta::{Settings, assert_snapshot};
use kumiki::graph::TaskGraphEmitter;
use kumiki::platform::PlatformProfile;
use kumiki::resolve::resolve;
use kumiki::toolchain::{BuildLayout, EmitConfig, Toolchain};
use kumiki::{llbuild_gen, manifest};
use test_support::MemorySourceTree;
use test_support::project::CORE_APP_MANIFEST;

#[test]
fn core_app_description() -> Result<()> {
    let manifest = manifest::from_str(CORE_APP_MANIFEST)?;
    let tree = MemorySourceTree::new()
        .with("Core", &["Core.swift"])
        .with("App", &["main.swift"]);
    let modules = resolve(&manifest.modules, &tree)?;
    let config = EmitConfig {
        toolchain: Toolchain::default(),
        layout: BuildLayout::default(),
        profile: PlatformProfile::linux(),
    };
    let graph = TaskGraphEmitter::new(&config).emit(&modules)?;
    let description = llbuild_gen::generate(&graph);

    let mut settings = Settings::new();
    settings.set_snapshot_path(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/snapshots/llbuild"
    ));
    settings.bind(|| {
        assert_snapshot!("core_app_description", description);
    });
    Ok(())
}
