//! Task graph emission properties over resolved manifests.

use anyhow::{Context, Result, bail, ensure};
use kumiki::graph::{CommandSpec, EmitError, TaskGraph, TaskGraphEmitter};
use kumiki::manifest;
use kumiki::platform::{Platform, PlatformTable};
use kumiki::resolve::resolve;
use kumiki::toolchain::{BuildLayout, Configuration, EmitConfig, Toolchain};
use rstest::{fixture, rstest};
use std::collections::HashSet;
use test_support::MemorySourceTree;

const MANIFEST: &str = concat!(
    "kumiki_version: \"1.0.0\"\n",
    "modules:\n",
    "  - name: Log\n    dependencies: []\n",
    "  - name: Net\n    dependencies: [Log, Crypto]\n",
    "  - name: App\n    dependencies: [Net, Log]\n",
    "  - name: Tool\n    dependencies: [App]\n",
);

#[fixture]
fn tree() -> MemorySourceTree {
    MemorySourceTree::new()
        .with("Log", &["Log.swift"])
        .with("Net", &["Socket.swift", "Http.swift"])
        .with("App", &["main.swift", "Options.swift"])
        .with("Tool", &["main.swift"])
}

fn config(platform: Platform, configuration: Configuration) -> Result<EmitConfig> {
    let profile = PlatformTable::builtin()
        .profile(platform)
        .cloned()
        .context("built-in profile")?;
    Ok(EmitConfig {
        toolchain: Toolchain {
            configuration,
            ..Toolchain::default()
        },
        layout: BuildLayout::for_configuration(configuration),
        profile,
    })
}

fn emit(config: &EmitConfig, tree: &MemorySourceTree) -> Result<TaskGraph> {
    let manifest = manifest::from_str(MANIFEST)?;
    let modules = resolve(&manifest.modules, tree)?;
    Ok(TaskGraphEmitter::new(config).emit(&modules)?)
}

#[rstest]
#[case(Platform::Linux, Configuration::Debug)]
#[case(Platform::Darwin, Configuration::Release)]
fn every_output_has_one_producer(
    tree: MemorySourceTree,
    #[case] platform: Platform,
    #[case] configuration: Configuration,
) -> Result<()> {
    let graph = emit(&config(platform, configuration)?, &tree)?;
    let mut seen = HashSet::new();
    for node in graph.nodes.values() {
        ensure!(
            node.outputs.first().map(String::as_str) == Some(node.id.as_str()),
            "{} must list itself first",
            node.id
        );
        for output in &node.outputs {
            ensure!(seen.insert(output.clone()), "{output} produced twice");
        }
    }
    Ok(())
}

#[rstest]
fn default_targets_cover_all_modules(tree: MemorySourceTree) -> Result<()> {
    let graph = emit(&config(Platform::Linux, Configuration::Debug)?, &tree)?;
    let expected = ["<Log>", "<Net>", "<App>", "<Tool>", "<Crypto>"];
    for target in ["", "all"] {
        let ids: Vec<&str> = graph
            .targets
            .get(target)
            .context("default target")?
            .iter()
            .map(|id| id.as_str())
            .collect();
        ensure!(ids == expected, "target {target:?} lists {ids:?}");
    }
    Ok(())
}

#[rstest]
fn emission_is_deterministic(tree: MemorySourceTree) -> Result<()> {
    let cfg = config(Platform::Linux, Configuration::Debug)?;
    let first = emit(&cfg, &tree)?;
    let second = emit(&cfg, &tree)?;
    ensure!(first == second, "emitting twice must give identical graphs");
    Ok(())
}

#[rstest]
fn implicit_module_links_an_empty_archive(tree: MemorySourceTree) -> Result<()> {
    let graph = emit(&config(Platform::Linux, Configuration::Debug)?, &tree)?;
    ensure!(
        graph.node("<Crypto-compile>").is_none(),
        "implicit modules compile nothing"
    );
    let link = graph.node("<Crypto-link>").context("Crypto link node")?;
    ensure!(
        link.outputs.contains(&".build/debug/libCrypto.a".to_owned()),
        "unexpected outputs {:?}",
        link.outputs
    );
    Ok(())
}

#[rstest]
fn executable_dependencies_are_not_linked_as_archives(tree: MemorySourceTree) -> Result<()> {
    let graph = emit(&config(Platform::Linux, Configuration::Debug)?, &tree)?;
    let link = graph.node("<Tool-link>").context("Tool link node")?;
    let Some(CommandSpec::Link(spec)) = &link.command else {
        bail!("Tool link node has no command");
    };
    ensure!(
        !spec.args.iter().any(|a| a.ends_with("libApp.a")),
        "executables produce no archive: {:?}",
        spec.args
    );
    let archives: Vec<&String> = spec.args.iter().filter(|a| a.ends_with(".a")).collect();
    ensure!(
        archives
            == [
                ".build/debug/libNet.a",
                ".build/debug/libCrypto.a",
                ".build/debug/libLog.a",
            ],
        "unexpected archive order {archives:?}"
    );
    Ok(())
}

#[rstest]
fn release_builds_optimise(tree: MemorySourceTree) -> Result<()> {
    let graph = emit(&config(Platform::Darwin, Configuration::Release)?, &tree)?;
    let compile = graph.node("<Log-compile>").context("Log compile node")?;
    let Some(CommandSpec::Compile(spec)) = &compile.command else {
        bail!("Log compile node has no command");
    };
    ensure!(
        spec.other_args == ["-O", "-target", "x86_64-apple-macosx10.10"],
        "unexpected args {:?}",
        spec.other_args
    );
    ensure!(
        spec.objects == [".build/release/Log.build/Log.swift.o"],
        "unexpected objects {:?}",
        spec.objects
    );
    Ok(())
}

#[test]
fn emit_errors_carry_diagnostic_codes() {
    use miette::Diagnostic;
    let err = EmitError::CircularNode {
        cycle: vec!["<a>".into(), "<b>".into(), "<a>".into()],
    };
    assert_eq!(err.to_string(), "task graph contains a cycle: <a> -> <b> -> <a>");
    assert_eq!(
        err.code().map(|code| code.to_string()).as_deref(),
        Some("kumiki::graph::cycle")
    );
}
