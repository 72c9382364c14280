//! Task graph emission from resolved modules.
//!
//! Each module becomes four nodes:
//!
//! - `<M-pred>` orders the module after the group nodes of its declared
//!   dependencies;
//! - `<M-compile>` compiles its sources, when it has any;
//! - `<M-link>` archives the objects, or links an executable against the
//!   archives of every module in its link order;
//! - `<M>` is the stable handle for "build module M".
//!
//! The `""` and `"all"` targets list every group node.

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use shell_quote::{QuoteRefExt, Sh};
use tracing::{debug, warn};

use super::{
    BuildNode, CommandSpec, CompileSpec, EmitError, LinkSpec, NodeId, TaskGraph, ToolKind,
    validate,
};
use crate::resolve::{Module, ModuleGraph};
use crate::toolchain::EmitConfig;

/// Builds a [`TaskGraph`] from a [`ModuleGraph`].
#[derive(Debug, Clone, Copy)]
pub struct TaskGraphEmitter<'a> {
    config: &'a EmitConfig,
}

impl<'a> TaskGraphEmitter<'a> {
    /// Create an emitter using `config` for tool paths and flags.
    #[must_use]
    pub const fn new(config: &'a EmitConfig) -> Self {
        Self { config }
    }

    /// Emit the task graph for every module.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if two nodes share an identifier, the emitted
    /// nodes claim the same output twice, or they form a cycle.
    pub fn emit(&self, modules: &ModuleGraph) -> Result<TaskGraph, EmitError> {
        let mut graph = TaskGraph::default();
        let mut groups = Vec::with_capacity(modules.len());
        for module in modules.iter() {
            for node in self.module_nodes(module, modules) {
                let id = node.id.clone();
                if let Some(previous) = graph.nodes.insert(id.clone(), node) {
                    return Err(EmitError::DuplicateOutput {
                        output: id.to_string(),
                        first: previous.id.to_string(),
                        second: id.to_string(),
                    });
                }
            }
            groups.push(NodeId::group(&module.name));
        }
        graph.targets.insert(String::new(), groups.clone());
        graph.targets.insert("all".into(), groups);

        validate::validate(&graph)?;
        debug!(
            nodes = graph.nodes.len(),
            modules = modules.len(),
            "emitted task graph"
        );
        Ok(graph)
    }

    fn module_nodes(&self, module: &Module, modules: &ModuleGraph) -> Vec<BuildNode> {
        let order = self.order_node(module);
        let compile = (!module.sources.is_empty()).then(|| self.compile_node(module, &order.id));
        let link = self.link_node(module, modules, &order.id, compile.as_ref());
        let group = phony(
            NodeId::group(&module.name),
            ToolKind::PhonyGroup,
            vec![link.id.to_string()],
        );
        [Some(order), compile, Some(link), Some(group)]
            .into_iter()
            .flatten()
            .collect()
    }

    fn order_node(&self, module: &Module) -> BuildNode {
        let inputs = module
            .declared_dependencies
            .iter()
            .unique()
            .map(|dep| NodeId::group(dep).into())
            .collect();
        phony(NodeId::order(&module.name), ToolKind::PhonyOrder, inputs)
    }

    fn compile_node(&self, module: &Module, order: &NodeId) -> BuildNode {
        let layout = &self.config.layout;
        let id = NodeId::compile(&module.name);
        let interface = layout.module_interface(&module.name);
        let objects: Vec<Utf8PathBuf> = module
            .sources
            .iter()
            .map(|source| layout.object(&module.name, source))
            .collect();

        let mut inputs = vec![order.to_string()];
        inputs.extend(module.sources.iter().map(ToString::to_string));
        let mut outputs = vec![id.to_string(), interface.to_string()];
        outputs.extend(objects.iter().map(ToString::to_string));

        let spec = CompileSpec {
            tool_name: self.config.toolchain.compiler_tool.clone(),
            executable: self.config.toolchain.compiler.clone(),
            module_name: module.name.clone(),
            module_output_path: interface,
            is_library: !module.is_executable,
            sources: module.sources.clone(),
            objects,
            import_paths: vec![layout.build_dir.clone()],
            temps_path: layout.temps_dir(&module.name),
            other_args: self.compile_args(module),
        };
        BuildNode {
            id,
            tool: ToolKind::SourceCompile,
            inputs,
            outputs,
            command: Some(CommandSpec::Compile(spec)),
        }
    }

    fn compile_args(&self, module: &Module) -> Vec<String> {
        let toolchain = &self.config.toolchain;
        let mut args: Vec<String> = toolchain
            .configuration
            .optimization_flags()
            .iter()
            .map(|flag| (*flag).to_owned())
            .collect();
        if let Some(jobs) = toolchain.jobs {
            args.push(format!("-j{jobs}"));
        }
        args.extend(self.target_and_sysroot_args());
        args.extend(toolchain.extra_flags.iter().cloned());
        args.extend(module.compile_flags.iter().cloned());
        args
    }

    fn target_and_sysroot_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(target) = self.config.target() {
            args.extend(["-target".to_owned(), target.to_owned()]);
        }
        if let Some(sysroot) = &self.config.toolchain.sysroot {
            args.extend(["-sdk".to_owned(), sysroot.to_string()]);
        }
        args
    }

    fn link_node(
        &self,
        module: &Module,
        modules: &ModuleGraph,
        order: &NodeId,
        compile: Option<&BuildNode>,
    ) -> BuildNode {
        let id = NodeId::link(&module.name);
        let objects: &[Utf8PathBuf] = match compile.and_then(|node| node.command.as_ref()) {
            Some(CommandSpec::Compile(spec)) => &spec.objects,
            _ => &[],
        };

        let mut inputs = vec![order.to_string()];
        if let Some(node) = compile {
            inputs.extend(node.outputs.iter().cloned());
        }

        let (artifact, spec) = if module.is_executable {
            let archives = self.dependency_archives(module, modules);
            inputs.extend(archives.iter().map(ToString::to_string));
            let executable = self
                .config
                .layout
                .executable(&module.name, &self.config.profile);
            let spec = self.executable_command(module, modules, &executable, objects, &archives);
            (executable, spec)
        } else {
            let archive = self
                .config
                .layout
                .archive(&module.name, &self.config.profile);
            let spec = self.archive_command(&archive, objects);
            (archive, spec)
        };

        BuildNode {
            outputs: vec![id.to_string(), artifact.to_string()],
            id,
            tool: ToolKind::ShellLink,
            inputs,
            command: Some(CommandSpec::Link(spec)),
        }
    }

    /// Archives of the modules in `module`'s link order, in that order.
    fn dependency_archives(&self, module: &Module, modules: &ModuleGraph) -> Vec<Utf8PathBuf> {
        module
            .link_order
            .iter()
            .filter(|name| {
                let is_executable = modules.get(name).is_some_and(|dep| dep.is_executable);
                if is_executable {
                    warn!(
                        module = %module.name,
                        dependency = %name,
                        "not linking against executable dependency"
                    );
                }
                !is_executable
            })
            .map(|name| self.config.layout.archive(name, &self.config.profile))
            .collect()
    }

    fn archive_command(&self, archive: &Utf8Path, objects: &[Utf8PathBuf]) -> LinkSpec {
        let archiver = &self.config.toolchain.archiver;
        let mut script = format!(
            "rm -f {archive} && {archiver} cr {archive}",
            archive = quote(archive.as_str()),
            archiver = quote(archiver.as_str()),
        );
        for object in objects {
            script.push(' ');
            script.push_str(&quote(object.as_str()));
        }
        debug_assert!(shlex::split(&script).is_some(), "unbalanced archive command");
        LinkSpec {
            description: format!("Archiving {archive}"),
            args: vec!["/bin/sh".into(), "-c".into(), script],
        }
    }

    fn executable_command(
        &self,
        module: &Module,
        modules: &ModuleGraph,
        executable: &Utf8Path,
        objects: &[Utf8PathBuf],
        archives: &[Utf8PathBuf],
    ) -> LinkSpec {
        let profile = &self.config.profile;
        let mut args = vec![
            self.config.toolchain.linker.to_string(),
            "-o".to_owned(),
            executable.to_string(),
        ];
        args.extend(objects.iter().map(ToString::to_string));
        if !archives.is_empty() {
            args.extend(profile.whole_archive_prefix.iter().cloned());
            args.extend(archives.iter().map(ToString::to_string));
            args.extend(profile.whole_archive_suffix.iter().cloned());
        }
        args.extend(profile.rpath_flags.iter().cloned());
        args.push(format!("-L{}", self.config.layout.build_dir));
        let libraries = std::iter::once(module)
            .chain(module.link_order.iter().filter_map(|name| modules.get(name)))
            .flat_map(|m| m.link_libraries.iter())
            .chain(profile.default_link_libraries.iter())
            .unique();
        args.extend(libraries.map(|lib| format!("-l{lib}")));
        args.extend(self.target_and_sysroot_args());
        LinkSpec {
            description: format!("Linking {executable}"),
            args,
        }
    }
}

fn phony(id: NodeId, tool: ToolKind, inputs: Vec<String>) -> BuildNode {
    BuildNode {
        outputs: vec![id.to_string()],
        id,
        tool,
        inputs,
        command: None,
    }
}

/// Quote `text` for a POSIX shell.
fn quote(text: &str) -> String {
    let bytes: Vec<u8> = text.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(quoted) => quoted,
        Err(err) => {
            debug_assert!(false, "shell quoting produced non UTF-8 bytes: {err}");
            String::from_utf8_lossy(&err.into_bytes()).into_owned()
        }
    }
}
