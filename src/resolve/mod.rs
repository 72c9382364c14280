//! Module graph resolution.
//!
//! Turns the manifest's module declarations into a closed set of [`Module`]s.
//! Resolution is a sequence of explicit steps over a [`ResolverContext`]:
//!
//! 1. [`ResolverContext::from_declarations`] creates one module per declared
//!    name.
//! 2. [`ResolverContext::infer_implicit_modules`] adds an empty module for
//!    every dependency name that was never declared, in first-reference order.
//! 3. [`ResolverContext::discover_sources`] asks a [`SourceTree`] for each
//!    declared module's files.
//! 4. [`ResolverContext::compute_link_orders`] derives each module's link order
//!    and fails on dependency cycles.
//!
//! [`resolve`] runs all four steps.
//!
//! ```rust
//! use kumiki::ast::ModuleDecl;
//! use kumiki::resolve::{DiscoveredSources, SourceTree, resolve};
//!
//! struct NoSources;
//! impl SourceTree for NoSources {
//!     fn discover(&self, _module: &str) -> std::io::Result<DiscoveredSources> {
//!         Ok(DiscoveredSources::default())
//!     }
//! }
//!
//! let decls = vec![
//!     ModuleDecl::new("Leaf", Vec::<String>::new()),
//!     ModuleDecl::new("Mid", ["Leaf"]),
//!     ModuleDecl::new("Top", ["Mid"]),
//! ];
//! let graph = resolve(&decls, &NoSources).expect("acyclic");
//! let top = graph.get("Top").expect("Top is declared");
//! assert_eq!(top.link_order, ["Mid", "Leaf"]);
//! ```

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::ast::ModuleDecl;

mod error;
mod link_order;
mod sources;

pub use error::ResolveError;
pub use sources::{DiscoveredSources, FsSourceTree, SourceTree};

/// How a module entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleOrigin {
    /// Declared in the manifest.
    Declared,
    /// Referenced as a dependency but never declared.
    Implicit,
}

/// A unit of source compiled together into one library or executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Unique module name.
    pub name: String,
    /// Dependency names as written in the manifest.
    pub declared_dependencies: Vec<String>,
    /// Modules to link, each listed before the modules it depends on. Never
    /// contains `name` or duplicates.
    pub link_order: Vec<String>,
    /// Source files, sorted.
    pub sources: Vec<Utf8PathBuf>,
    /// Whether the module produces an executable instead of an archive.
    pub is_executable: bool,
    /// External libraries linked unconditionally.
    pub link_libraries: Vec<String>,
    /// Extra compiler flags for this module.
    pub compile_flags: Vec<String>,
    /// Whether the module was declared or inferred.
    pub origin: ModuleOrigin,
}

impl Module {
    fn declared(decl: &ModuleDecl) -> Self {
        Self {
            name: decl.name.clone(),
            declared_dependencies: decl.dependencies.clone(),
            link_order: Vec::new(),
            sources: Vec::new(),
            is_executable: false,
            link_libraries: decl.link_libraries.clone(),
            compile_flags: decl.flags.clone(),
            origin: ModuleOrigin::Declared,
        }
    }

    fn implicit(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            declared_dependencies: Vec::new(),
            link_order: Vec::new(),
            sources: Vec::new(),
            is_executable: false,
            link_libraries: Vec::new(),
            compile_flags: Vec::new(),
            origin: ModuleOrigin::Implicit,
        }
    }
}

/// The growing module set threaded through the resolution steps.
#[derive(Debug, Clone, Default)]
pub struct ResolverContext {
    modules: IndexMap<String, Module>,
}

impl ResolverContext {
    /// Create one module per declared name, keeping the first of any repeats.
    #[must_use]
    pub fn from_declarations(decls: &[ModuleDecl]) -> Self {
        let mut modules = IndexMap::with_capacity(decls.len());
        for decl in decls {
            if modules.contains_key(&decl.name) {
                warn!(module = %decl.name, "ignoring repeated module declaration");
                continue;
            }
            modules.insert(decl.name.clone(), Module::declared(decl));
        }
        Self { modules }
    }

    /// Add an implicit module for every undeclared dependency name.
    ///
    /// Names are appended in the order they are first referenced.
    #[must_use]
    pub fn infer_implicit_modules(mut self) -> Self {
        let referenced: Vec<String> = self
            .modules
            .values()
            .flat_map(|module| module.declared_dependencies.iter().cloned())
            .collect();
        for name in referenced {
            if !self.modules.contains_key(&name) {
                debug!(module = %name, "inferring implicit module");
                let module = Module::implicit(&name);
                self.modules.insert(name, module);
            }
        }
        self
    }

    /// Populate sources and the executable flag of every declared module.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SourceScan`] when a module directory cannot be
    /// read.
    pub fn discover_sources(mut self, tree: &dyn SourceTree) -> Result<Self, ResolveError> {
        for module in self.modules.values_mut() {
            if module.origin == ModuleOrigin::Implicit {
                continue;
            }
            let found = tree
                .discover(&module.name)
                .map_err(|source| ResolveError::SourceScan {
                    module: module.name.clone(),
                    source,
                })?;
            module.sources = found.files;
            module.is_executable = found.is_executable;
        }
        Ok(self)
    }

    /// Derive every module's link order and finish resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::DependencyCycle`] when a module transitively
    /// depends on itself.
    pub fn compute_link_orders(mut self) -> Result<ModuleGraph, ResolveError> {
        let mut orders = Vec::with_capacity(self.modules.len());
        for name in self.modules.keys() {
            let order = link_order::link_order(name, &self.modules)
                .map_err(|cycle| ResolveError::DependencyCycle { cycle })?;
            orders.push(order);
        }
        for (module, order) in self.modules.values_mut().zip(orders) {
            module.link_order = order;
        }
        Ok(ModuleGraph {
            modules: self.modules,
        })
    }

    /// Iterate over the modules collected so far, in discovery order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

/// Fully resolved modules in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModuleGraph {
    modules: IndexMap<String, Module>,
}

impl ModuleGraph {
    /// Look up a module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Iterate over modules in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Iterate over modules that were inferred rather than declared.
    pub fn implicit_modules(&self) -> impl Iterator<Item = &Module> {
        self.iter()
            .filter(|module| module.origin == ModuleOrigin::Implicit)
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the graph holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Resolve declarations into a [`ModuleGraph`].
///
/// # Errors
///
/// Returns [`ResolveError`] when source discovery fails or the dependencies
/// contain a cycle.
pub fn resolve(decls: &[ModuleDecl], tree: &dyn SourceTree) -> Result<ModuleGraph, ResolveError> {
    let graph = ResolverContext::from_declarations(decls)
        .infer_implicit_modules()
        .discover_sources(tree)?
        .compute_link_orders()?;
    debug!(
        modules = graph.len(),
        implicit = graph.implicit_modules().count(),
        "resolved module graph"
    );
    Ok(graph)
}
