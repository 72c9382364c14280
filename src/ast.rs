//! Kumiki manifest structures.
//!
//! These types describe a parsed `Kumikifile`. They are produced by the
//! structural grammar in [`crate::manifest`] rather than by a generic
//! deserialiser, so every field here has already been checked to be a plain
//! string or a list of string literals.
//!
//! ```rust
//! use kumiki::manifest;
//!
//! let yaml = "kumiki_version: \"1.0.0\"\nmodules:\n  - name: Core\n    dependencies: []\n";
//! let manifest = manifest::from_str(yaml).expect("parse");
//! assert_eq!(manifest.modules[0].name, "Core");
//! ```

use semver::Version;
use serde::Serialize;

/// Top-level manifest structure parsed from a `Kumikifile`.
///
/// ```yaml
/// kumiki_version: "1.0.0"
/// modules:
///   - name: Core
///     dependencies: []
///   - name: App
///     dependencies: ["Core"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Semantic version of the manifest format.
    pub kumiki_version: Version,

    /// Module declarations in the order they appear in the manifest.
    pub modules: Vec<ModuleDecl>,
}

/// One explicit module declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDecl {
    /// Module name; also the name of its source directory.
    pub name: String,

    /// Names of the modules this one depends on, as written.
    pub dependencies: Vec<String>,

    /// External libraries linked unconditionally into executables that use
    /// this module.
    pub link_libraries: Vec<String>,

    /// Extra compiler flags applied only to this module.
    pub flags: Vec<String>,
}

impl ModuleDecl {
    /// Declare a module with dependencies and no extra flags or libraries.
    ///
    /// ```rust
    /// use kumiki::ast::ModuleDecl;
    /// let decl = ModuleDecl::new("App", ["Core"]);
    /// assert_eq!(decl.dependencies, vec!["Core".to_owned()]);
    /// ```
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            link_libraries: Vec::new(),
            flags: Vec::new(),
        }
    }
}
