//! Structural grammar for module declarations.
//!
//! The YAML document is parsed into a value tree first; this module then walks
//! that tree and accepts only the exact shapes a manifest may take. Lists are
//! restricted to string literals, so nothing in a manifest is ever evaluated.

use super::{ManifestError, ManifestName, ManifestValue};
use crate::ast::{Manifest, ModuleDecl};
use semver::Version;
use serde_json::Map;

const TOP_LEVEL_FIELDS: &[&str] = &["kumiki_version", "modules"];
const MODULE_FIELDS: &[&str] = &["name", "dependencies", "link_libraries", "flags"];

/// Shape of a manifest value as far as the grammar is concerned.
enum Node<'a> {
    Text(&'a str),
    List(&'a [ManifestValue]),
    Mapping(&'a Map<String, ManifestValue>),
    Other(&'static str),
}

impl<'a> Node<'a> {
    fn of(value: &'a ManifestValue) -> Self {
        match value {
            ManifestValue::String(s) => Self::Text(s),
            ManifestValue::Array(items) => Self::List(items),
            ManifestValue::Object(map) => Self::Mapping(map),
            ManifestValue::Null => Self::Other("null"),
            ManifestValue::Bool(_) => Self::Other("a boolean"),
            ManifestValue::Number(_) => Self::Other("a number"),
        }
    }

    const fn describe(&self) -> &'static str {
        match self {
            Self::Text(_) => "a string",
            Self::List(_) => "a list",
            Self::Mapping(_) => "a mapping",
            Self::Other(kind) => kind,
        }
    }
}

/// Walks a parsed manifest, recording the manifest name for diagnostics.
pub(super) struct Grammar<'a> {
    name: &'a ManifestName,
}

impl<'a> Grammar<'a> {
    pub(super) const fn new(name: &'a ManifestName) -> Self {
        Self { name }
    }

    fn error(&self, location: impl Into<String>, details: impl Into<String>) -> ManifestError {
        ManifestError::Format {
            name: self.name.clone(),
            location: location.into(),
            details: details.into(),
        }
    }

    fn mapping<'v>(
        &self,
        value: &'v ManifestValue,
        location: &str,
        allowed: &[&str],
    ) -> Result<&'v Map<String, ManifestValue>, ManifestError> {
        let node = Node::of(value);
        let Node::Mapping(map) = node else {
            return Err(self.error(location, format!("expected a mapping, found {}", node.describe())));
        };
        if let Some(unknown) = map.keys().find(|key| !allowed.contains(&key.as_str())) {
            return Err(self.error(
                location,
                format!(
                    "unknown field `{unknown}`; expected one of {}",
                    allowed.join(", ")
                ),
            ));
        }
        Ok(map)
    }

    fn string(&self, value: &ManifestValue, location: &str) -> Result<String, ManifestError> {
        match Node::of(value) {
            Node::Text(text) => Ok(text.to_owned()),
            other => Err(self.error(
                location,
                format!("expected a string, found {}", other.describe()),
            )),
        }
    }

    /// Accept a list whose every item is a string literal.
    fn string_list(
        &self,
        value: &ManifestValue,
        location: &str,
    ) -> Result<Vec<String>, ManifestError> {
        let node = Node::of(value);
        let Node::List(items) = node else {
            return Err(self.error(
                location,
                format!("expected a list of strings, found {}", node.describe()),
            ));
        };
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.string(item, &format!("{location}[{idx}]")))
            .collect()
    }

    /// Accept a list of module names.
    ///
    /// Undeclared dependencies become modules of their own, so they obey the
    /// same naming rules as declared ones.
    fn name_list(&self, value: &ManifestValue, location: &str) -> Result<Vec<String>, ManifestError> {
        let node = Node::of(value);
        let Node::List(items) = node else {
            return Err(self.error(
                location,
                format!("expected a list of strings, found {}", node.describe()),
            ));
        };
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.module_name(item, &format!("{location}[{idx}]")))
            .collect()
    }

    fn optional_list(
        &self,
        map: &Map<String, ManifestValue>,
        field: &str,
        location: &str,
    ) -> Result<Vec<String>, ManifestError> {
        map.get(field).map_or_else(
            || Ok(Vec::new()),
            |value| self.string_list(value, &format!("{location}.{field}")),
        )
    }

    fn module_name(&self, value: &ManifestValue, location: &str) -> Result<String, ManifestError> {
        let name = self.string(value, location)?;
        if name.is_empty() {
            return Err(self.error(location, "module name must not be empty"));
        }
        if name.starts_with('.') {
            return Err(self.error(
                location,
                format!("module name `{name}` must not start with `.`"),
            ));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '<' | '>' | '-'))
        {
            return Err(self.error(
                location,
                format!("module name `{name}` contains invalid character {bad:?}"),
            ));
        }
        Ok(name)
    }

    fn module(&self, value: &ManifestValue, index: usize) -> Result<ModuleDecl, ManifestError> {
        let location = format!("modules[{index}]");
        let map = self.mapping(value, &location, MODULE_FIELDS)?;
        let name_value = map
            .get("name")
            .ok_or_else(|| self.error(&location, "missing required field `name`"))?;
        let name = self.module_name(name_value, &format!("{location}.name"))?;
        let deps_value = map
            .get("dependencies")
            .ok_or_else(|| self.error(&location, "missing required field `dependencies`"))?;
        let dependencies = self.name_list(deps_value, &format!("{location}.dependencies"))?;
        Ok(ModuleDecl {
            name,
            dependencies,
            link_libraries: self.optional_list(map, "link_libraries", &location)?,
            flags: self.optional_list(map, "flags", &location)?,
        })
    }

    /// Parse the whole document into a [`Manifest`].
    pub(super) fn manifest(&self, doc: &ManifestValue) -> Result<Manifest, ManifestError> {
        let map = self.mapping(doc, "document", TOP_LEVEL_FIELDS)?;
        let version_value = map
            .get("kumiki_version")
            .ok_or_else(|| self.error("document", "missing required field `kumiki_version`"))?;
        let version_text = self.string(version_value, "kumiki_version")?;
        let kumiki_version = Version::parse(&version_text).map_err(|err| {
            self.error(
                "kumiki_version",
                format!("`{version_text}` is not a semantic version: {err}"),
            )
        })?;

        let modules = match map.get("modules").map(Node::of) {
            None | Some(Node::Other("null")) => Vec::new(),
            Some(Node::List(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.module(item, idx))
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(self.error(
                    "modules",
                    format!("expected a list of module declarations, found {}", other.describe()),
                ));
            }
        };
        Ok(Manifest {
            kumiki_version,
            modules,
        })
    }
}
