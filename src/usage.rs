//! Usage requirements: what a consumer needs in order to compile and link
//! against a published library.
//!
//! A library deliverable is identified by a two-level key `namespace/name`,
//! distinct from the package identity because one package may publish
//! several libraries. The map resolves the transitive include and link
//! paths for a key.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::name::Name;
use crate::error::UserError;
use crate::util::dym::suggestion_for;

/// Identifier of a published library deliverable: `namespace/name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UsageKey {
    pub namespace: Name,
    pub name: Name,
}

impl UsageKey {
    /// Create a new usage key.
    pub fn new(namespace: impl Into<Name>, name: impl Into<Name>) -> Self {
        UsageKey {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for UsageKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, name) = s
            .split_once('/')
            .with_context(|| format!("invalid usage key `{}`: expected `namespace/name`", s))?;
        Ok(UsageKey::new(namespace, name))
    }
}

impl Serialize for UsageKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UsageKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What consuming a library requires: its artifact, headers, and the keys
/// of the libraries it pulls in transitively.
#[derive(Debug, Clone, Default)]
pub struct UsageRequirements {
    /// Path to the linkable artifact, absent for header-only libraries.
    pub linkable_path: Option<PathBuf>,
    /// Public include directories.
    pub include_paths: Vec<PathBuf>,
    /// Transitively used libraries (headers and archives).
    pub uses: Vec<UsageKey>,
    /// Transitively linked libraries (archives only).
    pub links: Vec<UsageKey>,
}

/// Immutable-after-construction table of usage requirements by key.
#[derive(Debug, Clone, Default)]
pub struct UsageRequirementMap {
    entries: BTreeMap<UsageKey, UsageRequirements>,
}

impl UsageRequirementMap {
    /// Create an empty map.
    pub fn new() -> Self {
        UsageRequirementMap::default()
    }

    /// Register the requirements for a key. Duplicate keys are a
    /// user-facing error naming the conflict.
    pub fn add(&mut self, key: UsageKey, reqs: UsageRequirements) -> Result<(), UserError> {
        if self.entries.contains_key(&key) {
            return Err(UserError::DuplicateUsageKey {
                key: key.to_string(),
            });
        }
        self.entries.insert(key, reqs);
        Ok(())
    }

    /// Build the map from a library-index document.
    pub fn from_index(index: &LibraryIndex) -> Result<Self, UserError> {
        let mut map = UsageRequirementMap::new();
        for pkg in &index.packages {
            for lib in &pkg.libraries {
                map.add(
                    UsageKey::new(pkg.namespace.as_str(), lib.name.as_str()),
                    UsageRequirements {
                        linkable_path: lib.linkable_path.clone(),
                        include_paths: lib.include_paths.clone(),
                        uses: lib.uses.clone(),
                        links: lib.links.clone(),
                    },
                )?;
            }
        }
        Ok(map)
    }

    /// Look up a key, if present.
    pub fn get(&self, key: &UsageKey) -> Option<&UsageRequirements> {
        self.entries.get(key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the transitive linker inputs for a key: its own artifact
    /// first, then depth-first the artifacts of every `uses` and `links`
    /// entry.
    pub fn link_paths(&self, key: &UsageKey) -> Result<Vec<PathBuf>, UserError> {
        let mut out = Vec::new();
        let mut visiting = Vec::new();
        self.walk_link_paths(key, &mut out, &mut visiting)?;
        Ok(out)
    }

    fn walk_link_paths(
        &self,
        key: &UsageKey,
        out: &mut Vec<PathBuf>,
        visiting: &mut Vec<UsageKey>,
    ) -> Result<(), UserError> {
        if visiting.contains(key) {
            return Err(self.cycle_error(visiting, key));
        }
        let reqs = self.lookup(key)?;
        visiting.push(*key);
        if let Some(path) = &reqs.linkable_path {
            out.push(path.clone());
        }
        for dep in &reqs.uses {
            self.walk_link_paths(dep, out, visiting)?;
        }
        for link in &reqs.links {
            self.walk_link_paths(link, out, visiting)?;
        }
        visiting.pop();
        Ok(())
    }

    /// Resolve the transitive include directories for a key: its own
    /// include paths, then depth-first those of every `uses` entry. `links`
    /// entries contribute no headers.
    pub fn include_paths(&self, key: &UsageKey) -> Result<Vec<PathBuf>, UserError> {
        let mut out = Vec::new();
        let mut visiting = Vec::new();
        self.walk_include_paths(key, &mut out, &mut visiting)?;
        Ok(out)
    }

    fn walk_include_paths(
        &self,
        key: &UsageKey,
        out: &mut Vec<PathBuf>,
        visiting: &mut Vec<UsageKey>,
    ) -> Result<(), UserError> {
        if visiting.contains(key) {
            return Err(self.cycle_error(visiting, key));
        }
        let reqs = self.lookup(key)?;
        visiting.push(*key);
        out.extend(reqs.include_paths.iter().cloned());
        for dep in &reqs.uses {
            self.walk_include_paths(dep, out, visiting)?;
        }
        visiting.pop();
        Ok(())
    }

    fn lookup(&self, key: &UsageKey) -> Result<&UsageRequirements, UserError> {
        self.entries.get(key).ok_or_else(|| {
            let known: Vec<String> = self.entries.keys().map(|k| k.to_string()).collect();
            UserError::UnknownUsageKey {
                key: key.to_string(),
                hint: suggestion_for(&key.to_string(), known.iter().map(|s| s.as_str())),
            }
        })
    }

    fn cycle_error(&self, visiting: &[UsageKey], repeated: &UsageKey) -> UserError {
        let mut chain: Vec<String> = visiting.iter().map(|k| k.to_string()).collect();
        chain.push(repeated.to_string());
        UserError::UsageCycle {
            chain: chain.join(" -> "),
        }
    }
}

/// A library-index document: every package visible to a build, with the
/// libraries each one publishes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryIndex {
    #[serde(default)]
    pub packages: Vec<IndexPackage>,
}

/// One package entry of a library index.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexPackage {
    pub namespace: String,
    #[serde(default)]
    pub libraries: Vec<IndexLibrary>,
}

/// One published library of an index entry.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexLibrary {
    pub name: String,
    #[serde(default)]
    pub linkable_path: Option<PathBuf>,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub uses: Vec<UsageKey>,
    #[serde(default)]
    pub links: Vec<UsageKey>,
}

impl LibraryIndex {
    /// Parse an index document from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
