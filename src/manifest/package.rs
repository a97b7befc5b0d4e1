//! `boss.json` manifest model

use crate::error::{BossError, BossResult};
use crate::lock::PackageLock;
use crate::manifest::dependency::Dependency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Manifest file name in every project and module directory
pub const MANIFEST_FILE: &str = "boss.json";

/// A project or module manifest plus its lock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub name: String,

    pub description: String,

    pub version: String,

    pub homepage: String,

    /// Source directory exposed to dependents
    pub mainsrc: String,

    /// Delphi projects (`.dproj`) to compile, relative to the manifest
    pub projects: Vec<String>,

    /// Named shell commands for `boss run`
    pub scripts: BTreeMap<String, String>,

    /// Repository spec -> version constraint
    pub dependencies: BTreeMap<String, String>,

    #[serde(skip)]
    pub lock: PackageLock,

    #[serde(skip)]
    path: PathBuf,
}

impl Package {
    /// Create a fresh manifest for `dir` without writing it
    pub fn init(dir: &Path, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            mainsrc: "src/".to_string(),
            path: dir.join(MANIFEST_FILE),
            ..Self::default()
        }
    }

    /// Load a manifest file, without its lock
    pub fn load(path: &Path) -> BossResult<Self> {
        if !path.exists() {
            return Err(BossError::ManifestNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| BossError::io(format!("reading manifest {}", path.display()), e))?;

        let mut package: Package =
            serde_json::from_str(&content).map_err(|e| BossError::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        package.path = path.to_path_buf();
        Ok(package)
    }

    /// Load the manifest of a module directory, `None` when it has none
    pub fn load_optional(dir: &Path) -> BossResult<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            debug!("No manifest in {}, treating as leaf", dir.display());
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Load a project's manifest together with its lock file
    pub fn load_project(dir: &Path) -> BossResult<Self> {
        let mut package = Self::load(&dir.join(MANIFEST_FILE))?;
        package.lock = PackageLock::load(dir)?;
        Ok(package)
    }

    /// Write the manifest back to disk
    pub fn save(&self) -> BossResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, content + "\n")
            .map_err(|e| BossError::io(format!("writing manifest {}", self.path.display()), e))?;
        debug!("Saved manifest {}", self.path.display());
        Ok(())
    }

    /// Write the lock file next to the manifest
    pub fn save_lock(&mut self) -> BossResult<()> {
        let dir = self.dir().to_path_buf();
        let dependencies = self.dependencies.clone();
        self.lock.save(&dir, &dependencies)
    }

    /// Path of the manifest file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Parse every declared dependency
    pub fn dependency_list(&self) -> BossResult<Vec<Dependency>> {
        self.dependencies
            .iter()
            .map(|(key, version)| Dependency::from_manifest(key, version))
            .collect()
    }

    /// Add or replace a dependency, matching existing entries case-insensitively
    pub fn add_dependency(&mut self, dep: &Dependency) {
        self.remove_dependency(dep);
        self.dependencies
            .insert(dep.manifest_key(), dep.version.clone());
        info!("Added dependency {}", dep);
    }

    /// Remove a dependency, returns whether an entry was removed
    pub fn remove_dependency(&mut self, dep: &Dependency) -> bool {
        let key = dep.key();
        let before = self.dependencies.len();
        self.dependencies.retain(|spec, version| {
            Dependency::from_manifest(spec, version)
                .map(|existing| existing.key() != key)
                .unwrap_or(true)
        });
        before != self.dependencies.len()
    }

    /// Rewrite the constraint stored for an existing dependency
    pub fn set_version(&mut self, dep: &Dependency, version: &str) {
        let key = dep.key();
        for (spec, stored) in self.dependencies.iter_mut() {
            let matches = Dependency::parse(spec)
                .map(|existing| existing.key() == key)
                .unwrap_or(false);
            if matches {
                *stored = version.to_string();
            }
        }
    }
}
