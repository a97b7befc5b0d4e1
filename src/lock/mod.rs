//! Persisted per-dependency install state
//!
//! `boss-lock.json` sits next to `boss.json` and records, per dependency,
//! the resolved version, a content hash of the checked-out module and the
//! build artifacts it produced. The staleness check (`need_update`) and the
//! graph's dirty tracking both read from here.
//!
//! The lock file is not guarded against concurrent writers: only one boss
//! process may operate on a project at a time.

pub mod artifacts;
pub mod hash;

pub use artifacts::{ArtifactKind, Artifacts, Snapshot};
pub use hash::content_hash;

use crate::error::{BossError, BossResult};
use crate::graph::DirtyTracker;
use crate::manifest::Dependency;
use crate::resolver::parse_version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lock file name
pub const LOCK_FILE: &str = "boss-lock.json";

/// Lock file name used by older releases, renamed on load
pub const LEGACY_LOCK_FILE: &str = "boss.lock";

/// Install state of one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDependency {
    pub name: String,

    /// Resolved reference name (tag or branch)
    pub version: String,

    /// Content hash of the module directory after checkout
    pub hash: String,

    #[serde(default)]
    pub artifacts: Artifacts,

    /// Last build failed, retried on the next run
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,

    /// Needs a rebuild in the current run
    #[serde(skip)]
    pub changed: bool,
}

/// Contents of `boss-lock.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageLock {
    /// Hash of the manifest's dependency table when the lock was written
    #[serde(default)]
    pub hash: String,

    #[serde(default)]
    pub updated: DateTime<Utc>,

    /// Lowercased repository -> install state
    #[serde(rename = "installedModules", default)]
    pub installed: BTreeMap<String, LockedDependency>,
}

impl PackageLock {
    /// Path of the lock file for a project directory
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(LOCK_FILE)
    }

    /// Load the lock of a project, migrating the legacy file name
    pub fn load(project_dir: &Path) -> BossResult<Self> {
        let path = Self::path(project_dir);
        let legacy = project_dir.join(LEGACY_LOCK_FILE);

        if !path.exists() && legacy.exists() {
            fs::rename(&legacy, &path).map_err(|e| {
                BossError::io(format!("migrating {} to {}", legacy.display(), LOCK_FILE), e)
            })?;
            info!("Migrated {} to {}", LEGACY_LOCK_FILE, LOCK_FILE);
        }

        if !path.exists() {
            debug!("No lock file at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| BossError::io(format!("reading lock file {}", path.display()), e))?;

        let mut lock: PackageLock =
            serde_json::from_str(&content).map_err(|e| BossError::LockInvalid {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        // Keys are case-insensitive; older files may carry mixed case
        lock.installed = std::mem::take(&mut lock.installed)
            .into_iter()
            .map(|(key, entry)| (key.to_lowercase(), entry))
            .collect();

        Ok(lock)
    }

    /// Write the lock, stamping the manifest hash and update time
    pub fn save(
        &mut self,
        project_dir: &Path,
        dependencies: &BTreeMap<String, String>,
    ) -> BossResult<()> {
        self.hash = manifest_hash(dependencies);
        self.updated = Utc::now();

        let path = Self::path(project_dir);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content + "\n")
            .map_err(|e| BossError::io(format!("writing lock file {}", path.display()), e))?;

        debug!("Saved lock file {}", path.display());
        Ok(())
    }

    /// Look up the entry of a dependency
    pub fn get(&self, dep: &Dependency) -> Option<&LockedDependency> {
        self.installed.get(&dep.key())
    }

    /// Whether `dep` must be fetched or rebuilt
    ///
    /// A dependency is stale when it has no entry, its last build failed, its
    /// module directory is gone, the directory hash drifted, `version` is
    /// newer than the locked one, or a recorded artifact is missing. When
    /// stale, the entry is flagged `changed` and its `failed` flag cleared.
    pub fn need_update(&mut self, dep: &Dependency, version: &str, modules_dir: &Path) -> bool {
        let Some(locked) = self.installed.get_mut(&dep.key()) else {
            debug!("{} is not locked yet", dep.repository);
            return true;
        };

        match stale_reason(locked, version, &modules_dir.join(dep.name()), modules_dir) {
            Some(reason) => {
                debug!("{} needs update: {}", dep.repository, reason);
                locked.changed = true;
                locked.failed = false;
                true
            }
            None => false,
        }
    }

    /// Create a fresh entry for `dep` at `version`, hashing its module directory
    pub fn add_dependency(
        &mut self,
        dep: &Dependency,
        version: &str,
        modules_dir: &Path,
    ) -> BossResult<()> {
        let entry = LockedDependency {
            name: dep.name().to_string(),
            version: version.to_string(),
            changed: true,
            ..LockedDependency::default()
        };
        self.set_installed(dep, entry, modules_dir)
    }

    /// Upsert an entry, recomputing its hash from the module directory
    pub fn set_installed(
        &mut self,
        dep: &Dependency,
        mut entry: LockedDependency,
        modules_dir: &Path,
    ) -> BossResult<()> {
        entry.hash = content_hash(&modules_dir.join(dep.name()))?;
        self.installed.insert(dep.key(), entry);
        Ok(())
    }

    /// Drop entries whose dependency is no longer part of the install set
    pub fn clean_removed(&mut self, current: &[Dependency]) -> Vec<LockedDependency> {
        let keep: HashSet<String> = current.iter().map(Dependency::key).collect();
        let stale: Vec<String> = self
            .installed
            .keys()
            .filter(|key| !keep.contains(&key.to_lowercase()))
            .cloned()
            .collect();

        stale
            .into_iter()
            .filter_map(|key| {
                info!("Removing {} from lock", key);
                self.installed.remove(&key)
            })
            .collect()
    }

    /// Every artifact file name recorded across all entries
    pub fn artifact_list(&self) -> Vec<String> {
        self.installed
            .values()
            .flat_map(|entry| entry.artifacts.iter().map(|(_, name)| name.to_string()))
            .collect()
    }

    /// Record the outcome of building a node
    pub fn record_build(&mut self, key: &str, success: bool, artifacts: Artifacts) {
        let Some(entry) = self.installed.get_mut(key) else {
            warn!("Build result for {} has no lock entry", key);
            return;
        };
        if success {
            entry.failed = false;
            entry.changed = false;
            entry.artifacts = artifacts;
        } else {
            entry.failed = true;
        }
    }
}

impl DirtyTracker for PackageLock {
    fn is_dirty(&self, key: &str) -> bool {
        self.installed
            .get(key)
            .is_none_or(|entry| entry.changed || entry.failed)
    }

    fn mark_dirty(&mut self, key: &str) {
        if let Some(entry) = self.installed.get_mut(key) {
            entry.changed = true;
        }
    }
}

fn stale_reason(
    locked: &LockedDependency,
    version: &str,
    module_dir: &Path,
    modules_dir: &Path,
) -> Option<String> {
    if locked.failed {
        return Some("previous build failed".to_string());
    }
    if !module_dir.exists() {
        return Some(format!("{} is missing", module_dir.display()));
    }
    if is_newer(version, &locked.version) {
        return Some(format!("{} is newer than {}", version, locked.version));
    }
    if let Some(missing) = locked.artifacts.first_missing(modules_dir) {
        return Some(format!("artifact {} is missing", missing.display()));
    }
    match content_hash(module_dir) {
        Ok(hash) if hash == locked.hash => None,
        Ok(_) => Some("module contents changed".to_string()),
        Err(e) => {
            warn!("Could not hash {}: {}", module_dir.display(), e);
            Some("module contents unreadable".to_string())
        }
    }
}

/// Semantic comparison when both sides are versions, inequality otherwise
fn is_newer(proposed: &str, locked: &str) -> bool {
    match (parse_version(proposed), parse_version(locked)) {
        (Some(proposed), Some(locked)) => proposed > locked,
        _ => proposed != locked,
    }
}

fn manifest_hash(dependencies: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (repository, version) in dependencies {
        hasher.update(repository.to_lowercase().as_bytes());
        hasher.update(b"\0");
        hasher.update(version.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(&hasher.finalize()[..16])
}
