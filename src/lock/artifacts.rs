//! Build artifact bookkeeping
//!
//! Compiled output of every module lands in shared directories under the
//! modules root (`.bin`, `.dcp`, `.dcu`, `.bpl`). Lock entries record the
//! file names each module produced.

use crate::error::{BossError, BossResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Kinds of compiler output tracked per module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// Executables
    Bin,
    /// Compiled package interfaces
    Dcp,
    /// Compiled units
    Dcu,
    /// Runtime packages
    Bpl,
}

impl ArtifactKind {
    /// All kinds, in output directory order
    pub const ALL: [ArtifactKind; 4] = [Self::Bin, Self::Dcp, Self::Dcu, Self::Bpl];

    /// Output directory name under the modules root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Bin => ".bin",
            Self::Dcp => ".dcp",
            Self::Dcu => ".dcu",
            Self::Bpl => ".bpl",
        }
    }

    /// Output directory under `modules_dir`
    pub fn dir(&self, modules_dir: &Path) -> PathBuf {
        modules_dir.join(self.dir_name())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name().trim_start_matches('.'))
    }
}

/// File names produced by one module, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifacts {
    pub bin: Vec<String>,
    pub dcp: Vec<String>,
    pub dcu: Vec<String>,
    pub bpl: Vec<String>,
}

impl Artifacts {
    pub fn get(&self, kind: ArtifactKind) -> &[String] {
        match kind {
            ArtifactKind::Bin => &self.bin,
            ArtifactKind::Dcp => &self.dcp,
            ArtifactKind::Dcu => &self.dcu,
            ArtifactKind::Bpl => &self.bpl,
        }
    }

    pub fn get_mut(&mut self, kind: ArtifactKind) -> &mut Vec<String> {
        match kind {
            ArtifactKind::Bin => &mut self.bin,
            ArtifactKind::Dcp => &mut self.dcp,
            ArtifactKind::Dcu => &mut self.dcu,
            ArtifactKind::Bpl => &mut self.bpl,
        }
    }

    /// Every recorded file with its kind
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &str)> {
        ArtifactKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |n| (kind, n.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Files created or rewritten since `before` was taken
    pub fn produced_since(modules_dir: &Path, before: &Snapshot) -> Self {
        let mut artifacts = Self::default();
        for (path, modified) in Snapshot::take(modules_dir).files {
            if before.files.get(&path) == Some(&modified) {
                continue;
            }
            let (kind, name) = path;
            artifacts.get_mut(kind).push(name);
        }
        artifacts
    }

    /// First recorded file missing from its output directory
    pub fn first_missing(&self, modules_dir: &Path) -> Option<PathBuf> {
        self.iter()
            .map(|(kind, name)| kind.dir(modules_dir).join(name))
            .find(|path| !path.exists())
    }
}

/// Modification times of every file in the artifact directories
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    files: BTreeMap<(ArtifactKind, String), Option<SystemTime>>,
}

impl Snapshot {
    pub fn take(modules_dir: &Path) -> Self {
        let mut files = BTreeMap::new();
        for kind in ArtifactKind::ALL {
            let Ok(entries) = fs::read_dir(kind.dir(modules_dir)) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(meta) = entry.metadata() else {
                    continue;
                };
                if meta.is_file() {
                    let name = entry.file_name().to_string_lossy().to_string();
                    files.insert((kind, name), meta.modified().ok());
                }
            }
        }
        Self { files }
    }
}

/// Delete files in the artifact directories that no lock entry claims
///
/// Returns the number of files removed.
pub fn remove_orphaned(modules_dir: &Path, known: &[String]) -> BossResult<usize> {
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();
    let mut removed = 0;

    for kind in ArtifactKind::ALL {
        let dir = kind.dir(modules_dir);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue, // Not created yet
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if known.contains(name.as_str()) {
                continue;
            }
            debug!("Removing orphaned artifact {}", path.display());
            fs::remove_file(&path)
                .map_err(|e| BossError::io(format!("removing artifact {}", path.display()), e))?;
            removed += 1;
        }
    }

    if removed > 0 {
        info!("Removed {} orphaned artifact(s)", removed);
    }
    Ok(removed)
}
