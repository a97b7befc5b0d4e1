//! Git transport abstraction
//!
//! Installs talk to remotes only through [`GitClient`], so the resolution
//! and checkout flow can run against a fake in tests.

mod native;

pub use native::NativeGit;

use crate::error::{BossError, BossResult};
use crate::manifest::Dependency;
use crate::resolver::Reference;
use async_trait::async_trait;
use std::path::Path;

/// State of a checked-out module directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    /// Commit currently checked out
    pub head: String,

    /// No tracked or untracked modifications
    pub clean: bool,
}

/// Operations the installer needs from git
#[async_trait]
pub trait GitClient: Send + Sync {
    /// Fail with `GitNotFound` when no usable git is installed
    async fn ensure_available(&self) -> BossResult<()>;

    /// Whether a cache mirror exists for the dependency
    fn has_cache(&self, dep: &Dependency) -> bool;

    /// Create the cache mirror
    async fn clone_cache(&self, dep: &Dependency) -> BossResult<()>;

    /// Fetch new references into an existing mirror
    async fn update_cache(&self, dep: &Dependency) -> BossResult<()>;

    /// Tags and branches known to the mirror
    async fn get_versions(&self, dep: &Dependency) -> BossResult<Vec<Reference>>;

    /// Default branch: `main`, else `master`
    async fn get_main(&self, dep: &Dependency) -> BossResult<Reference> {
        let refs = self.get_versions(dep).await?;
        ["main", "master"]
            .iter()
            .find_map(|name| refs.iter().find(|r| !r.is_tag() && r.name == *name))
            .cloned()
            .ok_or_else(|| BossError::NoDefaultBranch(dep.repository.clone()))
    }

    /// Inspect a module directory, `None` when it is not a checkout
    async fn worktree(&self, module_dir: &Path) -> BossResult<Option<Worktree>>;

    /// Commit a reference points at
    async fn commit_of(&self, dep: &Dependency, reference: &Reference) -> BossResult<String>;

    /// Check the module directory out at `reference`, discarding local edits
    async fn checkout(
        &self,
        dep: &Dependency,
        reference: &Reference,
        module_dir: &Path,
    ) -> BossResult<()>;
}
