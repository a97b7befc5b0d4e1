//! Install orchestration
//!
//! Discovers the full dependency set of a project, brings every module
//! directory to its resolved reference, records the outcome in the lock and
//! builds the stale part of the graph in dependency order.

mod session;

pub use session::InstallSession;

use crate::compiler::{build_queue, BuildReport, Compiler};
use crate::error::{BossError, BossResult};
use crate::git::GitClient;
use crate::graph::GraphItem;
use crate::lock::{artifacts, PackageLock};
use crate::manifest::{Dependency, Package};
use crate::resolver::{self, parse_version, pinned_constraint, Constraint};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory under the project root holding checked-out modules
pub const MODULES_DIR: &str = "modules";

/// Knobs of one install pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Keep locked versions that still satisfy their constraint (`install`)
    /// instead of re-resolving against the remote (`update`)
    pub use_locked_version: bool,

    /// Run the compiler over the build queue
    pub build: bool,

    /// Rebuild every module, not just the dirty ones
    pub force_build: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            use_locked_version: true,
            build: true,
            force_build: false,
        }
    }
}

/// What an install pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Modules checked out at a new reference
    pub checked_out: Vec<String>,

    /// Modules left alone because their locked version still fits
    pub skipped: Vec<String>,

    /// Dependencies that could not be fetched or resolved
    pub unresolved: Vec<String>,

    /// Modules dropped from the lock
    pub removed: Vec<String>,

    /// Outcome of the build pass, when one ran
    pub build: Option<BuildReport>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.unresolved.is_empty() && self.build.as_ref().is_none_or(BuildReport::is_success)
    }
}

/// Drives installs of a project through a git client and a compiler
pub struct Installer {
    git: Arc<dyn GitClient>,
    compiler: Arc<dyn Compiler>,
    session: InstallSession,
}

impl Installer {
    pub fn new(git: Arc<dyn GitClient>, compiler: Arc<dyn Compiler>) -> Self {
        Self {
            git,
            compiler,
            session: InstallSession::new(),
        }
    }

    /// Install `requested` (added to the manifest first) and everything the
    /// manifest already declares
    pub async fn install(
        &self,
        package: &mut Package,
        requested: &[Dependency],
        options: &InstallOptions,
    ) -> BossResult<InstallReport> {
        self.git.ensure_available().await?;

        for dep in requested {
            package.add_dependency(dep);
        }
        if !requested.is_empty() {
            package.save()?;
        }

        let modules_dir = package.dir().join(MODULES_DIR);
        let declared = package.dependency_list()?;
        let declared_keys: HashSet<String> = declared.iter().map(Dependency::key).collect();
        let mut report = InstallReport::default();
        let mut pins = Vec::new();
        let mut all = Vec::new();

        self.session.begin();
        let mut pending: VecDeque<Dependency> = declared.into_iter().collect();
        loop {
            while let Some(dep) = pending.pop_front() {
                if !self.session.mark_processed(&dep.key()) {
                    continue;
                }

                match self
                    .ensure_module(&mut package.lock, &dep, &modules_dir, options)
                    .await
                {
                    Ok(Outcome::Skipped) => report.skipped.push(dep.name().to_string()),
                    Ok(Outcome::Installed { checked_out, pin }) => {
                        if checked_out {
                            report.checked_out.push(dep.name().to_string());
                        }
                        if let Some(pin) = pin.filter(|_| declared_keys.contains(&dep.key())) {
                            pins.push((dep.clone(), pin));
                        }
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!("Skipping {}: {}", dep.repository, e);
                        report.unresolved.push(dep.name().to_string());
                    }
                }

                pending.extend(module_dependencies(&modules_dir.join(dep.name())));
                all.push(dep);
            }

            pending.extend(self.untracked_on_disk(&package.lock, &modules_dir));
            if pending.is_empty() {
                break;
            }
        }

        for removed in package.lock.clean_removed(&all) {
            remove_module_dir(&modules_dir, &removed.name, &all)?;
            report.removed.push(removed.name);
        }
        artifacts::remove_orphaned(&modules_dir, &package.lock.artifact_list())?;

        if !pins.is_empty() {
            for (dep, pin) in &pins {
                info!("Pinned {} to {}", dep.repository, pin);
                package.set_version(dep, pin);
            }
            package.save()?;
        }
        package.save_lock()?;

        if options.build {
            let graph = GraphItem::load(&all, &modules_dir);
            let mut queue = graph.queue(&mut package.lock, options.force_build)?;
            queue.retain(|node| {
                let present = modules_dir.join(node.name()).is_dir();
                if !present {
                    warn!("{} is not installed, skipping build", node);
                }
                present
            });
            debug!(
                "Build queue: {}",
                queue.iter().map(|n| n.name()).collect::<Vec<_>>().join(", ")
            );
            let build =
                build_queue(self.compiler.as_ref(), &queue, &mut package.lock, &modules_dir)
                    .await?;
            package.save_lock()?;
            report.build = Some(build);
        }

        Ok(report)
    }

    /// Bring one module directory to its resolved reference
    async fn ensure_module(
        &self,
        lock: &mut PackageLock,
        dep: &Dependency,
        modules_dir: &Path,
        options: &InstallOptions,
    ) -> BossResult<Outcome> {
        let module_dir = modules_dir.join(dep.name());

        if let Some(version) = should_skip(lock, dep, &module_dir, options) {
            debug!("{} {} already installed", dep.repository, version);
            lock.need_update(dep, &version, modules_dir);
            return Ok(Outcome::Skipped);
        }

        self.refresh_cache(dep).await?;
        let refs = self.git.get_versions(dep).await?;
        let reference = match resolver::resolve(
            &dep.version,
            &refs,
            lock.get(dep),
            options.use_locked_version,
        ) {
            Some(reference) => reference,
            None => {
                warn!(
                    "No version of {} matches {}, using the default branch",
                    dep.repository, dep.version
                );
                self.git.get_main(dep).await?
            }
        };
        let pin = (dep.is_unpinned() && reference.is_tag()).then(|| pinned_constraint(&reference));

        let target = self.git.commit_of(dep, &reference).await?;
        let worktree = self
            .git
            .worktree(&module_dir)
            .await
            .map_err(|e| BossError::CheckoutFailed {
                repository: dep.repository.clone(),
                reference: reference.name.clone(),
                reason: e.to_string(),
            })?;
        let checked_out = !worktree.is_some_and(|wt| wt.clean && wt.head == target);
        if checked_out {
            self.git.checkout(dep, &reference, &module_dir).await?;
        }

        let stale = lock.need_update(dep, &reference.name, modules_dir);
        if checked_out || stale {
            let mut entry = lock.get(dep).cloned().unwrap_or_default();
            entry.name = dep.name().to_string();
            entry.version = reference.name.clone();
            entry.changed = true;
            entry.failed = false;
            lock.set_installed(dep, entry, modules_dir)?;
        }

        Ok(Outcome::Installed { checked_out, pin })
    }

    /// Clone or fetch the cache mirror, once per session
    async fn refresh_cache(&self, dep: &Dependency) -> BossResult<()> {
        if !self.session.mark_refreshed(&dep.key()) {
            return Ok(());
        }
        if self.git.has_cache(dep) {
            self.git.update_cache(dep).await
        } else {
            self.git.clone_cache(dep).await
        }
    }

    /// Dependencies of module directories the lock does not track, such as
    /// modules copied in by hand
    fn untracked_on_disk(&self, lock: &PackageLock, modules_dir: &Path) -> Vec<Dependency> {
        let Ok(entries) = fs::read_dir(modules_dir) else {
            return vec![];
        };
        let tracked: HashSet<String> = lock
            .installed
            .values()
            .map(|entry| entry.name.to_lowercase())
            .collect();

        entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().to_lowercase();
                !name.starts_with('.') && !tracked.contains(&name)
            })
            .flat_map(|entry| module_dependencies(&entry.path()))
            .filter(|dep| !self.session.is_processed(&dep.key()))
            .collect()
    }
}

enum Outcome {
    Skipped,
    Installed { checked_out: bool, pin: Option<String> },
}

/// Locked version to keep when the remote need not be contacted
///
/// Only with `use_locked_version`, an existing module directory, and a
/// locked version that satisfies the constraint or is at least its lower
/// bound.
fn should_skip(
    lock: &PackageLock,
    dep: &Dependency,
    module_dir: &Path,
    options: &InstallOptions,
) -> Option<String> {
    if !options.use_locked_version || !module_dir.exists() {
        return None;
    }
    let locked = lock.get(dep)?;
    let fits = match Constraint::parse(&dep.version) {
        Ok(constraint) => {
            constraint.matches_name(&locked.version)
                || parse_version(&locked.version).is_some_and(|v| v >= constraint.lower_bound())
        }
        Err(_) => locked.version == dep.version.trim(),
    };
    fits.then(|| locked.version.clone())
}

/// Declared dependencies of a checked-out module, empty when unreadable
fn module_dependencies(module_dir: &Path) -> Vec<Dependency> {
    match Package::load_optional(module_dir).and_then(|p| match p {
        Some(package) => package.dependency_list(),
        None => Ok(vec![]),
    }) {
        Ok(deps) => deps,
        Err(e) => {
            warn!("Ignoring dependencies of {}: {}", module_dir.display(), e);
            vec![]
        }
    }
}

/// Delete the directory of a removed module unless a remaining dependency
/// still uses the same name
fn remove_module_dir(modules_dir: &Path, name: &str, remaining: &[Dependency]) -> BossResult<()> {
    if name.is_empty() || remaining.iter().any(|d| d.name().eq_ignore_ascii_case(name)) {
        return Ok(());
    }
    let dir = modules_dir.join(name);
    if dir.exists() {
        info!("Removing {}", dir.display());
        fs::remove_dir_all(&dir)
            .map_err(|e| BossError::io(format!("removing {}", dir.display()), e))?;
    }
    Ok(())
}
