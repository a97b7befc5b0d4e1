//! Git client backed by the `git` executable
//!
//! Every dependency gets a bare mirror under `<cache>/repos/<hashed name>`.
//! Module directories are clones of that mirror, detached at the resolved
//! commit.

use crate::config::schema::GitConfig;
use crate::error::{BossError, BossResult};
use crate::git::{GitClient, Worktree};
use crate::manifest::Dependency;
use crate::resolver::{Reference, ReferenceKind};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Git client using the native git binary
pub struct NativeGit {
    binary: String,
    cache_root: PathBuf,
    prefer_ssh: bool,
}

impl NativeGit {
    pub fn new(config: &GitConfig, cache_root: PathBuf) -> Self {
        Self {
            binary: config.binary.clone(),
            cache_root,
            prefer_ssh: config.prefer_ssh,
        }
    }

    /// Mirror directory of a dependency
    pub fn repo_dir(&self, dep: &Dependency) -> PathBuf {
        self.cache_root.join("repos").join(dep.hashed_name())
    }

    fn clone_url(&self, dep: &Dependency) -> String {
        if self.prefer_ssh && !dep.use_ssh {
            Dependency {
                use_ssh: true,
                ..dep.clone()
            }
            .git_url()
        } else {
            dep.git_url()
        }
    }

    /// Run git and return trimmed stdout
    async fn exec<I, S>(&self, cwd: Option<&Path>, args: I, repository: &str) -> BossResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let shown = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Executing: {} {}", self.binary, shown);

        let mut command = Command::new(&self.binary);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        let output = command
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BossError::GitNotFound,
                _ => BossError::command_failed(format!("{} {}", self.binary, shown), e),
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(BossError::GitCommand {
                repository: repository.to_string(),
                command: shown,
                stderr: crate::process::output_tail(
                    "",
                    String::from_utf8_lossy(&output.stderr).trim(),
                ),
            })
        }
    }

    async fn checkout_inner(
        &self,
        dep: &Dependency,
        reference: &Reference,
        module_dir: &Path,
    ) -> BossResult<()> {
        let mirror = self.repo_dir(dep);
        let repo = dep.repository.as_str();

        if !module_dir.join(".git").exists() {
            if module_dir.exists() {
                tokio::fs::remove_dir_all(module_dir).await.map_err(|e| {
                    BossError::io(format!("removing {}", module_dir.display()), e)
                })?;
            }
            if let Some(parent) = module_dir.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BossError::io(format!("creating {}", parent.display()), e))?;
            }
            self.exec(
                None,
                [
                    OsStr::new("clone"),
                    OsStr::new("--no-checkout"),
                    mirror.as_os_str(),
                    module_dir.as_os_str(),
                ],
                repo,
            )
            .await?;
        } else {
            self.exec(
                Some(module_dir),
                [
                    OsStr::new("fetch"),
                    OsStr::new("--force"),
                    OsStr::new("--tags"),
                    mirror.as_os_str(),
                    OsStr::new(&full_ref(reference)),
                ],
                repo,
            )
            .await?;
        }

        let commit = self.commit_of(dep, reference).await?;
        self.exec(
            Some(module_dir),
            ["checkout", "--force", "--detach", commit.as_str()],
            repo,
        )
        .await?;
        self.exec(Some(module_dir), ["clean", "-fd"], repo).await?;
        Ok(())
    }
}

/// Fully qualified ref name of a reference
fn full_ref(reference: &Reference) -> String {
    match reference.kind {
        ReferenceKind::Tag => format!("refs/tags/{}", reference.name),
        ReferenceKind::Branch => format!("refs/heads/{}", reference.name),
    }
}

/// Parse `for-each-ref --format=%(refname)` output
fn parse_refs(output: &str) -> Vec<Reference> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            if let Some(tag) = line.strip_prefix("refs/tags/") {
                Some(Reference::tag(tag))
            } else {
                line.strip_prefix("refs/heads/").map(Reference::branch)
            }
        })
        .collect()
}

#[async_trait]
impl GitClient for NativeGit {
    async fn ensure_available(&self) -> BossResult<()> {
        let available = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);

        if available {
            Ok(())
        } else {
            Err(BossError::GitNotFound)
        }
    }

    fn has_cache(&self, dep: &Dependency) -> bool {
        self.repo_dir(dep).join("HEAD").exists()
    }

    async fn clone_cache(&self, dep: &Dependency) -> BossResult<()> {
        let dir = self.repo_dir(dep);
        info!("Cloning {}", dep.repository);

        if dir.exists() {
            tokio::fs::remove_dir_all(&dir)
                .await
                .map_err(|e| BossError::io(format!("removing {}", dir.display()), e))?;
        }
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BossError::io(format!("creating {}", parent.display()), e))?;
        }

        let url = self.clone_url(dep);
        self.exec(
            None,
            [
                OsStr::new("clone"),
                OsStr::new("--mirror"),
                OsStr::new(&url),
                dir.as_os_str(),
            ],
            &dep.repository,
        )
        .await?;
        Ok(())
    }

    async fn update_cache(&self, dep: &Dependency) -> BossResult<()> {
        info!("Updating {}", dep.repository);
        self.exec(
            Some(&self.repo_dir(dep)),
            ["remote", "update", "--prune"],
            &dep.repository,
        )
        .await?;
        Ok(())
    }

    async fn get_versions(&self, dep: &Dependency) -> BossResult<Vec<Reference>> {
        let output = self
            .exec(
                Some(&self.repo_dir(dep)),
                ["for-each-ref", "--format=%(refname)", "refs/tags", "refs/heads"],
                &dep.repository,
            )
            .await?;
        Ok(parse_refs(&output))
    }

    async fn worktree(&self, module_dir: &Path) -> BossResult<Option<Worktree>> {
        if !module_dir.join(".git").exists() {
            return Ok(None);
        }
        let name = module_dir.display().to_string();

        let head = match self
            .exec(Some(module_dir), ["rev-parse", "--verify", "HEAD"], &name)
            .await
        {
            Ok(head) => head,
            Err(BossError::GitCommand { stderr, .. }) => {
                debug!("{} has no HEAD: {}", name, stderr);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let status = self
            .exec(Some(module_dir), ["status", "--porcelain"], &name)
            .await?;

        Ok(Some(Worktree {
            head,
            clean: status.is_empty(),
        }))
    }

    async fn commit_of(&self, dep: &Dependency, reference: &Reference) -> BossResult<String> {
        let spec = format!("{}^{{commit}}", full_ref(reference));
        self.exec(
            Some(&self.repo_dir(dep)),
            ["rev-parse", "--verify", spec.as_str()],
            &dep.repository,
        )
        .await
    }

    async fn checkout(
        &self,
        dep: &Dependency,
        reference: &Reference,
        module_dir: &Path,
    ) -> BossResult<()> {
        info!("Checking out {} at {}", dep.repository, reference);
        self.checkout_inner(dep, reference, module_dir)
            .await
            .map_err(|e| match e {
                BossError::GitNotFound => e,
                other => BossError::CheckoutFailed {
                    repository: dep.repository.clone(),
                    reference: reference.name.clone(),
                    reason: other.to_string(),
                },
            })
    }
}
