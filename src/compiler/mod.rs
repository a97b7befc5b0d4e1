//! Compiler abstraction and build queue driver

mod msbuild;

pub use msbuild::MsBuild;

use crate::error::BossResult;
use crate::graph::Node;
use crate::lock::{Artifacts, PackageLock};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

/// Builds one module into the shared artifact directories
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile the module of `node`, returning the files it produced
    async fn build(&self, node: &Node, modules_dir: &Path) -> BossResult<Artifacts>;
}

/// Outcome of a build pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Module names built successfully, in build order
    pub built: Vec<String>,

    /// Module names whose build failed
    pub failed: Vec<String>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Build every node of `queue` in order, recording outcomes in `lock`
///
/// A failed build marks its entry `failed` and the pass moves on. Only
/// fatal errors abort the pass.
pub async fn build_queue(
    compiler: &dyn Compiler,
    queue: &[Node],
    lock: &mut PackageLock,
    modules_dir: &Path,
) -> BossResult<BuildReport> {
    let mut report = BuildReport::default();

    for node in queue {
        info!("Building {}", node);
        match compiler.build(node, modules_dir).await {
            Ok(artifacts) => {
                lock.record_build(&node.key, true, artifacts);
                if let Some(entry) = lock.get(&node.dependency).cloned() {
                    // Build output inside the module must not read as drift next run
                    if let Err(e) = lock.set_installed(&node.dependency, entry, modules_dir) {
                        warn!("Could not rehash {}: {}", node, e);
                    }
                }
                report.built.push(node.name().to_string());
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Build of {} failed: {}", node, e);
                lock.record_build(&node.key, false, Artifacts::default());
                report.failed.push(node.name().to_string());
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BossError;
    use crate::manifest::Dependency;
    use std::fs;
    use tempfile::TempDir;

    struct FailOn(&'static str);

    #[async_trait]
    impl Compiler for FailOn {
        async fn build(&self, node: &Node, _: &Path) -> BossResult<Artifacts> {
            if node.name() == self.0 {
                return Err(BossError::CompilerFailed {
                    project: node.name().to_string(),
                    output: "E2003 Undeclared identifier".to_string(),
                });
            }
            Ok(Artifacts {
                bpl: vec![format!("{}.bpl", node.name())],
                ..Artifacts::default()
            })
        }
    }

    fn installed(temp: &TempDir, lock: &mut PackageLock, name: &str) -> Node {
        let dep = Dependency::parse(name).unwrap();
        fs::create_dir_all(temp.path().join(name)).unwrap();
        lock.add_dependency(&dep, "1.0.0", temp.path()).unwrap();
        Node::new(dep)
    }

    #[tokio::test]
    async fn failure_is_recorded_and_queue_continues() {
        let temp = TempDir::new().unwrap();
        let mut lock = PackageLock::default();
        let queue = vec![
            installed(&temp, &mut lock, "c"),
            installed(&temp, &mut lock, "b"),
            installed(&temp, &mut lock, "a"),
        ];

        let report = build_queue(&FailOn("b"), &queue, &mut lock, temp.path())
            .await
            .unwrap();

        assert_eq!(report.built, vec!["c", "a"]);
        assert_eq!(report.failed, vec!["b"]);
        assert!(!report.is_success());

        let b = lock.get(&queue[1].dependency).unwrap();
        assert!(b.failed);
        let c = lock.get(&queue[0].dependency).unwrap();
        assert!(!c.failed && !c.changed);
        assert_eq!(c.artifacts.bpl, vec!["c.bpl"]);
    }

    #[tokio::test]
    async fn rehashes_after_build() {
        let temp = TempDir::new().unwrap();
        let mut lock = PackageLock::default();
        let node = installed(&temp, &mut lock, "c");
        fs::write(temp.path().join("c").join("c.res"), "generated").unwrap();

        build_queue(&FailOn("none"), &[node.clone()], &mut lock, temp.path())
            .await
            .unwrap();

        let entry = lock.get(&node.dependency).unwrap();
        assert_eq!(
            entry.hash,
            crate::lock::content_hash(&temp.path().join("c")).unwrap()
        );
    }
}
