//! MSBuild driver for Delphi projects

use crate::compiler::Compiler;
use crate::config::schema::CompilerConfig;
use crate::error::{BossError, BossResult};
use crate::graph::Node;
use crate::lock::{ArtifactKind, Artifacts, Snapshot};
use crate::manifest::Package;
use crate::process::{error_tail, stream_child_output};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Compiles every `projects` entry of a module manifest with msbuild
pub struct MsBuild {
    config: CompilerConfig,
}

impl MsBuild {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Arguments for building one project into the shared output dirs
    fn build_args(&self, project: &Path, modules_dir: &Path) -> Vec<String> {
        let dir = |kind: ArtifactKind| kind.dir(modules_dir).display().to_string();
        let mut args = vec![
            project.display().to_string(),
            "/t:Build".to_string(),
            format!("/p:Config={}", self.config.configuration),
            format!("/p:Platform={}", self.config.platform),
            format!("/p:DCC_ExeOutput={}", dir(ArtifactKind::Bin)),
            format!("/p:DCC_DcpOutput={}", dir(ArtifactKind::Dcp)),
            format!("/p:DCC_DcuOutput={}", dir(ArtifactKind::Dcu)),
            format!("/p:DCC_BplOutput={}", dir(ArtifactKind::Bpl)),
            format!(
                "/p:DCC_UnitSearchPath={};{}",
                dir(ArtifactKind::Dcu),
                dir(ArtifactKind::Dcp)
            ),
        ];
        args.extend(self.config.args.iter().cloned());
        args
    }

    async fn build_project(&self, project: &Path, modules_dir: &Path) -> BossResult<()> {
        let args = self.build_args(project, modules_dir);
        debug!("Executing: {} {:?}", self.config.command, args);

        let mut child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BossError::command_failed(&self.config.command, e))?;

        let lines = stream_child_output(&mut child, &|line: String| debug!("{}", line)).await;
        let status = child
            .wait()
            .await
            .map_err(|e| BossError::command_failed(&self.config.command, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(BossError::CompilerFailed {
                project: project.display().to_string(),
                output: error_tail(&lines),
            })
        }
    }
}

#[async_trait]
impl Compiler for MsBuild {
    async fn build(&self, node: &Node, modules_dir: &Path) -> BossResult<Artifacts> {
        let module_dir = modules_dir.join(node.name());
        let projects = match Package::load_optional(&module_dir)? {
            Some(package) => package.projects,
            None => vec![],
        };
        if projects.is_empty() {
            debug!("{} declares no projects", node);
            return Ok(Artifacts::default());
        }

        for kind in ArtifactKind::ALL {
            let dir = kind.dir(modules_dir);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| BossError::io(format!("creating {}", dir.display()), e))?;
        }

        let before = Snapshot::take(modules_dir);
        for project in &projects {
            info!("Compiling {}", project);
            self.build_project(&module_dir.join(project), modules_dir)
                .await?;
        }

        Ok(Artifacts::produced_since(modules_dir, &before))
    }
}
