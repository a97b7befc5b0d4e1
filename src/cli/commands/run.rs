//! Run command - execute a script declared in boss.json

use crate::cli::args::RunArgs;
use crate::error::{BossError, BossResult};
use crate::manifest::{Package, MANIFEST_FILE};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Execute the run command
pub async fn execute(args: RunArgs, project_dir: &Path) -> BossResult<()> {
    let package = Package::load(&project_dir.join(MANIFEST_FILE))?;
    let script = package
        .scripts
        .get(&args.script)
        .ok_or_else(|| BossError::ScriptNotFound(args.script.clone()))?;

    let code = exec_interactive(script, project_dir).await?;
    if code == 0 {
        Ok(())
    } else {
        Err(BossError::command_exec(
            script.as_str(),
            format!("script '{}' exited with code {}", args.script, code),
        ))
    }
}

/// Run a command line through the platform shell with inherited stdio
async fn exec_interactive(command_line: &str, cwd: &Path) -> BossResult<i32> {
    debug!("Executing interactively: {}", command_line);

    let mut command = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command_line]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command_line]);
        cmd
    };

    let status = command
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| BossError::command_failed(command_line, e))?;

    Ok(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(scripts: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            format!(r#"{{"name": "app", "scripts": {}}}"#, scripts),
        )
        .unwrap();
        temp
    }

    fn run_args(script: &str) -> RunArgs {
        RunArgs {
            script: script.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_script() {
        let temp = project("{}");
        let err = execute(run_args("test"), temp.path()).await.unwrap_err();
        assert!(matches!(err, BossError::ScriptNotFound(name) if name == "test"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_in_project_dir() {
        let temp = project(r#"{"touch": "touch ran.txt"}"#);
        execute(run_args("touch"), temp.path()).await.unwrap();
        assert!(temp.path().join("ran.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_script_is_an_error() {
        let temp = project(r#"{"fail": "exit 3"}"#);
        let err = execute(run_args("fail"), temp.path()).await.unwrap_err();
        assert!(err.to_string().contains("code 3"));
    }
}
