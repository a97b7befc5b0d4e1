//! Init command - create boss.json

use crate::cli::args::InitArgs;
use crate::error::{BossError, BossResult};
use crate::manifest::{Package, MANIFEST_FILE};
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the init command
pub async fn execute(args: InitArgs, project_dir: &Path) -> BossResult<()> {
    let ctx = UiContext::detect();
    let manifest_path = project_dir.join(MANIFEST_FILE);

    if manifest_path.exists() && !args.force {
        return Err(BossError::User(format!(
            "{} already exists. Use --force to overwrite.",
            manifest_path.display()
        )));
    }

    tokio::fs::create_dir_all(project_dir)
        .await
        .map_err(|e| BossError::io(format!("creating {}", project_dir.display()), e))?;

    let name = args.name.unwrap_or_else(|| default_name(project_dir));
    Package::init(project_dir, name).save()?;

    ui::step_ok_detail(
        &ctx,
        "Created project manifest",
        &manifest_path.display().to_string(),
    );
    ui::remark(&ctx, "Add dependencies with: boss install <dependency>");

    Ok(())
}

/// Directory name, or a generic name for roots and unnamed paths
fn default_name(dir: &Path) -> String {
    std::path::absolute(dir)
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}
