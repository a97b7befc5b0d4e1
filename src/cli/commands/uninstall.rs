//! Uninstall command - drop dependencies and clean their modules

use crate::cli::args::UninstallArgs;
use crate::cli::commands::install::{options, run_install};
use crate::config::Config;
use crate::error::BossResult;
use crate::manifest::{Dependency, Package};
use std::path::Path;
use tracing::warn;

/// Execute the uninstall command
pub async fn execute(args: UninstallArgs, config: &Config, project_dir: &Path) -> BossResult<()> {
    let mut package = Package::load_project(project_dir)?;

    for spec in &args.dependencies {
        let dep = Dependency::parse(spec)?;
        if !package.remove_dependency(&dep) {
            warn!("{} is not a dependency of {}", dep.repository, package.name);
        }
    }
    package.save()?;

    // The install pass drops lock entries, module dirs and artifacts of
    // everything no longer reachable
    let options = options(config, args.build, true);
    run_install(config, &mut package, &[], &options, "boss uninstall").await
}
