//! Install and update commands

use crate::cli::args::{BuildArgs, InstallArgs};
use crate::compiler::MsBuild;
use crate::config::{Config, ConfigManager};
use crate::error::{BossError, BossResult};
use crate::git::NativeGit;
use crate::installer::{InstallOptions, InstallReport, Installer};
use crate::manifest::{Dependency, Package};
use crate::ui::{self, UiContext};
use std::path::Path;
use std::sync::Arc;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config, project_dir: &Path) -> BossResult<()> {
    let requested = args
        .dependencies
        .iter()
        .map(|spec| Dependency::parse(spec))
        .collect::<BossResult<Vec<_>>>()?;

    let mut package = Package::load_project(project_dir)?;
    let options = options(config, args.build, true);
    run_install(config, &mut package, &requested, &options, "boss install").await
}

/// Execute the update command
pub async fn update(args: BuildArgs, config: &Config, project_dir: &Path) -> BossResult<()> {
    let mut package = Package::load_project(project_dir)?;
    let options = options(config, args, false);
    run_install(config, &mut package, &[], &options, "boss update").await
}

pub(crate) fn options(config: &Config, build: BuildArgs, use_locked_version: bool) -> InstallOptions {
    InstallOptions {
        use_locked_version,
        build: config.compiler.enabled && !build.no_build,
        force_build: build.force_build,
    }
}

/// Installer wired to the native git client and msbuild
pub(crate) fn installer(config: &Config) -> Installer {
    let git = NativeGit::new(&config.git, ConfigManager::cache_dir(config));
    let compiler = MsBuild::new(config.compiler.clone());
    Installer::new(Arc::new(git), Arc::new(compiler))
}

/// Run the install pipeline and print its report
pub(crate) async fn run_install(
    config: &Config,
    package: &mut Package,
    requested: &[Dependency],
    options: &InstallOptions,
    title: &str,
) -> BossResult<()> {
    let ctx = UiContext::detect();
    ui::intro(&ctx, title);

    let report = installer(config)
        .install(package, requested, options)
        .await?;
    print_report(&ctx, &report);

    let failures = report.unresolved.len()
        + report.build.as_ref().map_or(0, |build| build.failed.len());
    if failures == 0 {
        ui::outro_success(&ctx, "Dependencies up to date");
        Ok(())
    } else {
        ui::outro_warn(&ctx, "Finished with errors");
        Err(BossError::User(format!(
            "{} dependenc{} failed to install or build",
            failures,
            if failures == 1 { "y" } else { "ies" }
        )))
    }
}

fn print_report(ctx: &UiContext, report: &InstallReport) {
    for name in &report.checked_out {
        ui::step_ok_detail(ctx, name, "checked out");
    }
    if !report.skipped.is_empty() {
        ui::remark(
            ctx,
            &format!("{} already at the locked version", report.skipped.len()),
        );
    }
    for name in &report.unresolved {
        ui::step_warn_hint(ctx, &format!("{} could not be installed", name), "Run with -v for details");
    }
    for name in &report.removed {
        ui::step_info(ctx, &format!("Removed {}", name));
    }

    match &report.build {
        Some(build) => {
            for name in &build.built {
                ui::step_ok_detail(ctx, name, "built");
            }
            for name in &build.failed {
                ui::step_error(ctx, &format!("Build of {} failed", name));
            }
        }
        None => ui::remark(ctx, "Build skipped"),
    }
}
