//! Config command - show configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::BossResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> BossResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager, config),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> BossResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager, config: &Config) {
    let ctx = UiContext::non_interactive();
    ui::key_value(&ctx, "config", &manager.path().display().to_string());
    ui::key_value(
        &ctx,
        "cache",
        &ConfigManager::cache_dir(config).display().to_string(),
    );
}

async fn init_config(manager: &ConfigManager, force: bool) -> BossResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_writes_defaults_once() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::new(Some(temp.path().join("config.toml")));

        init_config(&manager, false).await.unwrap();
        assert!(manager.path().exists());

        std::fs::write(manager.path(), "[compiler]\nplatform = \"Win64\"\n").unwrap();
        init_config(&manager, false).await.unwrap();
        assert_eq!(manager.load().await.unwrap().compiler.platform, "Win64");

        init_config(&manager, true).await.unwrap();
        assert_eq!(manager.load().await.unwrap().compiler.platform, "Win32");
    }
}
