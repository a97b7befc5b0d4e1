//! CLI command implementations

pub mod config;
pub mod dependencies;
pub mod init;
pub mod install;
pub mod run;
pub mod uninstall;

pub use config::execute as config;
pub use dependencies::execute as dependencies;
pub use init::execute as init;
pub use install::{execute as install, update};
pub use run::execute as run;
pub use uninstall::execute as uninstall;
