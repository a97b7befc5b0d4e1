//! Boss - dependency manager for Delphi projects
//!
//! Resolves `boss.json` dependencies against git tags, checks them out under
//! `modules/`, records install state in `boss-lock.json` and rebuilds only
//! the modules whose sources or dependencies changed.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod git;
pub mod graph;
pub mod installer;
pub mod lock;
pub mod manifest;
mod process;
pub mod resolver;
pub mod ui;

pub use error::{BossError, BossResult};
