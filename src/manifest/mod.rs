//! Project manifests and dependency specs
//!
//! Every project and every installed module may carry a `boss.json`
//! declaring the git repositories it depends on.

pub mod dependency;
pub mod package;

pub use dependency::{Dependency, LATEST_VERSION};
pub use package::{Package, MANIFEST_FILE};
