//! Dependency spec parsing
//!
//! A dependency is a git repository addressed by URL plus a version
//! constraint. Specs accepted on the command line and as manifest keys:
//!
//! ```text
//! [scheme://]host/path[.git][:version|@version][:ssh]
//! ```
//!
//! Bare `name` expands to `github.com/hashload/name` and `owner/name`
//! expands to `github.com/owner/name`.

use crate::error::{BossError, BossResult};
use sha2::{Digest, Sha256};
use std::fmt;

/// Version spec meaning "no constraint yet, take the latest"
pub const LATEST_VERSION: &str = ">0.0.0";

const DEFAULT_HOST: &str = "github.com";
const DEFAULT_OWNER: &str = "hashload";
const SSH_SUFFIX: &str = ":ssh";

/// A repository plus the version constraint requested for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Normalized repository path, e.g. `github.com/hashload/horse`
    pub repository: String,

    /// Version constraint, `>0.0.0` when unconstrained
    pub version: String,

    /// Clone over SSH instead of HTTPS
    pub use_ssh: bool,
}

impl Dependency {
    /// Parse a dependency spec string
    pub fn parse(spec: &str) -> BossResult<Self> {
        let invalid = |reason: &str| BossError::InvalidDependency {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = spec.trim();
        if rest.is_empty() {
            return Err(invalid("empty spec"));
        }

        let mut use_ssh = false;
        // `get` rather than indexing: the suffix may start inside a multibyte char
        let ssh_at = rest.len().checked_sub(SSH_SUFFIX.len()).filter(|&at| {
            at > 0 && rest.get(at..).is_some_and(|tail| tail.eq_ignore_ascii_case(SSH_SUFFIX))
        });
        if let Some(at) = ssh_at {
            use_ssh = true;
            rest = &rest[..at];
        }

        // scp-like `git@host:owner/repo`
        let scp;
        if let Some(stripped) = rest.strip_prefix("git@") {
            use_ssh = true;
            scp = stripped.replacen(':', "/", 1);
            rest = &scp;
        } else if let Some((scheme, after_scheme)) = rest.split_once("://") {
            if scheme.eq_ignore_ascii_case("ssh") {
                use_ssh = true;
            }
            rest = after_scheme;
            // userinfo, e.g. ssh://git@host/path
            if let Some((user, host_and_path)) = rest.split_once('@') {
                if !user.contains('/') {
                    rest = host_and_path;
                }
            }
        }

        let (repository, version) = split_version(rest);
        let repository = repository
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .trim_matches('/');

        if repository.is_empty() {
            return Err(invalid("missing repository"));
        }
        if repository.chars().any(char::is_whitespace) {
            return Err(invalid("repository must not contain whitespace"));
        }
        if repository.split('/').any(|segment| segment.is_empty()) {
            return Err(invalid("empty path segment"));
        }

        let version = version.trim();
        Ok(Self {
            repository: expand_repository(repository),
            version: if version.is_empty() {
                LATEST_VERSION.to_string()
            } else {
                version.to_string()
            },
            use_ssh,
        })
    }

    /// Build a dependency from a manifest entry (`repository: version`)
    pub fn from_manifest(key: &str, version: &str) -> BossResult<Self> {
        let mut dep = Self::parse(key)?;
        let version = version.trim();
        if !version.is_empty() {
            dep.version = version.to_string();
        }
        Ok(dep)
    }

    /// Last path segment of the repository, used as the module directory name
    pub fn name(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Case-insensitive identity used for lock entries and graph nodes
    pub fn key(&self) -> String {
        self.repository.to_lowercase()
    }

    /// Filesystem-safe cache directory name derived from the identity
    pub fn hashed_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Clone URL for the repository
    pub fn git_url(&self) -> String {
        if self.use_ssh {
            match self.repository.split_once('/') {
                Some((host, path)) => format!("git@{}:{}.git", host, path),
                None => format!("git@{}.git", self.repository),
            }
        } else {
            format!("https://{}.git", self.repository)
        }
    }

    /// Key to write back into a manifest's dependency table
    pub fn manifest_key(&self) -> String {
        if self.use_ssh {
            format!("{}{}", self.repository, SSH_SUFFIX)
        } else {
            self.repository.clone()
        }
    }

    /// Whether the version is still the unconstrained sentinel
    pub fn is_unpinned(&self) -> bool {
        self.version == LATEST_VERSION
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.version)
    }
}

/// Split `repo@version` or `repo:version` (colon only after the last `/`)
fn split_version(spec: &str) -> (&str, &str) {
    if let Some((repo, version)) = spec.rsplit_once('@') {
        return (repo, version);
    }
    let last_segment_start = spec.rfind('/').map(|i| i + 1).unwrap_or(0);
    match spec[last_segment_start..].find(':') {
        Some(offset) => {
            let at = last_segment_start + offset;
            (&spec[..at], &spec[at + 1..])
        }
        None => (spec, ""),
    }
}

fn expand_repository(repository: &str) -> String {
    let segments: Vec<&str> = repository.split('/').collect();
    match segments.as_slice() {
        [name] => format!("{}/{}/{}", DEFAULT_HOST, DEFAULT_OWNER, name),
        [owner, name] if !owner.contains('.') => format!("{}/{}/{}", DEFAULT_HOST, owner, name),
        _ => repository.to_string(),
    }
}
