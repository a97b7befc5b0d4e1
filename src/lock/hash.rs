//! Module directory content hashing
//!
//! The hash is a drift sentinel: it covers every file path and file body
//! under a module directory (sorted, `/`-separated, `.git` excluded), so any
//! edit, addition or removal changes it.

use crate::error::{BossError, BossResult};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

const SKIPPED_DIRS: &[&str] = &[".git"];

fn collect_files(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> BossResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| BossError::io(format!("reading directory {}", dir.display()), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| BossError::io(format!("reading entry in {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_DIRS.contains(&n));
            if !skipped {
                collect_files(base, &path, out)?;
            }
            continue;
        }
        if path.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}

/// SHA-256 over the recursive listing and contents of `dir`, hex encoded
pub fn content_hash(dir: &Path) -> BossResult<String> {
    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)?;
    files.sort_by_key(|p| normalize(p));

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    for rel in files {
        hasher.update(b"F\0");
        hasher.update(normalize(&rel).as_bytes());
        hasher.update(b"\0");

        let path = dir.join(&rel);
        let mut file = File::open(&path)
            .map_err(|e| BossError::io(format!("opening {}", path.display()), e))?;
        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| BossError::io(format!("reading {}", path.display()), e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        hasher.update(b"\0");
    }

    Ok(hex::encode(hasher.finalize()))
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn module() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/Horse.pas"), "unit Horse;").unwrap();
        fs::write(dir.path().join("boss.json"), "{}").unwrap();
        dir
    }

    #[test]
    fn hash_deterministic() {
        let dir = module();
        let first = content_hash(dir.path()).unwrap();
        let second = content_hash(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn hash_tracks_contents_and_names() {
        let dir = module();
        let original = content_hash(dir.path()).unwrap();

        fs::write(dir.path().join("src/Horse.pas"), "unit Horse; // edited").unwrap();
        let edited = content_hash(dir.path()).unwrap();
        assert_ne!(original, edited);

        fs::rename(
            dir.path().join("src/Horse.pas"),
            dir.path().join("src/Horse2.pas"),
        )
        .unwrap();
        assert_ne!(edited, content_hash(dir.path()).unwrap());
    }

    #[test]
    fn hash_ignores_git_metadata() {
        let dir = module();
        let original = content_hash(dir.path()).unwrap();

        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/FETCH_HEAD"), "abc").unwrap();
        assert_eq!(original, content_hash(dir.path()).unwrap());
    }

    #[test]
    fn missing_dir_errors() {
        let dir = TempDir::new().unwrap();
        assert!(content_hash(&dir.path().join("absent")).is_err());
    }
}
