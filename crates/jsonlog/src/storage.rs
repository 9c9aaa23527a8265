//! Content store: where exported artifacts land on disk.
//!
//! Writes stay inside the target directory. Names are single path components.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thug_core::JsonLogError;

pub trait ContentStore {
    /// Write `content` as `dir/name`, creating `dir` if needed.
    /// Returns the path written.
    fn store_content(
        &self,
        dir: &Path,
        name: &str,
        content: &[u8],
    ) -> Result<PathBuf, JsonLogError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentStore;

impl FsContentStore {
    fn validate_name(name: &str) -> Result<(), JsonLogError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(JsonLogError::InvalidContentName {
                name: name.to_string(),
            }),
        }
    }
}

impl ContentStore for FsContentStore {
    fn store_content(
        &self,
        dir: &Path,
        name: &str,
        content: &[u8],
    ) -> Result<PathBuf, JsonLogError> {
        Self::validate_name(name)?;

        fs::create_dir_all(dir)?;
        let path = dir.join(name);
        let mut file = fs::File::create(&path)?;
        file.write_all(content)?;
        file.sync_all()?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_creates_directory() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("analysis").join("json");

        let path = FsContentStore
            .store_content(&dir, "analysis.json", b"{}")
            .unwrap();

        assert_eq!(path, dir.join("analysis.json"));
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_store_rejects_traversal() {
        let temp = tempdir().unwrap();
        for name in ["../escape.json", "a/b.json", "", "/etc/passwd"] {
            let result = FsContentStore.store_content(temp.path(), name, b"x");
            assert!(
                matches!(result, Err(JsonLogError::InvalidContentName { .. })),
                "name {:?} should be rejected",
                name
            );
        }
    }
}
