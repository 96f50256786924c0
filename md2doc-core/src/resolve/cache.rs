//! On-disk asset cache keyed by content hash

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_DIR_NAME: &str = "md2doc-cache";

/// A directory of cached assets. Entries are named by a blake3 hash and written atomically.
///
/// The cache is a plain handle: whoever builds the resolver decides where it
/// lives and passes it to each collaborator that needs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `<system temp>/md2doc-cache`.
    pub fn in_temp_dir() -> io::Result<Self> {
        Self::open(std::env::temp_dir().join(DEFAULT_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hex blake3 digest over all `parts`, each length-prefixed.
    pub fn key(parts: &[&[u8]]) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        hasher.finalize().to_hex().to_string()
    }

    fn path(&self, key: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ext}"))
    }

    pub fn get(&self, key: &str, ext: &str) -> Option<Vec<u8>> {
        let bytes = fs::read(self.path(key, ext)).ok()?;
        if bytes.is_empty() {
            return None;
        }
        log::debug!("cache hit {key}.{ext}");
        Some(bytes)
    }

    pub fn put(&self, key: &str, ext: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let target = self.path(key, ext);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::open(dir.path().join("nested")).unwrap();
        let key = AssetCache::key(&[b"https://example.com/a.png"]);

        assert_eq!(cache.get(&key, "png"), None);
        cache.put(&key, "png", b"\x89PNG").unwrap();
        assert_eq!(cache.get(&key, "png"), Some(b"\x89PNG".to_vec()));
    }

    #[test]
    fn keys_separate_parts() {
        assert_ne!(AssetCache::key(&[b"ab", b"c"]), AssetCache::key(&[b"a", b"bc"]));
        assert_eq!(AssetCache::key(&[b"x"]).len(), 64);
    }
}
