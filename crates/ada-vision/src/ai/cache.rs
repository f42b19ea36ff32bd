//! Cache for raw model responses

use ada_types::{CacheError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    label: String,
    response: String,
}

/// Model responses keyed by SHA-256 of prompt and crop bytes
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
}

impl ResponseCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir).map_err(|e| CacheError::IoError(e.to_string()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_key(prompt: &str, image: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(image);
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let cached: CachedResponse = serde_json::from_str(&content)
            .map_err(|e| CacheError::Corrupted(format!("{}: {}", path.display(), e)))?;
        Ok(Some(cached.response))
    }

    pub fn set(&self, key: &str, label: &str, response: &str) -> Result<()> {
        let cached = CachedResponse {
            label: label.to_string(),
            response: response.to_string(),
        };
        let content = serde_json::to_string_pretty(&cached)?;
        fs::write(self.entry_path(key), content)?;
        Ok(())
    }

    /// Remove all cached responses, returning how many were deleted
    pub fn clear(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                fs::remove_file(&path)?;
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.cache_dir)? {
            if entry?.path().extension().is_some_and(|e| e == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("responses")).unwrap();

        let key = ResponseCache::cache_key("prompt", &[1, 2, 3]);
        assert_eq!(cache.get(&key).unwrap(), None);

        cache.set(&key, "door", "{\"violations\": []}").unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("{\"violations\": []}"));
        assert_eq!(cache.len().unwrap(), 1);

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_key_depends_on_prompt_and_image() {
        let a = ResponseCache::cache_key("prompt", &[1, 2, 3]);
        assert_eq!(a, ResponseCache::cache_key("prompt", &[1, 2, 3]));
        assert_ne!(a, ResponseCache::cache_key("prompt", &[1, 2, 4]));
        assert_ne!(a, ResponseCache::cache_key("prompt2", &[1, 2, 3]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_corrupted_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("bad.json"), "not json").unwrap();
        assert!(cache.get("bad").is_err());
    }
}
