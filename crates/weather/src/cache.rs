//! Location-key cache.
//!
//! Resolving a place name to an AccuWeather location key costs one API call,
//! so resolved keys are kept in a small JSON file keyed by the exact query text.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

type KeyMap = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct LocationCache {
    path: PathBuf,
}

impl LocationCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<user cache dir>/weather/location_cache.json`.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("weather")
            .join("location_cache.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached key for `location`. Any read problem is a miss.
    pub fn get(&self, location: &str) -> Option<String> {
        self.load().ok()?.remove(location)
    }

    /// Remember `key` for `location`. Failures are logged, never returned.
    pub fn put(&self, location: &str, key: &str) {
        if let Err(e) = self.try_put(location, key) {
            warn!(path = %self.path.display(), "failed to cache location key: {e}");
        }
    }

    fn try_put(&self, location: &str, key: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut keys = self.load().unwrap_or_default();
        keys.insert(location.to_string(), key.to_string());
        let json = serde_json::to_string_pretty(&keys)?;
        fs::write(&self.path, json)?;
        debug!(location, key, "location key cached");
        Ok(())
    }

    fn load(&self) -> std::io::Result<KeyMap> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Default for LocationCache {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}
