use crate::error::{PikiError, Result};
use crate::search::DEFAULT_WRITER_HEAP;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";

/// Overrides the data directory, mainly for tests and portable setups.
pub const HOME_ENV: &str = "PIKI_HOME";

/// Configuration for piki, stored in `<data dir>/config.json`.
///
/// Relative paths are resolved against the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PikiConfig {
    /// Where user pages live.
    #[serde(default = "default_pages_root")]
    pub pages_root: PathBuf,

    /// Read-only fallback pages, matched by basename.
    #[serde(default = "default_system_pages_root")]
    pub system_pages_root: PathBuf,

    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Page shown with a welcome text until someone writes it.
    #[serde(default = "default_startpage")]
    pub startpage: String,

    #[serde(default = "default_writer_heap")]
    pub writer_heap_bytes: usize,
}

fn default_pages_root() -> PathBuf {
    PathBuf::from("pages")
}

fn default_system_pages_root() -> PathBuf {
    PathBuf::from("system-pages")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("search-index")
}

fn default_startpage() -> String {
    "startpage".to_string()
}

fn default_writer_heap() -> usize {
    DEFAULT_WRITER_HEAP
}

impl Default for PikiConfig {
    fn default() -> Self {
        Self {
            pages_root: default_pages_root(),
            system_pages_root: default_system_pages_root(),
            index_path: default_index_path(),
            startpage: default_startpage(),
            writer_heap_bytes: default_writer_heap(),
        }
    }
}

/// The data directory: `$PIKI_HOME` if set, else the platform data dir.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(home) = env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "piki", "piki")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| PikiError::Config("Could not determine the data directory".to_string()))
}

impl PikiConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: PikiConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// This config with every path made absolute against `data_dir`.
    pub fn resolved(&self, data_dir: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                data_dir.join(p)
            }
        };
        Self {
            pages_root: resolve(&self.pages_root),
            system_pages_root: resolve(&self.system_pages_root),
            index_path: resolve(&self.index_path),
            ..self.clone()
        }
    }

    pub const KEYS: [&'static str; 5] = [
        "pages_root",
        "system_pages_root",
        "index_path",
        "startpage",
        "writer_heap_bytes",
    ];

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "pages_root" => Some(self.pages_root.display().to_string()),
            "system_pages_root" => Some(self.system_pages_root.display().to_string()),
            "index_path" => Some(self.index_path.display().to_string()),
            "startpage" => Some(self.startpage.clone()),
            "writer_heap_bytes" => Some(self.writer_heap_bytes.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "pages_root" => self.pages_root = PathBuf::from(value),
            "system_pages_root" => self.system_pages_root = PathBuf::from(value),
            "index_path" => self.index_path = PathBuf::from(value),
            "startpage" => {
                let path = crate::codec::normalize(value);
                crate::codec::validate(&path).map_err(|e| e.to_string())?;
                self.startpage = path;
            }
            "writer_heap_bytes" => {
                self.writer_heap_bytes = value
                    .parse()
                    .map_err(|_| format!("'{}' is not a number of bytes", value))?;
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}
