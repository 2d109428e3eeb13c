use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root of the full-size screenshot tree (one `YYYY-MM` bucket per
    /// subdirectory).
    #[serde(default = "default_full_dir")]
    pub full_dir: PathBuf,

    /// Where thumbnails are written, mirroring the bucket layout.
    #[serde(default = "default_thumbs_dir")]
    pub thumbs_dir: PathBuf,

    /// Extensions the ingester skips outright (video containers mostly).
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    /// Captures before this local hour aggregate under the previous
    /// calendar day.
    #[serde(default = "default_day_cutoff_hour")]
    pub day_cutoff_hour: u32,
}

fn default_full_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Screenshots")
}

fn default_thumbs_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ScreenshotThumbs")
}

fn default_excluded_extensions() -> Vec<String> {
    vec![
        "mp4".to_string(),
        "mkv".to_string(),
        "webm".to_string(),
        "mov".to_string(),
    ]
}

fn default_day_cutoff_hour() -> u32 {
    5
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            full_dir: default_full_dir(),
            thumbs_dir: default_thumbs_dir(),
            excluded_extensions: default_excluded_extensions(),
            day_cutoff_hour: default_day_cutoff_hour(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Target page size. Pages overshoot rather than split a day.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Column count the masonry grid packs into.
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,
}

fn default_page_size() -> usize {
    100
}

fn default_grid_columns() -> usize {
    4
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            grid_columns: default_grid_columns(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screenshelf")
        .join("screenshelf.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            library: LibraryConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("screenshelf")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.library.day_cutoff_hour, 5);
        assert_eq!(config.gallery.page_size, 100);
        assert_eq!(config.gallery.grid_columns, 4);
        assert!(config.library.excluded_extensions.contains(&"mp4".to_string()));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [library]
            full_dir = "/data/shots"
            "#,
        )
        .unwrap();
        assert_eq!(config.library.full_dir, PathBuf::from("/data/shots"));
        assert_eq!(config.library.day_cutoff_hour, 5);
        assert_eq!(config.gallery.page_size, 100);
    }
}
