use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxedit_edit::DEFAULT_HISTORY_DEPTH;
use voxedit_mesh_cpu::AtlasConfig;

pub const DEFAULT_CONFIG_PATH: &str = "voxedit.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub log_level: String,
    pub history_depth: usize,
    pub collider_layer: i32,
    /// Directory of material sheet PNGs.
    pub sheets_dir: Option<PathBuf>,
    /// Block type templates (`blocks.toml`).
    pub blocks_path: Option<PathBuf>,
    pub atlas: AtlasSection,
    pub map: MapDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            history_depth: DEFAULT_HISTORY_DEPTH,
            collider_layer: voxedit_collide::DEFAULT_COLLIDER_LAYER,
            sheets_dir: None,
            blocks_path: None,
            atlas: AtlasSection::default(),
            map: MapDefaults::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasSection {
    pub grid_tiles: u32,
    pub tile_px: u32,
}

impl Default for AtlasSection {
    fn default() -> Self {
        let d = AtlasConfig::default();
        Self {
            grid_tiles: d.grid_tiles,
            tile_px: d.tile_px,
        }
    }
}

impl From<AtlasSection> for AtlasConfig {
    fn from(s: AtlasSection) -> Self {
        AtlasConfig {
            grid_tiles: s.grid_tiles,
            tile_px: s.tile_px,
        }
    }
}

/// Size and layer of a freshly created map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDefaults {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub selected_layer: usize,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            depth: 7,
            selected_layer: 2,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`; a missing file gives the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {:?}; using defaults", path);
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_other_defaults() {
        let cfg = EditorConfig::from_toml_str(
            "collider_layer = 1\n[atlas]\ntile_px = 16\n",
            Path::new("voxedit.toml"),
        )
        .unwrap();
        assert_eq!(cfg.collider_layer, 1);
        assert_eq!(cfg.atlas.tile_px, 16);
        assert_eq!(cfg.atlas.grid_tiles, 32);
        assert_eq!(cfg.history_depth, 50);
        assert_eq!(cfg.map, MapDefaults::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EditorConfig::load_or_default(dir.path().join("none.toml")).unwrap();
        assert_eq!(cfg, EditorConfig::default());
    }

    #[test]
    fn bad_level_falls_back_to_info() {
        let cfg = EditorConfig {
            log_level: "chatty".into(),
            ..Default::default()
        };
        assert_eq!(cfg.level_filter(), log::LevelFilter::Info);
    }
}
