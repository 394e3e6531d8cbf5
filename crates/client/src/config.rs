//! Explorer configuration loaded from the process environment.
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use game_core::{GameConfig, WorldCoords};
use runtime::PatternKind;

/// Settings for one explorer session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Requested miner cores; the runtime default applies when unset.
    pub cores: Option<usize>,
    pub pattern: PatternKind,
    /// Chunk side length; the game config value applies when unset.
    pub chunk_size: Option<u32>,
    pub home: Option<WorldCoords>,
    pub save_data_dir: Option<PathBuf>,
    pub session_id: Option<String>,
    pub game_config_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cores: None,
            pattern: PatternKind::Spiral,
            chunk_size: None,
            home: None,
            save_data_dir: None,
            session_id: None,
            game_config_path: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `EXPLORER_CORES` - Concurrent mining jobs (default: all cores)
    /// - `EXPLORER_PATTERN` - `spiral`, `swiss-cheese` or `towards-center` (default: spiral)
    /// - `EXPLORER_CHUNK_SIZE` - Chunk side length (default: from game config)
    /// - `HOME_X`, `HOME_Y` - Home planet coordinates
    /// - `SAVE_DATA_DIR` - Directory for the chunk log (default: platform-specific)
    /// - `EXPLORER_SESSION_ID` - Session identifier for log files (default: auto-generated)
    /// - `GAME_CONFIG_PATH` - JSON file overriding game constants
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `EXPLORER_SESSION_ID` alone, so logging can start before the rest of
    /// the configuration is read.
    pub fn session_id_from_env() -> Option<String> {
        session_id(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let mut config = Self::default();

        config.cores = read_env(&read, "EXPLORER_CORES");
        config.chunk_size = read_env(&read, "EXPLORER_CHUNK_SIZE");

        if let Some(name) = read("EXPLORER_PATTERN") {
            match name.parse::<PatternKind>() {
                Ok(kind @ (PatternKind::Spiral
                | PatternKind::SwissCheese
                | PatternKind::TowardsCenter)) => config.pattern = kind,
                _ => tracing::warn!("Unsupported EXPLORER_PATTERN {:?}, using spiral", name),
            }
        }

        // Home requires both coordinates
        if let (Some(x), Some(y)) = (
            read_env::<i64>(&read, "HOME_X"),
            read_env::<i64>(&read, "HOME_Y"),
        ) {
            config.home = Some(WorldCoords::new(x, y));
        }

        config.save_data_dir = read("SAVE_DATA_DIR").map(PathBuf::from);
        config.session_id = session_id(&lookup);
        config.game_config_path = read("GAME_CONFIG_PATH").map(PathBuf::from);

        config
    }

    /// Game constants: defaults, overridden by `GAME_CONFIG_PATH` and then
    /// by `EXPLORER_CHUNK_SIZE`.
    pub fn game_config(&self) -> Result<GameConfig> {
        let mut game_config = match &self.game_config_path {
            Some(path) => load_game_config(path)?,
            None => GameConfig::default(),
        };
        if let Some(size) = self.chunk_size {
            game_config = game_config.with_chunk_side_length(size);
        }
        Ok(game_config)
    }
}

fn session_id(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup("EXPLORER_SESSION_ID")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_game_config(path: &Path) -> Result<GameConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read game config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse game config {}", path.display()))
}

fn read_env<T>(read: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = read(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.pattern, PatternKind::Spiral);
        assert!(config.cores.is_none());
        assert!(config.home.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("EXPLORER_CORES", "3"),
            ("EXPLORER_PATTERN", "towards-center"),
            ("EXPLORER_CHUNK_SIZE", "32"),
            ("HOME_X", "-120"),
            ("HOME_Y", " 45 "),
            ("SAVE_DATA_DIR", "/tmp/explorer"),
            ("EXPLORER_SESSION_ID", "run-1"),
        ]);
        assert_eq!(config.cores, Some(3));
        assert_eq!(config.pattern, PatternKind::TowardsCenter);
        assert_eq!(config.home, Some(WorldCoords::new(-120, 45)));
        assert_eq!(config.save_data_dir, Some(PathBuf::from("/tmp/explorer")));
        assert_eq!(config.session_id.as_deref(), Some("run-1"));
        assert_eq!(config.game_config().unwrap().chunk_side_length, 32);
    }

    #[test]
    fn blank_session_id_is_unset() {
        assert!(config_from(&[("EXPLORER_SESSION_ID", "  ")]).session_id.is_none());
        assert_eq!(
            session_id(|_| Some(" run-2 ".to_string())).as_deref(),
            Some("run-2")
        );
    }

    #[test]
    fn half_a_home_is_ignored() {
        let config = config_from(&[("HOME_X", "10")]);
        assert!(config.home.is_none());
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[("EXPLORER_CORES", "many"), ("EXPLORER_PATTERN", "list")]);
        assert!(config.cores.is_none());
        assert_eq!(config.pattern, PatternKind::Spiral);
    }

    #[test]
    fn game_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"{ "planet_rarity": 64, "world_radius": 5000 }"#).unwrap();

        let config = ClientConfig {
            game_config_path: Some(path),
            ..ClientConfig::default()
        };
        let game_config = config.game_config().unwrap();
        assert_eq!(game_config.planet_rarity, 64);
        assert_eq!(game_config.world_radius, 5000);
        assert_eq!(game_config.chunk_side_length, GameConfig::default().chunk_side_length);
    }
}
