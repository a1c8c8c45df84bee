//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/blockfall/settings.toml (or platform equivalent)

use crate::engine::EngineConfig;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Game settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Board geometry
    pub board: BoardSettings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
    /// Keybindings
    pub keys: KeyBindings,
    /// Visual settings
    pub visual: VisualSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub width: usize,
    pub height: usize,
    /// Spawn buffer rows above the visible field
    pub hidden_rows: usize,
}

/// Gameplay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Number of upcoming pieces shown
    pub preview: usize,
    /// Fixed randomizer seed, random per run when absent
    pub seed: Option<u64>,
    /// Delayed Auto Shift in milliseconds
    pub das_ms: u64,
    /// Auto Repeat Rate in milliseconds
    pub arr_ms: u64,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_cw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_ccw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hold: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub restart: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    match keys {
        [single] => serializer.serialize_str(single),
        _ => {
            let mut seq = serializer.serialize_seq(Some(keys.len()))?;
            for key in keys {
                seq.serialize_element(key)?;
            }
            seq.end()
        }
    }
}

/// Visual settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Ghost piece visibility
    pub show_ghost: bool,
    /// Block style: "solid", "bracket", "round"
    pub block_style: String,
}

impl Default for BoardSettings {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            width: config.width,
            height: config.height,
            hidden_rows: config.hidden_rows,
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            preview: EngineConfig::default().preview,
            seed: None,
            das_ms: 170,
            arr_ms: 50,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            move_left: keys(&["Left"]),
            move_right: keys(&["Right"]),
            soft_drop: keys(&["Down"]),
            hard_drop: keys(&["Space"]),
            rotate_cw: keys(&["Up", "x"]),
            rotate_ccw: keys(&["z"]),
            hold: keys(&["c"]),
            pause: keys(&["p", "Esc"]),
            restart: keys(&["r"]),
            quit: keys(&["q"]),
        }
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            show_ghost: true,
            block_style: "solid".to_string(),
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockfall", "blockfall")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the default location, or fall back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`. A missing or unparsable file gives defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid settings file {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save settings to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Engine setup described by these settings, clamped to a playable board
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            width: self.board.width,
            height: self.board.height,
            hidden_rows: self.board.hidden_rows,
            preview: self.gameplay.preview,
            seed: self.gameplay.seed,
        }
        .normalized()
    }
}

impl VisualSettings {
    /// Get the block characters (filled, ghost) based on style
    pub fn block_chars(&self) -> (&'static str, &'static str) {
        match self.block_style.as_str() {
            "bracket" => ("[]", ".."),
            "round" => ("()", ".."),
            _ => ("██", "░░"), // "solid" or default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.board.width, 10);
        assert_eq!(settings.board.height, 22);
        assert_eq!(settings.board.hidden_rows, 2);
        assert_eq!(settings.gameplay.preview, 5);
        assert_eq!(settings.gameplay.seed, None);
        assert_eq!(settings.gameplay.das_ms, 170);
        assert_eq!(settings.keys.rotate_cw, vec!["Up", "x"]);
        assert_eq!(settings.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [gameplay]
            seed = 42

            [keys]
            hard_drop = "Enter"
            hold = ["c", "v"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.gameplay.seed, Some(42));
        assert_eq!(settings.gameplay.arr_ms, 50);
        assert_eq!(settings.keys.hard_drop, vec!["Enter"]);
        assert_eq!(settings.keys.hold, vec!["c", "v"]);
        assert_eq!(settings.keys.quit, vec!["q"]);
        assert_eq!(settings.board, BoardSettings::default());
    }

    #[test]
    fn test_engine_config_is_clamped() {
        let mut settings = Settings::default();
        settings.board = BoardSettings {
            width: 2,
            height: 6,
            hidden_rows: 9,
        };
        settings.gameplay.preview = 0;
        let config = settings.engine_config();
        assert_eq!(config.width, 4);
        assert_eq!(config.height, 6);
        assert_eq!(config.hidden_rows, 5);
        assert_eq!(config.preview, 1);
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("blockfall-settings-{:016x}", rand::random::<u64>()));
        let path = dir.join("settings.toml");

        let mut settings = Settings::default();
        settings.gameplay.seed = Some(7);
        settings.visual.block_style = "round".to_string();
        settings.save_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("hard_drop = \"Space\""));
        assert_eq!(Settings::load_from(&path), settings);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = std::env::temp_dir().join(format!("blockfall-settings-{:016x}", rand::random::<u64>()));
        let path = dir.join("settings.toml");
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, "[board\nwidth = ").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        assert_eq!(Settings::load_from(&dir.join("missing.toml")), Settings::default());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_block_chars() {
        let mut visual = VisualSettings::default();
        assert_eq!(visual.block_chars().0, "██");
        visual.block_style = "bracket".to_string();
        assert_eq!(visual.block_chars(), ("[]", ".."));
    }
}
