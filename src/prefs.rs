use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

pub const THEME_KEY: &str = "themePreference";
pub const ANIMATION_KEY: &str = "fireworksAnimation";

/// String key-value storage for the two persisted toggles.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct PreferenceFile(BTreeMap<String, String>);

/// Flat JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: PreferenceFile,
}

impl JsonFileStore {
    /// A missing or unreadable file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(err) => {
                if path.exists() {
                    log::warn!("ignoring preference file {}: {:#}", path.display(), err);
                }
                PreferenceFile::default()
            }
        };
        Self { path, values }
    }

    fn read(path: &Path) -> Result<PreferenceFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.0.insert(key.to_string(), value.to_string());
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.values).context("failed to serialize preferences")?;
        fs::write(&self.path, json).with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Terminal equivalent of `prefers-color-scheme`: `COLORFGBG` ends with the
    /// background palette index ("15;0" is light text on black).
    pub fn from_colorfgbg(value: Option<&str>) -> Self {
        let background = value
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        match background {
            Some(0..=6) | Some(8) | None => Theme::Dark,
            Some(_) => Theme::Light,
        }
    }
}

/// Toggle state restored at start-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub animating: bool,
}

impl Preferences {
    pub fn load(store: &dyn PreferenceStore, system_theme: Theme) -> Self {
        let theme = store
            .get(THEME_KEY)
            .and_then(|v| Theme::parse(&v))
            .unwrap_or(system_theme);
        // Anything but an explicit "false" keeps the show running.
        let animating = store.get(ANIMATION_KEY).as_deref() != Some("false");
        Self { theme, animating }
    }
}

pub fn save_theme(store: &mut dyn PreferenceStore, dark_mode: bool) {
    let theme = if dark_mode { Theme::Dark } else { Theme::Light };
    if let Err(err) = store.set(THEME_KEY, theme.as_str()) {
        log::warn!("could not save theme preference: {:#}", err);
    }
}

pub fn save_animation(store: &mut dyn PreferenceStore, animating: bool) {
    if let Err(err) = store.set(ANIMATION_KEY, if animating { "true" } else { "false" }) {
        log::warn!("could not save animation preference: {:#}", err);
    }
}
